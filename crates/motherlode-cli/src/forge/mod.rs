//! Forge build output
//!
//! Contract bytecode and constructor ABIs are read from the artifacts that
//! `forge build` writes under `out/`.
//!
//! - [`ArtifactLoader`] - trait for loading artifacts, so deployment can be
//!   tested without a build directory
//! - [`FileSystemArtifactLoader`] - reads `out/<Name>.sol/<Name>.json`

mod artifact;
mod types;

pub use artifact::{ArtifactLoader, FileSystemArtifactLoader};
