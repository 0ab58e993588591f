//! Deployment receipt directory
//!
//! The [`DeploymentsDir`] struct manages the `deployments/` directory where
//! receipts of every run are written.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Manages the `deployments/` directory for receipt storage.
///
/// Receipts are only ever added to this directory, never rewritten.
#[derive(Debug, Clone)]
pub struct DeploymentsDir {
    path: PathBuf,
}

impl DeploymentsDir {
    /// The directory name used for receipts
    pub const NAME: &str = "deployments";

    /// Create a new `DeploymentsDir` pointing to `deployments/` in the current directory.
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(Self::NAME),
        }
    }

    /// Create a `DeploymentsDir` at a custom location.
    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the receipt directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Join a relative path to the receipt directory.
    pub fn join<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.path.join(path)
    }

    /// Check if the receipt directory exists.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Create the receipt directory if it doesn't exist.
    pub fn create(&self) -> Result<()> {
        if !self.exists() {
            std::fs::create_dir_all(&self.path).map_err(|e| Error::filesystem(&self.path, e))?;
        }
        Ok(())
    }
}

impl Default for DeploymentsDir {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Path> for DeploymentsDir {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}
