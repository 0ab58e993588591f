//! Creation bytecode
//!
//! Parsing of compiled creation code and assembly of the init code sent in
//! a contract-creation transaction.

use alloy::primitives::Bytes;

use crate::error::{Error, Result};

/// Compiled creation bytecode of a contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bytecode {
    bytes: Vec<u8>,
}

impl Bytecode {
    /// Create bytecode from a hex string (with or without 0x prefix)
    pub fn from_hex(hex: &str) -> Result<Self> {
        let clean = hex.trim().trim_start_matches("0x");
        if clean.is_empty() {
            return Ok(Self { bytes: Vec::new() });
        }
        let bytes = hex::decode(clean)
            .map_err(|e| Error::Artifact(format!("Invalid bytecode hex: {}", e)))?;
        Ok(Self { bytes })
    }

    /// Interfaces and abstract contracts compile to empty bytecode
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Init code: creation bytecode followed by ABI-encoded constructor args
    pub fn deploy_code(&self, encoded_args: &[u8]) -> Bytes {
        let mut data = Vec::with_capacity(self.bytes.len() + encoded_args.len());
        data.extend_from_slice(&self.bytes);
        data.extend_from_slice(encoded_args);
        Bytes::from(data)
    }
}
