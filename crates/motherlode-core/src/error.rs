use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::B256;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Deployment of {contract} failed: {reason}")]
    Deployment { contract: String, reason: String },

    #[error("Transaction {tx_hash} was not confirmed within {}ms", timeout.as_millis())]
    ConfirmationTimeout { tx_hash: B256, timeout: Duration },

    #[error(
        "Transaction {tx_hash} is confirmed in block {block_number}, but the block could not be fetched after {attempts} attempts"
    )]
    DataUnavailable {
        tx_hash: B256,
        block_number: u64,
        attempts: u32,
    },

    #[error("Deployment transaction {tx_hash} reverted in block {block_number}")]
    Reverted { tx_hash: B256, block_number: u64 },

    #[error("Failed to decode {event} event: {reason}")]
    EventDecode { event: &'static str, reason: String },

    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a deployment error for a named contract
    pub fn deployment(contract: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Deployment {
            contract: contract.into(),
            reason: reason.into(),
        }
    }

    /// Create a filesystem error bound to a path
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Whether the error was raised before any on-chain action could happen
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
