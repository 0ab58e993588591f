//! Chain access traits
//!
//! These traits are the seam between the deployment logic and a live node:
//! - [`ChainReader`] - read-only queries, possibly served by a lagging replica
//! - [`Deployer`] - submission of contract-creation transactions
//! - [`Clock`] - time, so retry timing can be simulated in tests

use std::time::Duration;

use alloy::primitives::{Address, Bytes, Log, B256};
use async_trait::async_trait;

use crate::error::Result;
use crate::types::PendingDeployment;

// =============================================================================
// Query Types
// =============================================================================

/// Inclusion of a transaction in a mined block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inclusion {
    pub block_number: u64,
    /// Execution status from the receipt
    pub success: bool,
    /// Address reported by the receipt for contract creations
    pub contract_address: Option<Address>,
}

/// Log query for a single emitter and event signature over a block range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogQuery {
    pub address: Address,
    pub event_signature: B256,
    pub from_block: u64,
    pub to_block: u64,
}

impl LogQuery {
    /// Query restricted to exactly one block
    pub fn single_block(address: Address, event_signature: B256, block: u64) -> Self {
        Self {
            address,
            event_signature,
            from_block: block,
            to_block: block,
        }
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Read-only view of chain state.
///
/// Implementations may be stale: a transaction can be reported as mined
/// before its block is retrievable.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Chain ID reported by the node
    async fn chain_id(&self) -> Result<u64>;

    /// Inclusion info for a transaction, `None` while it is not yet mined
    async fn transaction_inclusion(&self, tx_hash: B256) -> Result<Option<Inclusion>>;

    /// Timestamp of a block, `None` while the block is not yet visible
    async fn block_timestamp(&self, block_number: u64) -> Result<Option<u64>>;

    /// Matching logs in emission order
    async fn logs(&self, query: &LogQuery) -> Result<Vec<Log>>;

    /// Execute a read-only call against a contract
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;
}

/// Submits contract-creation transactions from a single account
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Address of the deploying account
    fn address(&self) -> Address;

    /// Check that `contract` could be submitted with `args`, without
    /// touching the network
    fn prepare(&self, contract: &str, args: &[serde_json::Value]) -> Result<()>;

    /// Submit exactly one contract-creation transaction.
    ///
    /// `args` are already resolved to plain values; the implementation
    /// encodes them against the contract's constructor.
    async fn submit(&self, contract: &str, args: &[serde_json::Value]) -> Result<PendingDeployment>;
}

/// Monotonic time source
#[async_trait]
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock was created
    fn elapsed(&self) -> Duration;

    async fn sleep(&self, duration: Duration);
}

/// [`Clock`] backed by tokio's timer
#[derive(Debug, Clone)]
pub struct TokioClock {
    start: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            start: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
