//! In-memory chain and simulated clock for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::{keccak256, Address, Bytes, Log, LogData, B256, U256};
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;

use crate::chain::{ChainReader, Clock, Deployer, Inclusion, LogQuery};
use crate::error::{Error, Result};
use crate::token::IERC20;
use crate::types::PendingDeployment;

// =============================================================================
// Simulated Clock
// =============================================================================

/// Clock that advances only when slept on, recording every sleep
#[derive(Debug, Default)]
pub struct SimClock {
    now: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for SimClock {
    fn elapsed(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
        self.sleeps.lock().unwrap().push(duration);
    }
}

// =============================================================================
// Fake Chain
// =============================================================================

#[derive(Debug, Clone)]
struct FakeTx {
    inclusion: Inclusion,
    polls: u32,
}

#[derive(Debug, Default)]
struct FakeState {
    nonce: u64,
    latest_block: u64,
    txs: HashMap<B256, FakeTx>,
    block_reads: HashMap<u64, u32>,
    logs: Vec<(u64, Log)>,
    deployed: HashMap<Address, String>,
    submissions: Vec<(String, Vec<serde_json::Value>)>,
    prepared: Vec<(String, Vec<serde_json::Value>)>,
}

/// Single-threaded test chain.
///
/// Every submission is mined into its own new block. Mining and block
/// visibility lag are configurable.
#[derive(Debug)]
pub struct FakeChain {
    chain_id: u64,
    deployer: Address,
    mining_polls: u32,
    block_read_failures: Option<u32>,
    block_read_errors: bool,
    reverting: Vec<String>,
    failing: Vec<String>,
    missing_artifacts: Vec<String>,
    deploy_logs: HashMap<String, Vec<LogData>>,
    erc20: HashMap<String, (String, U256)>,
    state: Mutex<FakeState>,
    network_calls: AtomicUsize,
    inclusion_polls: AtomicUsize,
}

impl FakeChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            deployer: Address::repeat_byte(0xde),
            mining_polls: 0,
            block_read_failures: Some(0),
            block_read_errors: false,
            reverting: Vec::new(),
            failing: Vec::new(),
            missing_artifacts: Vec::new(),
            deploy_logs: HashMap::new(),
            erc20: HashMap::new(),
            state: Mutex::new(FakeState::default()),
            network_calls: AtomicUsize::new(0),
            inclusion_polls: AtomicUsize::new(0),
        }
    }

    /// Report each transaction as unmined for the first `polls` lookups
    pub fn with_mining_polls(mut self, polls: u32) -> Self {
        self.mining_polls = polls;
        self
    }

    /// Hide each block for its first `n` reads; `None` hides it forever
    pub fn with_block_read_failures(mut self, n: Option<u32>) -> Self {
        self.block_read_failures = n;
        self
    }

    /// Hidden blocks produce an RPC error instead of `None`
    pub fn with_block_read_errors(mut self) -> Self {
        self.block_read_errors = true;
        self
    }

    pub fn with_reverting(mut self, contract: &str) -> Self {
        self.reverting.push(contract.to_string());
        self
    }

    /// Submission of `contract` fails outright
    pub fn with_failing(mut self, contract: &str) -> Self {
        self.failing.push(contract.to_string());
        self
    }

    /// `contract` has no build artifact, so preparing it fails
    pub fn with_missing_artifact(mut self, contract: &str) -> Self {
        self.missing_artifacts.push(contract.to_string());
        self
    }

    /// Logs emitted by `contract` in its deployment block
    pub fn with_deploy_logs(mut self, contract: &str, logs: Vec<LogData>) -> Self {
        self.deploy_logs.insert(contract.to_string(), logs);
        self
    }

    pub fn with_erc20(mut self, contract: &str, symbol: &str, total_supply: U256) -> Self {
        self.erc20
            .insert(contract.to_string(), (symbol.to_string(), total_supply));
        self
    }

    pub fn timestamp_of(block_number: u64) -> u64 {
        1_700_000_000 + block_number * 2
    }

    /// Deploy without going through the [`Deployer`] trait
    pub fn deploy_now(&self, contract: &str) -> PendingDeployment {
        let mut state = self.state.lock().unwrap();
        let address = self.deployer.create(state.nonce);
        let tx_hash = keccak256(state.nonce.to_be_bytes());
        state.nonce += 1;
        state.latest_block += 1;
        let block_number = state.latest_block;

        let success = !self.reverting.iter().any(|c| c == contract);
        state.txs.insert(
            tx_hash,
            FakeTx {
                inclusion: Inclusion {
                    block_number,
                    success,
                    contract_address: Some(address),
                },
                polls: 0,
            },
        );
        state.deployed.insert(address, contract.to_string());

        if let Some(logs) = self.deploy_logs.get(contract) {
            for data in logs {
                state.logs.push((
                    block_number,
                    Log {
                        address,
                        data: data.clone(),
                    },
                ));
            }
        }

        PendingDeployment { tx_hash, address }
    }

    pub fn network_calls(&self) -> usize {
        self.network_calls.load(Ordering::SeqCst)
    }

    pub fn inclusion_polls(&self) -> usize {
        self.inclusion_polls.load(Ordering::SeqCst)
    }

    pub fn block_reads(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.block_reads.values().map(|n| *n as usize).sum()
    }

    pub fn submissions(&self) -> Vec<(String, Vec<serde_json::Value>)> {
        self.state.lock().unwrap().submissions.clone()
    }

    /// Targets checked by [`Deployer::prepare`], in call order
    pub fn prepared(&self) -> Vec<(String, Vec<serde_json::Value>)> {
        self.state.lock().unwrap().prepared.clone()
    }

    fn touch(&self) {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn chain_id(&self) -> Result<u64> {
        self.touch();
        Ok(self.chain_id)
    }

    async fn transaction_inclusion(&self, tx_hash: B256) -> Result<Option<Inclusion>> {
        self.touch();
        self.inclusion_polls.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock().unwrap();
        let Some(tx) = state.txs.get_mut(&tx_hash) else {
            return Ok(None);
        };
        tx.polls += 1;
        if tx.polls <= self.mining_polls {
            return Ok(None);
        }
        Ok(Some(tx.inclusion))
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<Option<u64>> {
        self.touch();

        let mut state = self.state.lock().unwrap();
        if block_number > state.latest_block {
            return Ok(None);
        }
        let reads = state.block_reads.entry(block_number).or_insert(0);
        *reads += 1;

        let visible = match self.block_read_failures {
            Some(n) => *reads > n,
            None => false,
        };
        if visible {
            Ok(Some(Self::timestamp_of(block_number)))
        } else if self.block_read_errors {
            Err(Error::Rpc(format!("block {} not found", block_number)))
        } else {
            Ok(None)
        }
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<Log>> {
        self.touch();

        let state = self.state.lock().unwrap();
        Ok(state
            .logs
            .iter()
            .filter(|(block, log)| {
                *block >= query.from_block
                    && *block <= query.to_block
                    && log.address == query.address
                    && log.data.topics().first() == Some(&query.event_signature)
            })
            .map(|(_, log)| log.clone())
            .collect())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.touch();

        let state = self.state.lock().unwrap();
        let (symbol, supply) = state
            .deployed
            .get(&to)
            .and_then(|name| self.erc20.get(name))
            .ok_or_else(|| Error::Rpc("execution reverted".to_string()))?;

        let selector = data.get(..4).unwrap_or_default();
        if selector == IERC20::symbolCall::SELECTOR.as_slice() {
            Ok((symbol.clone(),).abi_encode_params().into())
        } else if selector == IERC20::totalSupplyCall::SELECTOR.as_slice() {
            Ok((*supply,).abi_encode_params().into())
        } else {
            Err(Error::Rpc("execution reverted".to_string()))
        }
    }
}

#[async_trait]
impl Deployer for FakeChain {
    fn address(&self) -> Address {
        self.deployer
    }

    fn prepare(&self, contract: &str, args: &[serde_json::Value]) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .prepared
            .push((contract.to_string(), args.to_vec()));

        if self.missing_artifacts.iter().any(|c| c == contract) {
            return Err(Error::Artifact(format!("no artifact for {}", contract)));
        }
        Ok(())
    }

    async fn submit(&self, contract: &str, args: &[serde_json::Value]) -> Result<PendingDeployment> {
        self.touch();

        if self.failing.iter().any(|c| c == contract) {
            return Err(Error::deployment(contract, "insufficient funds for gas"));
        }

        self.state
            .lock()
            .unwrap()
            .submissions
            .push((contract.to_string(), args.to_vec()));
        Ok(self.deploy_now(contract))
    }
}
