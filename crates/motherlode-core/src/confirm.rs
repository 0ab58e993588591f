//! Transaction confirmation despite indexer lag
//!
//! Confirming a deployment involves two independent delays:
//!
//! 1. Inclusion: the transaction is not mined yet. Polled at a fixed
//!    interval until a deadline, then [`Error::ConfirmationTimeout`].
//! 2. Read propagation: the transaction is mined, but the node serving
//!    queries cannot return its block yet. Retried a bounded number of times
//!    with a linearly growing delay, then [`Error::DataUnavailable`].
//!
//! The policy lives in [`ConfirmState::on`], a pure transition function.
//! [`ConfirmationWaiter`] only performs the actions it asks for. Every query
//! it makes is raced against the clock, so a stalled node cannot hold a step
//! past its deadline.

use std::future::Future;
use std::time::Duration;

use alloy::primitives::{Address, B256};

use crate::chain::{ChainReader, Clock, Inclusion};
use crate::error::{Error, Result};
use crate::types::Confirmation;

// =============================================================================
// Policy
// =============================================================================

/// Timing knobs for confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    /// Deadline for the transaction to be mined
    pub inclusion_timeout: Duration,
    /// Interval between inclusion polls
    pub poll_interval: Duration,
    /// Block lookups before giving up on a mined transaction
    pub max_block_attempts: u32,
    /// Delay unit between block lookups; attempt `n` waits `n * base_delay`
    pub base_delay: Duration,
    /// Longest a single block lookup may take before it counts as missing
    pub lookup_timeout: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            inclusion_timeout: Duration::from_millis(30_000),
            poll_interval: Duration::from_millis(1_000),
            max_block_attempts: 5,
            base_delay: Duration::from_millis(1_000),
            lookup_timeout: Duration::from_millis(10_000),
        }
    }
}

impl ConfirmationPolicy {
    /// Delay after failed block lookup number `attempt` (1-based)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

// =============================================================================
// State Machine
// =============================================================================

/// A confirmed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmed {
    pub confirmation: Confirmation,
    /// Contract address reported by the receipt, if any
    pub contract_address: Option<Address>,
}

/// Why confirmation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Reverted { block_number: u64 },
    DataUnavailable { block_number: u64, attempts: u32 },
}

impl FailureKind {
    fn into_error(self, tx_hash: B256, policy: &ConfirmationPolicy) -> Error {
        match self {
            FailureKind::Timeout => Error::ConfirmationTimeout {
                tx_hash,
                timeout: policy.inclusion_timeout,
            },
            FailureKind::Reverted { block_number } => Error::Reverted {
                tx_hash,
                block_number,
            },
            FailureKind::DataUnavailable {
                block_number,
                attempts,
            } => Error::DataUnavailable {
                tx_hash,
                block_number,
                attempts,
            },
        }
    }
}

/// What a single query revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Not mined yet, `elapsed` since waiting began
    NotMined { elapsed: Duration },
    Mined(Inclusion),
    BlockMissing,
    BlockFound { timestamp: u64 },
}

/// What the driver should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PollInclusion { after: Duration },
    FetchBlock { block_number: u64, after: Duration },
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmState {
    /// Waiting for the transaction to be mined
    Waiting,
    /// Mined; block lookup number `attempt` is in flight
    Retrying { attempt: u32, inclusion: Inclusion },
    Succeeded(Confirmed),
    Failed(FailureKind),
}

impl ConfirmState {
    /// Initial state and the action that starts it
    pub fn start() -> (Self, Action) {
        (
            ConfirmState::Waiting,
            Action::PollInclusion {
                after: Duration::ZERO,
            },
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConfirmState::Succeeded(_) | ConfirmState::Failed(_))
    }

    /// Transition table.
    ///
    /// | state         | observation  | next state              | action                    |
    /// |---------------|--------------|-------------------------|---------------------------|
    /// | Waiting       | NotMined     | Waiting / Failed(Timeout) | poll after interval / stop |
    /// | Waiting       | Mined (ok)   | Retrying(1)             | fetch block now           |
    /// | Waiting       | Mined (fail) | Failed(Reverted)        | stop                      |
    /// | Retrying(n)   | BlockMissing | Retrying(n+1) / Failed(DataUnavailable) | fetch after `n * base` / stop |
    /// | Retrying(n)   | BlockFound   | Succeeded               | stop                      |
    ///
    /// Terminal states ignore observations. An observation that does not
    /// belong to the current state repeats that state's query.
    pub fn on(self, observation: Observation, policy: &ConfirmationPolicy) -> (Self, Action) {
        match (self, observation) {
            (ConfirmState::Waiting, Observation::NotMined { elapsed }) => {
                if elapsed >= policy.inclusion_timeout {
                    (ConfirmState::Failed(FailureKind::Timeout), Action::Stop)
                } else {
                    let remaining = policy.inclusion_timeout - elapsed;
                    (
                        ConfirmState::Waiting,
                        Action::PollInclusion {
                            after: policy.poll_interval.min(remaining),
                        },
                    )
                }
            }
            (ConfirmState::Waiting, Observation::Mined(inclusion)) => {
                if !inclusion.success {
                    return (
                        ConfirmState::Failed(FailureKind::Reverted {
                            block_number: inclusion.block_number,
                        }),
                        Action::Stop,
                    );
                }
                (
                    ConfirmState::Retrying {
                        attempt: 1,
                        inclusion,
                    },
                    Action::FetchBlock {
                        block_number: inclusion.block_number,
                        after: Duration::ZERO,
                    },
                )
            }
            (ConfirmState::Retrying { attempt, inclusion }, Observation::BlockMissing) => {
                if attempt >= policy.max_block_attempts {
                    (
                        ConfirmState::Failed(FailureKind::DataUnavailable {
                            block_number: inclusion.block_number,
                            attempts: attempt,
                        }),
                        Action::Stop,
                    )
                } else {
                    (
                        ConfirmState::Retrying {
                            attempt: attempt + 1,
                            inclusion,
                        },
                        Action::FetchBlock {
                            block_number: inclusion.block_number,
                            after: policy.retry_delay(attempt),
                        },
                    )
                }
            }
            (ConfirmState::Retrying { inclusion, .. }, Observation::BlockFound { timestamp }) => (
                ConfirmState::Succeeded(Confirmed {
                    confirmation: Confirmation {
                        block_number: inclusion.block_number,
                        block_timestamp: timestamp,
                    },
                    contract_address: inclusion.contract_address,
                }),
                Action::Stop,
            ),
            (state @ (ConfirmState::Succeeded(_) | ConfirmState::Failed(_)), _) => {
                (state, Action::Stop)
            }
            (ConfirmState::Waiting, _) => (
                ConfirmState::Waiting,
                Action::PollInclusion {
                    after: policy.poll_interval,
                },
            ),
            (state @ ConfirmState::Retrying { inclusion, .. }, _) => (
                state,
                Action::FetchBlock {
                    block_number: inclusion.block_number,
                    after: Duration::ZERO,
                },
            ),
        }
    }
}

// =============================================================================
// Driver
// =============================================================================

/// Resolves a transaction hash into the block it was confirmed in
pub struct ConfirmationWaiter<'a> {
    chain: &'a dyn ChainReader,
    clock: &'a dyn Clock,
    policy: ConfirmationPolicy,
}

impl<'a> ConfirmationWaiter<'a> {
    pub fn new(chain: &'a dyn ChainReader, clock: &'a dyn Clock, policy: ConfirmationPolicy) -> Self {
        Self {
            chain,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    /// Wait until `tx_hash` is mined and its block is readable
    pub async fn confirm(&self, tx_hash: B256) -> Result<Confirmed> {
        let started = self.clock.elapsed();
        let (mut state, mut action) = ConfirmState::start();

        loop {
            let observation = match action {
                Action::PollInclusion { after } => {
                    self.pause(after).await;
                    self.poll_inclusion(tx_hash, started).await
                }
                Action::FetchBlock {
                    block_number,
                    after,
                } => {
                    self.pause(after).await;
                    self.fetch_block(tx_hash, block_number).await
                }
                Action::Stop => break,
            };
            (state, action) = state.on(observation, &self.policy);
        }

        match state {
            ConfirmState::Succeeded(confirmed) => {
                tracing::debug!(
                    tx = %tx_hash,
                    block = confirmed.confirmation.block_number,
                    "Transaction confirmed"
                );
                Ok(confirmed)
            }
            ConfirmState::Failed(kind) => Err(kind.into_error(tx_hash, &self.policy)),
            ConfirmState::Waiting | ConfirmState::Retrying { .. } => Err(Error::Rpc(format!(
                "confirmation of {} stopped before reaching a result",
                tx_hash
            ))),
        }
    }

    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            self.clock.sleep(duration).await;
        }
    }

    /// Run `query`, giving up once `limit` has passed on the clock
    async fn bounded<T>(&self, limit: Duration, query: impl Future<Output = T>) -> Option<T> {
        tokio::select! {
            biased;
            value = query => Some(value),
            _ = self.pause(limit) => None,
        }
    }

    async fn poll_inclusion(&self, tx_hash: B256, started: Duration) -> Observation {
        let elapsed = self.clock.elapsed().saturating_sub(started);
        let remaining = self.policy.inclusion_timeout.saturating_sub(elapsed);

        let lookup = self
            .bounded(remaining, self.chain.transaction_inclusion(tx_hash))
            .await;
        let not_mined = Observation::NotMined {
            elapsed: self.clock.elapsed().saturating_sub(started),
        };

        match lookup {
            Some(Ok(Some(inclusion))) => Observation::Mined(inclusion),
            Some(Ok(None)) => not_mined,
            Some(Err(e)) => {
                tracing::debug!(tx = %tx_hash, error = %e, "Receipt lookup failed, polling again");
                not_mined
            }
            None => {
                tracing::warn!(tx = %tx_hash, "Receipt lookup stalled until the deadline");
                not_mined
            }
        }
    }

    async fn fetch_block(&self, tx_hash: B256, block_number: u64) -> Observation {
        let lookup = self
            .bounded(
                self.policy.lookup_timeout,
                self.chain.block_timestamp(block_number),
            )
            .await;

        match lookup {
            Some(Ok(Some(timestamp))) => Observation::BlockFound { timestamp },
            Some(Ok(None)) => {
                tracing::warn!(tx = %tx_hash, block = block_number, "Block not indexed yet");
                Observation::BlockMissing
            }
            Some(Err(e)) => {
                tracing::warn!(tx = %tx_hash, block = block_number, error = %e, "Block lookup failed");
                Observation::BlockMissing
            }
            None => {
                tracing::warn!(
                    tx = %tx_hash,
                    block = block_number,
                    timeout = ?self.policy.lookup_timeout,
                    "Block lookup timed out"
                );
                Observation::BlockMissing
            }
        }
    }
}
