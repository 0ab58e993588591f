//! One full deployment run
//!
//! Checks the network, deploys the plan, reads back audit facts and
//! assembles the [`DeploymentRecord`]. Writing the record is left to the
//! caller so nothing is persisted unless every step succeeded.

use chrono::Utc;

use crate::chain::{ChainReader, Clock, Deployer};
use crate::config::RunConfig;
use crate::confirm::ConfirmationWaiter;
use crate::decode::EventDecoder;
use crate::error::{Error, Result};
use crate::orchestrator::DeploymentOrchestrator;
use crate::token::read_token_summary;
use crate::types::{ChainId, DeploymentRecord, MotherlodeBreakdown, TokenSummary};

pub struct Pipeline<'a> {
    config: &'a RunConfig,
    chain: &'a dyn ChainReader,
    deployer: &'a dyn Deployer,
    clock: &'a dyn Clock,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a RunConfig,
        chain: &'a dyn ChainReader,
        deployer: &'a dyn Deployer,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            config,
            chain,
            deployer,
            clock,
        }
    }

    pub async fn execute(&self) -> Result<DeploymentRecord> {
        let chain_id = self.check_chain_id().await?;

        let waiter = ConfirmationWaiter::new(self.chain, self.clock, self.config.policy);
        let contracts = DeploymentOrchestrator::new(self.deployer, waiter, &self.config.params)
            .deploy(&self.config.plan.targets)
            .await?;

        let decoder = EventDecoder::new(self.chain);
        let mut motherlode_minted: Option<MotherlodeBreakdown> = None;
        let mut token: Option<TokenSummary> = None;

        for (target, receipt) in self.config.plan.targets.iter().zip(&contracts) {
            if target.emits_motherlode && motherlode_minted.is_none() {
                motherlode_minted = decoder
                    .decode_motherlode(receipt.address, receipt.block_number)
                    .await?;

                match &motherlode_minted {
                    Some(breakdown) if !breakdown.is_consistent() => tracing::warn!(
                        contract = %receipt.name,
                        total = %breakdown.total,
                        "Motherlode tranches do not add up to the total"
                    ),
                    Some(breakdown) => tracing::info!(
                        contract = %receipt.name,
                        total = %breakdown.total,
                        "Motherlode event decoded"
                    ),
                    None => tracing::warn!(
                        contract = %receipt.name,
                        block = receipt.block_number,
                        "No MotherlodeMinted event in deployment block"
                    ),
                }
            }

            if target.erc20 && token.is_none() {
                let summary = read_token_summary(self.chain, &receipt.name, receipt.address).await?;
                tracing::info!(
                    contract = %receipt.name,
                    symbol = %summary.symbol,
                    total_supply = %summary.total_supply,
                    "Token summary read"
                );
                token = Some(summary);
            }
        }

        Ok(DeploymentRecord {
            protocol: self.config.protocol().to_string(),
            network: self.config.network.clone(),
            chain_id: ChainId(chain_id),
            deployed_at: Utc::now(),
            deployer: self.deployer.address(),
            params: self.config.params.clone(),
            contracts,
            motherlode_minted,
            token,
        })
    }

    async fn check_chain_id(&self) -> Result<u64> {
        let actual = self.chain.chain_id().await?;
        if let Some(expected) = self.config.expected_chain_id {
            if expected != actual {
                return Err(Error::config(format!(
                    "Network '{}' reports chain ID {} but {} is configured",
                    self.config.network, actual, expected
                )));
            }
        }
        tracing::info!(network = %self.config.network, chain_id = actual, "Connected");
        Ok(actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::FixedPointAmount;
    use crate::config::DeploymentPlan;
    use crate::decode::MotherlodeMinted;
    use crate::testing::{FakeChain, SimClock};
    use alloy::primitives::{Address, U256};
    use alloy::sol_types::SolEvent;

    const VAULT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    fn tokens(decimal: &str) -> U256 {
        FixedPointAmount::from_decimal_str(decimal)
            .unwrap()
            .base_units()
    }

    fn genesis_chain() -> FakeChain {
        let vault: Address = VAULT.parse().unwrap();
        let event = MotherlodeMinted {
            vault,
            total: tokens("90000000000000.0"),
            gold: tokens("45000000000000.0"),
            silver: tokens("27000000000000.0"),
            copper: tokens("18000000000000.0"),
        };
        FakeChain::new(84532)
            .with_block_read_failures(Some(2))
            .with_deploy_logs(DeploymentPlan::TOKEN, vec![event.encode_log_data()])
            .with_erc20(DeploymentPlan::TOKEN, "SYNTH", tokens("90000000000000.0"))
    }

    async fn execute(chain: &FakeChain, config: &RunConfig) -> Result<DeploymentRecord> {
        let clock = SimClock::new();
        Pipeline::new(config, chain, chain, &clock).execute().await
    }

    #[tokio::test]
    async fn test_genesis_run() {
        let chain = genesis_chain();
        let config = RunConfig::new("baseSepolia", VAULT, DeploymentPlan::genesis())
            .unwrap()
            .with_expected_chain_id(Some(84532));

        let record = execute(&chain, &config).await.unwrap();

        assert_eq!(record.chain_id, ChainId(84532));
        assert_eq!(record.network, "baseSepolia");
        assert_eq!(record.deployer, Address::repeat_byte(0xde));
        assert_eq!(record.contracts.len(), 2);

        let token = record.contract(DeploymentPlan::TOKEN).unwrap();
        let kernel = record.contract(DeploymentPlan::KERNEL).unwrap();
        assert_ne!(token.address, kernel.address);
        assert!(token.block_number <= kernel.block_number);
        assert_eq!(kernel.block_timestamp, FakeChain::timestamp_of(kernel.block_number));

        let breakdown = record.motherlode_minted.as_ref().unwrap();
        assert_eq!(breakdown.vault, config.params.motherlode_vault);
        assert!(breakdown.is_consistent());
        assert_eq!(breakdown.gold.to_decimal_string(), "45000000000000.0");

        let summary = record.token.as_ref().unwrap();
        assert_eq!(summary.symbol, "SYNTH");
        assert_eq!(summary.total_supply, breakdown.total);
    }

    #[tokio::test]
    async fn test_kernel_only_run_has_no_breakdown() {
        let chain = genesis_chain();
        let plan = DeploymentPlan::genesis()
            .only(&[DeploymentPlan::KERNEL.to_string()])
            .unwrap();
        let config = RunConfig::new("baseSepolia", VAULT, plan).unwrap();

        let record = execute(&chain, &config).await.unwrap();

        assert_eq!(record.contracts.len(), 1);
        assert!(record.motherlode_minted.is_none());
        assert!(record.token.is_none());
    }

    #[tokio::test]
    async fn test_missing_event_is_absent() {
        let chain = FakeChain::new(8453).with_erc20(DeploymentPlan::TOKEN, "SYNTH", U256::ZERO);
        let config = RunConfig::new("base", VAULT, DeploymentPlan::genesis()).unwrap();

        let record = execute(&chain, &config).await.unwrap();

        assert!(record.motherlode_minted.is_none());
        assert_eq!(record.contracts.len(), 2);
    }

    #[tokio::test]
    async fn test_chain_id_mismatch() {
        let chain = genesis_chain();
        let config = RunConfig::new("base", VAULT, DeploymentPlan::genesis())
            .unwrap()
            .with_expected_chain_id(Some(8453));

        let err = execute(&chain, &config).await.unwrap_err();

        assert!(err.is_configuration());
        assert!(chain.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_token_read_failure_aborts() {
        let chain = FakeChain::new(8453);
        let config = RunConfig::new("base", VAULT, DeploymentPlan::genesis()).unwrap();

        let err = execute(&chain, &config).await.unwrap_err();

        assert!(matches!(err, Error::Rpc(_)));
    }
}
