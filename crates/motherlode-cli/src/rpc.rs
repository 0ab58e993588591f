//! alloy-backed chain access

use alloy::eips::BlockNumberOrTag;
use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes, Log, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result};
use motherlode_core::{ChainReader, Deployer, Error, Inclusion, LogQuery, PendingDeployment};

use crate::forge::ArtifactLoader;

/// Live node connection with a local signer
pub struct AlloyChain {
    provider: DynProvider,
    sender: Address,
    artifacts: Box<dyn ArtifactLoader>,
}

impl AlloyChain {
    /// Build a provider for `rpc_url` signing with `private_key`.
    ///
    /// No request is made until the first call.
    pub fn connect(rpc_url: &str, private_key: &str, artifacts: Box<dyn ArtifactLoader>) -> Result<Self> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|_| eyre!("Invalid deployer private key"))?;
        let sender = signer.address();

        let url: Url = rpc_url
            .parse()
            .map_err(|e| eyre!("Invalid RPC URL '{}': {}", rpc_url, e))?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        Ok(Self {
            provider,
            sender,
            artifacts,
        })
    }
}

fn rpc_error(e: impl std::fmt::Display) -> Error {
    Error::Rpc(e.to_string())
}

#[async_trait]
impl ChainReader for AlloyChain {
    async fn chain_id(&self) -> motherlode_core::Result<u64> {
        self.provider.get_chain_id().await.map_err(rpc_error)
    }

    async fn transaction_inclusion(&self, tx_hash: B256) -> motherlode_core::Result<Option<Inclusion>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(rpc_error)?;

        // Receipts without a block number are still pending
        Ok(receipt.and_then(|r| {
            r.block_number.map(|block_number| Inclusion {
                block_number,
                success: ReceiptResponse::status(&r),
                contract_address: r.contract_address,
            })
        }))
    }

    async fn block_timestamp(&self, block_number: u64) -> motherlode_core::Result<Option<u64>> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(block_number))
            .await
            .map_err(rpc_error)?;
        Ok(block.map(|b| b.header.timestamp))
    }

    async fn logs(&self, query: &LogQuery) -> motherlode_core::Result<Vec<Log>> {
        let filter = Filter::new()
            .address(query.address)
            .event_signature(query.event_signature)
            .from_block(query.from_block)
            .to_block(query.to_block);

        let logs = self.provider.get_logs(&filter).await.map_err(rpc_error)?;
        Ok(logs.into_iter().map(|log| log.inner).collect())
    }

    async fn call(&self, to: Address, data: Bytes) -> motherlode_core::Result<Bytes> {
        let tx = TransactionRequest::default().with_to(to).with_input(data);
        self.provider.call(tx).await.map_err(rpc_error)
    }
}

#[async_trait]
impl Deployer for AlloyChain {
    fn address(&self) -> Address {
        self.sender
    }

    fn prepare(&self, contract: &str, args: &[serde_json::Value]) -> motherlode_core::Result<()> {
        let artifact = self.artifacts.deployable(contract)?;
        artifact.init_code(args)?;
        Ok(())
    }

    async fn submit(
        &self,
        contract: &str,
        args: &[serde_json::Value],
    ) -> motherlode_core::Result<PendingDeployment> {
        let artifact = self.artifacts.deployable(contract)?;
        let code = artifact.init_code(args)?;

        let nonce = self
            .provider
            .get_transaction_count(self.sender)
            .pending()
            .await
            .map_err(|e| Error::deployment(contract, format!("Failed to fetch nonce: {}", e)))?;

        let tx = TransactionRequest::default()
            .with_from(self.sender)
            .with_nonce(nonce)
            .with_deploy_code(code);

        let pending = self.provider.send_transaction(tx).await.map_err(|e| {
            Error::deployment(contract, format!("Failed to send deployment transaction: {}", e))
        })?;

        Ok(PendingDeployment {
            tx_hash: *pending.tx_hash(),
            address: self.sender.create(nonce),
        })
    }
}
