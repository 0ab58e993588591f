use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::FixedPointAmount;

/// Re-export alloy types for convenience
pub use alloy::primitives::{Address, B256};

// =============================================================================
// ID Newtypes
// =============================================================================

/// Chain ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ChainId> for u64 {
    fn from(value: ChainId) -> Self {
        value.0
    }
}

// =============================================================================
// Deployment Plan
// =============================================================================

/// A single constructor argument of a deployment target.
///
/// Arguments are declared before the run starts. References to run
/// parameters and to earlier deployments are resolved right before the
/// target is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstructorArg {
    /// Address of a target deployed earlier in the same run
    AddressOf { address_of: String },
    /// A named run parameter, e.g. `motherlodeVault`
    Param { param: String },
    /// A literal value, encoded against the constructor ABI
    Literal(serde_json::Value),
}

impl ConstructorArg {
    pub fn address_of(name: impl Into<String>) -> Self {
        Self::AddressOf {
            address_of: name.into(),
        }
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self::Param { param: name.into() }
    }
}

/// A contract to deploy, by artifact name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentTarget {
    /// Artifact name, e.g. `SyntheverseGenesisSYNTH90T`
    pub name: String,
    /// Short label used in the human-readable receipt
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub args: Vec<ConstructorArg>,
    /// Decode `MotherlodeMinted` from this contract's deployment block
    #[serde(default)]
    pub emits_motherlode: bool,
    /// Read ERC-20 `symbol()` and `totalSupply()` after deployment
    #[serde(default)]
    pub erc20: bool,
}

impl DeploymentTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            args: Vec::new(),
            emits_motherlode: false,
            erc20: false,
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Inputs of a run that are recorded verbatim in the receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentParams {
    pub motherlode_vault: Address,
}

impl DeploymentParams {
    pub const MOTHERLODE_VAULT: &'static str = "motherlodeVault";

    /// Look up a parameter by the name used in [`ConstructorArg::Param`]
    pub fn get(&self, name: &str) -> Option<serde_json::Value> {
        match name {
            Self::MOTHERLODE_VAULT => Some(serde_json::Value::String(
                self.motherlode_vault.to_checksum(None),
            )),
            _ => None,
        }
    }
}

// =============================================================================
// Deployment Results
// =============================================================================

/// A contract-creation transaction that was accepted by the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDeployment {
    pub tx_hash: B256,
    pub address: Address,
}

/// Block a transaction was confirmed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub block_number: u64,
    pub block_timestamp: u64,
}

/// A deployed and confirmed contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedContractReceipt {
    pub name: String,
    /// Label from the deployment plan, for the human-readable receipt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub address: Address,
    pub deploy_tx_hash: B256,
    pub block_number: u64,
    pub block_timestamp: u64,
}

impl DeployedContractReceipt {
    /// Only constructible once the transaction is confirmed
    pub fn confirmed(target: &DeploymentTarget, pending: PendingDeployment, at: Confirmation) -> Self {
        Self {
            name: target.name.clone(),
            label: target.label.clone(),
            address: pending.address,
            deploy_tx_hash: pending.tx_hash,
            block_number: at.block_number,
            block_timestamp: at.block_timestamp,
        }
    }

    /// Plan label, or the contract name when the plan gives none
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Block timestamp as ISO-8601, if it is in chrono's range
    pub fn block_time_iso(&self) -> Option<String> {
        let secs = i64::try_from(self.block_timestamp).ok()?;
        DateTime::<Utc>::from_timestamp(secs, 0)
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

/// Decoded `MotherlodeMinted` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotherlodeBreakdown {
    pub vault: Address,
    pub total: FixedPointAmount,
    pub gold: FixedPointAmount,
    pub silver: FixedPointAmount,
    pub copper: FixedPointAmount,
}

impl MotherlodeBreakdown {
    /// Whether the three tranches add up to the total exactly
    pub fn is_consistent(&self) -> bool {
        self.gold
            .checked_add(self.silver)
            .and_then(|sum| sum.checked_add(self.copper))
            == Some(self.total)
    }
}

/// ERC-20 facts read back from a deployed token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
    pub contract: String,
    pub symbol: String,
    pub total_supply: FixedPointAmount,
}

/// Everything known about one run. Built once, written once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub protocol: String,
    pub network: String,
    pub chain_id: ChainId,
    pub deployed_at: DateTime<Utc>,
    pub deployer: Address,
    pub params: DeploymentParams,
    pub contracts: Vec<DeployedContractReceipt>,
    pub motherlode_minted: Option<MotherlodeBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenSummary>,
}

impl DeploymentRecord {
    pub fn contract(&self, name: &str) -> Option<&DeployedContractReceipt> {
        self.contracts.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_arg_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            args: Vec<ConstructorArg>,
        }

        let parsed: Wrapper = serde_json::from_str(
            r#"{"args": [{"param": "motherlodeVault"}, {"address_of": "Token"}, "42", true]}"#,
        )
        .unwrap();

        assert_eq!(parsed.args[0], ConstructorArg::param("motherlodeVault"));
        assert_eq!(parsed.args[1], ConstructorArg::address_of("Token"));
        assert_eq!(parsed.args[2], ConstructorArg::Literal("42".into()));
        assert_eq!(parsed.args[3], ConstructorArg::Literal(true.into()));
    }

    #[test]
    fn test_params_lookup() {
        let params = DeploymentParams {
            motherlode_vault: Address::repeat_byte(0xab),
        };
        let value = params.get("motherlodeVault").unwrap();
        assert_eq!(
            value.as_str().unwrap().to_lowercase(),
            format!("0x{}", "ab".repeat(20))
        );
        assert!(params.get("unknown").is_none());
    }

    #[test]
    fn test_block_time_iso() {
        let receipt = DeployedContractReceipt {
            name: "Kernel".into(),
            label: None,
            address: Address::ZERO,
            deploy_tx_hash: B256::ZERO,
            block_number: 1,
            block_timestamp: 1_700_000_000,
        };
        assert_eq!(
            receipt.block_time_iso().unwrap(),
            "2023-11-14T22:13:20.000Z"
        );
    }

    #[test]
    fn test_receipt_carries_plan_label() {
        let mut target = DeploymentTarget::new("SyntheverseGenesisSYNTH90T");
        target.label = Some("SYNTH 90T Motherlode Blockmine".to_string());
        let pending = PendingDeployment {
            tx_hash: B256::repeat_byte(0xaa),
            address: Address::repeat_byte(0x01),
        };
        let at = Confirmation {
            block_number: 3,
            block_timestamp: 1_700_000_000,
        };

        let receipt = DeployedContractReceipt::confirmed(&target, pending, at);
        assert_eq!(receipt.label(), "SYNTH 90T Motherlode Blockmine");

        let unlabeled =
            DeployedContractReceipt::confirmed(&DeploymentTarget::new("Kernel"), pending, at);
        assert_eq!(unlabeled.label(), "Kernel");
        let json = serde_json::to_value(&unlabeled).unwrap();
        assert!(json.get("label").is_none());
    }

    #[test]
    fn test_breakdown_consistency() {
        let amount = |s: &str| FixedPointAmount::from_decimal_str(s).unwrap();
        let breakdown = MotherlodeBreakdown {
            vault: Address::ZERO,
            total: amount("90000000000000.0"),
            gold: amount("45000000000000.0"),
            silver: amount("27000000000000.0"),
            copper: amount("18000000000000.0"),
        };
        assert!(breakdown.is_consistent());

        let skewed = MotherlodeBreakdown {
            copper: amount("18000000000000.000000000000000001"),
            ..breakdown
        };
        assert!(!skewed.is_consistent());
    }
}
