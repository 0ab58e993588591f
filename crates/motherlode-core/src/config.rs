//! Run configuration
//!
//! A [`RunConfig`] is built once at startup from already-loaded inputs and
//! handed to every component. Inputs are validated while building it, so an
//! invalid run is rejected before anything touches the network.

use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::confirm::ConfirmationPolicy;
use crate::error::{Error, Result};
use crate::types::{ConstructorArg, DeploymentParams, DeploymentTarget};

/// Protocol name recorded in receipts when none is configured
pub const DEFAULT_PROTOCOL: &str = "SyntheverseGenesis";

// =============================================================================
// Deployment Plan
// =============================================================================

/// Ordered list of contracts to deploy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(rename = "contracts")]
    pub targets: Vec<DeploymentTarget>,
}

fn default_protocol() -> String {
    DEFAULT_PROTOCOL.to_string()
}

impl DeploymentPlan {
    pub const TOKEN: &'static str = "SyntheverseGenesisSYNTH90T";
    pub const KERNEL: &'static str = "SyntheverseGenesisLensKernel";

    /// The genesis sequence: the SYNTH 90T motherlode token, then the
    /// lens/sandbox kernel.
    pub fn genesis() -> Self {
        Self {
            protocol: default_protocol(),
            targets: vec![
                DeploymentTarget {
                    name: Self::TOKEN.to_string(),
                    label: Some("SYNTH 90T Motherlode Blockmine".to_string()),
                    args: vec![ConstructorArg::param(DeploymentParams::MOTHERLODE_VAULT)],
                    emits_motherlode: true,
                    erc20: true,
                },
                DeploymentTarget {
                    name: Self::KERNEL.to_string(),
                    label: Some("Lens / Sandbox / Ecosystem Kernel".to_string()),
                    args: Vec::new(),
                    emits_motherlode: false,
                    erc20: false,
                },
            ],
        }
    }

    /// Keep only the named targets, preserving plan order
    pub fn only(mut self, names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Ok(self);
        }
        if let Some(unknown) = names
            .iter()
            .find(|n| !self.targets.iter().any(|t| &t.name == *n))
        {
            return Err(Error::config(format!(
                "'{}' is not part of the deployment plan",
                unknown
            )));
        }
        self.targets.retain(|t| names.contains(&t.name));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl Default for DeploymentPlan {
    fn default() -> Self {
        Self::genesis()
    }
}

// =============================================================================
// Run Configuration
// =============================================================================

/// Immutable configuration for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub network: String,
    /// Chain ID the network is expected to report, if known
    pub expected_chain_id: Option<u64>,
    pub params: DeploymentParams,
    pub plan: DeploymentPlan,
    pub policy: ConfirmationPolicy,
}

impl RunConfig {
    /// Validate raw inputs into a run configuration
    pub fn new(network: impl Into<String>, motherlode_vault: &str, plan: DeploymentPlan) -> Result<Self> {
        let network = network.into();
        if network.trim().is_empty() {
            return Err(Error::config("Missing required parameter: network"));
        }
        let motherlode_vault = parse_address(DeploymentParams::MOTHERLODE_VAULT, motherlode_vault)?;
        if plan.is_empty() {
            return Err(Error::config("Deployment plan has no contracts"));
        }

        Ok(Self {
            network,
            expected_chain_id: None,
            params: DeploymentParams { motherlode_vault },
            plan,
            policy: ConfirmationPolicy::default(),
        })
    }

    pub fn with_expected_chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.expected_chain_id = chain_id;
        self
    }

    pub fn with_policy(mut self, policy: ConfirmationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn protocol(&self) -> &str {
        &self.plan.protocol
    }
}

/// Syntactic account-address check.
///
/// Accepts 40 hex digits with or without `0x`. Mixed-case input must carry
/// a valid EIP-55 checksum.
pub fn parse_address(name: &str, raw: &str) -> Result<Address> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(Error::config(format!("Missing required parameter: {}", name)));
    }

    let digits = value.strip_prefix("0x").unwrap_or(value);
    let mixed_case = digits.chars().any(|c| c.is_ascii_lowercase())
        && digits.chars().any(|c| c.is_ascii_uppercase());

    let parsed = if mixed_case {
        Address::parse_checksummed(value, None).ok()
    } else {
        Address::from_str(value).ok()
    };

    parsed.ok_or_else(|| Error::config(format!("{} is not a valid address: {}", name, raw)))
}
