use std::collections::HashMap;
use std::path::Path;

use color_eyre::eyre::{eyre, Result, WrapErr};
use motherlode_core::DeploymentPlan;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "motherlode.toml";

/// Configuration file structure (motherlode.toml)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MotherlodeConfig {
    #[serde(default)]
    pub networks: HashMap<String, NetworkEntry>,
    #[serde(default)]
    pub deployer: DeployerEntry,
    /// Forge build output holding contract artifacts
    #[serde(default)]
    pub artifacts_dir: Option<String>,
}

/// A named network as written in the file; values may reference `${ENV}`
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkEntry {
    pub url: String,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub explorer_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeployerEntry {
    #[serde(default)]
    pub private_key: Option<String>,
}

impl MotherlodeConfig {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|_| {
            eyre!(
                "Could not read {}. Run `motherlode init` to create one.",
                path.display()
            )
        })?;

        toml::from_str(&content).wrap_err_with(|| format!("Invalid {}", path.display()))
    }

    /// Get a network configuration by name, resolving environment variables
    pub fn get_network(&self, name: &str) -> Result<NetworkConfig> {
        let entry = self.networks.get(name).ok_or_else(|| {
            let mut known = self.network_names();
            known.sort_unstable();
            eyre!(
                "Network '{}' not found in [networks] (known: {})",
                name,
                known.join(", ")
            )
        })?;

        let rpc_url = resolve_env_var(&entry.url)?;
        if rpc_url.trim().is_empty() {
            return Err(eyre!("Network '{}' has an empty url", name));
        }

        let explorer_url = entry
            .explorer_url
            .as_deref()
            .map(resolve_env_var)
            .transpose()?;

        Ok(NetworkConfig {
            name: name.to_string(),
            rpc_url,
            chain_id: entry.chain_id,
            explorer_url,
        })
    }

    /// Deployer private key, resolved from the environment if referenced
    pub fn private_key(&self) -> Result<String> {
        let raw = self
            .deployer
            .private_key
            .as_deref()
            .ok_or_else(|| eyre!("Missing [deployer] private_key in {}", CONFIG_FILE))?;
        resolve_env_var(raw)
    }

    pub fn network_names(&self) -> Vec<&str> {
        self.networks.keys().map(|s| s.as_str()).collect()
    }
}

/// Network configuration with environment references resolved
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc_url: String,
    /// Expected chain ID; checked against the node before deploying
    pub chain_id: Option<u64>,
    pub explorer_url: Option<String>,
}

/// Load a deployment plan from a TOML file
pub fn load_plan(path: &Path) -> Result<DeploymentPlan> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Could not read plan {}", path.display()))?;
    toml::from_str(&content).wrap_err_with(|| format!("Invalid plan {}", path.display()))
}

/// Resolve environment variable references in a string
/// Supports ${VAR_NAME} syntax
fn resolve_env_var(value: &str) -> Result<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).map_err(|_| eyre!("Environment variable '{}' not set", var_name))
    } else {
        Ok(value.to_string())
    }
}
