//! Type definitions for forge artifacts

use motherlode_core::{Abi, Bytecode, Error, Result};
use serde::Deserialize;

/// Contract artifact as written by `forge build`
#[derive(Debug, Deserialize)]
pub struct ContractArtifact {
    pub abi: serde_json::Value,
    pub bytecode: BytecodeObject,
}

/// Bytecode object within an artifact
#[derive(Debug, Deserialize)]
pub struct BytecodeObject {
    pub object: String,
}

impl BytecodeObject {
    /// Check if this bytecode is valid (non-empty)
    pub fn is_valid(&self) -> bool {
        !self.object.is_empty() && self.object != "0x"
    }
}

/// Everything needed to build a creation transaction
#[derive(Debug, Clone)]
pub struct DeployableArtifact {
    pub name: String,
    pub abi: Abi,
    pub bytecode: Bytecode,
}

impl DeployableArtifact {
    pub fn from_artifact(name: &str, artifact: ContractArtifact) -> Result<Self> {
        if !artifact.bytecode.is_valid() {
            return Err(Error::Artifact(format!(
                "Artifact '{}' has no bytecode (may be an interface or abstract contract)",
                name
            )));
        }

        Ok(Self {
            name: name.to_string(),
            abi: Abi::from_value(&artifact.abi)?,
            bytecode: Bytecode::from_hex(&artifact.bytecode.object)?,
        })
    }

    /// Init code for a creation transaction with `args` for the constructor
    pub fn init_code(&self, args: &[serde_json::Value]) -> Result<alloy::primitives::Bytes> {
        let encoded = self.abi.encode_constructor(args).map_err(|e| match e {
            Error::Abi(reason) => Error::deployment(&self.name, reason),
            other => other,
        })?;
        Ok(self.bytecode.deploy_code(&encoded))
    }
}
