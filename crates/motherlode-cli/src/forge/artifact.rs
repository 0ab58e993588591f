//! Artifact loading trait and filesystem implementation

use std::path::PathBuf;

use motherlode_core::{Error, Result};

use super::types::{ContractArtifact, DeployableArtifact};

// =============================================================================
// Trait Definition
// =============================================================================

/// Trait for loading contract artifacts from various sources
pub trait ArtifactLoader: Send + Sync {
    /// Load the raw contract artifact
    fn load(&self, name: &str) -> Result<ContractArtifact>;

    /// Load an artifact and check it can be deployed
    fn deployable(&self, name: &str) -> Result<DeployableArtifact> {
        DeployableArtifact::from_artifact(name, self.load(name)?)
    }
}

// =============================================================================
// Filesystem Implementation
// =============================================================================

/// Artifact loader that reads from the filesystem (forge build output)
#[derive(Debug, Clone)]
pub struct FileSystemArtifactLoader {
    /// Directory containing compiled artifacts (typically "out")
    out_dir: PathBuf,
}

impl FileSystemArtifactLoader {
    pub const DEFAULT_OUT_DIR: &'static str = "out";

    /// Create a new loader reading from `out/` in the current directory
    pub fn new() -> Self {
        Self::with_out_dir(Self::DEFAULT_OUT_DIR)
    }

    pub fn with_out_dir<P: Into<PathBuf>>(out_dir: P) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Find `<name>.json` in any source directory of the build output, for
    /// contracts whose file name differs from the contract name
    fn find_artifact(&self, name: &str) -> Option<PathBuf> {
        let file = format!("{}.json", name);
        std::fs::read_dir(&self.out_dir)
            .ok()?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| !n.starts_with('.') && n != "build-info")
            })
            .map(|path| path.join(&file))
            .find(|path| path.is_file())
    }
}

impl Default for FileSystemArtifactLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactLoader for FileSystemArtifactLoader {
    fn load(&self, contract_name: &str) -> Result<ContractArtifact> {
        let conventional = self
            .out_dir
            .join(format!("{}.sol", contract_name))
            .join(format!("{}.json", contract_name));

        let path = if conventional.is_file() {
            conventional
        } else {
            self.find_artifact(contract_name).ok_or_else(|| {
                Error::Artifact(format!(
                    "Could not find artifact for contract '{}' in {}. Make sure `forge build` was run.",
                    contract_name,
                    self.out_dir.display()
                ))
            })?
        };

        tracing::debug!(contract = contract_name, path = %path.display(), "Loading artifact");

        let content = std::fs::read_to_string(&path).map_err(|e| Error::filesystem(&path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Artifact(format!("Invalid artifact {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const TOKEN_ARTIFACT: &str = r#"{
        "abi": [
            {
                "type": "constructor",
                "inputs": [{"name": "motherlodeVault", "type": "address"}],
                "stateMutability": "nonpayable"
            }
        ],
        "bytecode": {
            "object": "0x6080604052348015600f57600080fd5b50"
        },
        "deployedBytecode": {
            "object": "0x6080604052"
        }
    }"#;

    fn write_artifact(out: &Path, dir: &str, name: &str, content: &str) {
        let dir = out.join(dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{}.json", name)), content).unwrap();
    }

    #[test]
    fn test_parse_contract_artifact() {
        let artifact: ContractArtifact = serde_json::from_str(TOKEN_ARTIFACT).unwrap();

        assert!(artifact.abi.is_array());
        assert!(artifact.bytecode.is_valid());
    }

    #[test]
    fn test_load_conventional_path() {
        let tmp = tempfile::tempdir().unwrap();
        write_artifact(tmp.path(), "Token.sol", "Token", TOKEN_ARTIFACT);

        let loader = FileSystemArtifactLoader::with_out_dir(tmp.path());
        let deployable = loader.deployable("Token").unwrap();

        assert_eq!(deployable.name, "Token");
        assert_eq!(deployable.bytecode.len(), 17);
        assert_eq!(deployable.abi.constructor().unwrap().inputs.len(), 1);
    }

    #[test]
    fn test_load_from_other_source_file() {
        let tmp = tempfile::tempdir().unwrap();
        write_artifact(tmp.path(), "Genesis.sol", "Token", TOKEN_ARTIFACT);

        let loader = FileSystemArtifactLoader::with_out_dir(tmp.path());
        assert!(loader.load("Token").is_ok());
    }

    #[test]
    fn test_missing_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = FileSystemArtifactLoader::with_out_dir(tmp.path().join("out"));

        let err = loader.load("Token").unwrap_err();
        assert!(matches!(err, Error::Artifact(_)));
    }

    #[test]
    fn test_interface_is_not_deployable() {
        let tmp = tempfile::tempdir().unwrap();
        write_artifact(
            tmp.path(),
            "IToken.sol",
            "IToken",
            r#"{"abi": [], "bytecode": {"object": "0x"}}"#,
        );

        let loader = FileSystemArtifactLoader::with_out_dir(tmp.path());
        assert!(loader.load("IToken").is_ok());
        assert!(matches!(loader.deployable("IToken"), Err(Error::Artifact(_))));
    }

    #[test]
    fn test_init_code_appends_constructor_args() {
        let tmp = tempfile::tempdir().unwrap();
        write_artifact(tmp.path(), "Token.sol", "Token", TOKEN_ARTIFACT);
        let deployable = FileSystemArtifactLoader::with_out_dir(tmp.path())
            .deployable("Token")
            .unwrap();

        let vault = alloy::primitives::Address::repeat_byte(0x77);
        let code = deployable
            .init_code(&[serde_json::json!(vault.to_checksum(None))])
            .unwrap();
        assert_eq!(code.len(), 17 + 32);
        assert_eq!(&code[17 + 12..], vault.as_slice());

        let err = deployable.init_code(&[]).unwrap_err();
        assert!(matches!(err, Error::Deployment { .. }));
    }
}
