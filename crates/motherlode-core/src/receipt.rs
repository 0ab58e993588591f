//! Deployment receipts
//!
//! A [`DeploymentRecord`] is rendered into two artifacts sharing one file
//! stem: a JSON document holding the record field for field, and a
//! Markdown document for people. Both are written with create-new
//! semantics, so an existing receipt is never overwritten.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::amount::{group_thousands, FixedPointAmount};
use crate::dir::DeploymentsDir;
use crate::error::{Error, Result};
use crate::types::{DeployedContractReceipt, DeploymentRecord};

/// Symbol used for amounts when no token summary was read
pub const DEFAULT_TOKEN_SYMBOL: &str = "SYNTH";

// =============================================================================
// File Stem
// =============================================================================

/// `<protocol>-<network>-<chainId>-<generationTimestampMillis>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactStem(String);

impl ArtifactStem {
    pub fn new(protocol: &str, network: &str, chain_id: u64, generated_at_millis: i64) -> Self {
        Self(format!(
            "{}-{}-{}-{}",
            sanitize(protocol),
            sanitize(network),
            chain_id,
            generated_at_millis
        ))
    }

    /// Stem for a record, stamped with its generation time
    pub fn for_record(record: &DeploymentRecord) -> Self {
        Self::new(
            &record.protocol,
            &record.network,
            record.chain_id.0,
            record.deployed_at.timestamp_millis(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn json_file(&self) -> String {
        format!("{}.json", self.0)
    }

    pub fn markdown_file(&self) -> String {
        format!("{}.md", self.0)
    }
}

impl fmt::Display for ArtifactStem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

// =============================================================================
// Rendering
// =============================================================================

/// Both renderings of one record
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub stem: ArtifactStem,
    pub json: String,
    pub markdown: String,
}

impl Artifacts {
    pub fn synthesize(record: &DeploymentRecord) -> Result<Self> {
        let stem = ArtifactStem::for_record(record);
        let json = render_json(record)?;
        let markdown = render_markdown(record, &stem);
        Ok(Self {
            stem,
            json,
            markdown,
        })
    }
}

/// Structured artifact: the record as pretty-printed JSON
pub fn render_json(record: &DeploymentRecord) -> Result<String> {
    let mut json = serde_json::to_string_pretty(record)?;
    json.push('\n');
    Ok(json)
}

/// Token amount with grouped integer digits and a symbol suffix
pub fn format_tokens(amount: &FixedPointAmount, symbol: &str) -> String {
    format!("{} {}", group_thousands(&amount.to_decimal_string()), symbol)
}

/// Human artifact: the record as Markdown
pub fn render_markdown(record: &DeploymentRecord, stem: &ArtifactStem) -> String {
    let symbol = record
        .token
        .as_ref()
        .map(|t| t.symbol.as_str())
        .unwrap_or(DEFAULT_TOKEN_SYMBOL);

    let mut lines = vec![
        format!("## {} Deployment Receipt", record.protocol),
        String::new(),
        format!("- **network**: `{}`", record.network),
        format!("- **chainId**: `{}`", record.chain_id),
        format!("- **deployedAt**: `{}`", record.deployed_at.to_rfc3339()),
        format!("- **deployer**: `{}`", record.deployer),
        format!("- **motherlodeVault**: `{}`", record.params.motherlode_vault),
    ];

    for (index, contract) in record.contracts.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("### Contract {}: {}", index + 1, contract.label()));
        lines.push(String::new());
        lines.extend(contract_lines(contract));

        if let Some(token) = record.token.as_ref().filter(|t| t.contract == contract.name) {
            lines.push(format!("- **symbol**: `{}`", token.symbol));
            lines.push(format!(
                "- **totalSupply**: `{}`",
                format_tokens(&token.total_supply, &token.symbol)
            ));
        }
    }

    lines.push(String::new());
    match &record.motherlode_minted {
        Some(breakdown) => {
            lines.push("### MotherlodeMinted (decoded from on-chain event)".to_string());
            lines.push(String::new());
            lines.push("| field | value |".to_string());
            lines.push("|---|---:|".to_string());
            lines.push(format!("| vault | `{}` |", breakdown.vault));
            for (field, amount) in [
                ("total", &breakdown.total),
                ("gold", &breakdown.gold),
                ("silver", &breakdown.silver),
                ("copper", &breakdown.copper),
            ] {
                lines.push(format!("| {} | `{}` |", field, format_tokens(amount, symbol)));
            }
        }
        None => {
            lines.push("### MotherlodeMinted".to_string());
            lines.push(String::new());
            lines.push("_No event decoded._".to_string());
        }
    }

    lines.push(String::new());
    lines.push("### Raw receipt (JSON)".to_string());
    lines.push(String::new());
    lines.push(format!("- `{}`", stem.json_file()));
    lines.push(String::new());

    lines.join("\n")
}

fn contract_lines(contract: &DeployedContractReceipt) -> Vec<String> {
    let timestamp = match contract.block_time_iso() {
        Some(iso) => format!("`{}` (`{}`)", contract.block_timestamp, iso),
        None => format!("`{}`", contract.block_timestamp),
    };

    vec![
        format!("- **contract**: `{}`", contract.name),
        format!("- **address**: `{}`", contract.address),
        format!("- **deployTxHash**: `{}`", contract.deploy_tx_hash),
        format!("- **blockNumber**: `{}`", contract.block_number),
        format!("- **blockTimestamp**: {}", timestamp),
    ]
}

// =============================================================================
// Writing
// =============================================================================

/// Paths of the artifacts written for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifacts {
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}

/// Writes receipts into a [`DeploymentsDir`]
#[derive(Debug, Clone)]
pub struct ReceiptWriter {
    dir: DeploymentsDir,
}

impl ReceiptWriter {
    pub fn new(dir: DeploymentsDir) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &DeploymentsDir {
        &self.dir
    }

    /// Render and write both artifacts for `record`
    pub fn write(&self, record: &DeploymentRecord) -> Result<WrittenArtifacts> {
        let artifacts = Artifacts::synthesize(record)?;
        self.write_artifacts(&artifacts)
    }

    /// Write already-rendered artifacts. Fails if either file exists.
    pub fn write_artifacts(&self, artifacts: &Artifacts) -> Result<WrittenArtifacts> {
        self.dir.create()?;

        let json_path = self.dir.join(artifacts.stem.json_file());
        let markdown_path = self.dir.join(artifacts.stem.markdown_file());

        if markdown_path.exists() {
            return Err(Error::filesystem(
                &markdown_path,
                std::io::Error::from(std::io::ErrorKind::AlreadyExists),
            ));
        }

        write_new(&json_path, &artifacts.json)?;
        if let Err(e) = write_new(&markdown_path, &artifacts.markdown) {
            // Never leave half a receipt behind
            let _ = std::fs::remove_file(&json_path);
            return Err(e);
        }

        tracing::info!(
            json = %json_path.display(),
            markdown = %markdown_path.display(),
            "Receipt written"
        );

        Ok(WrittenArtifacts {
            json_path,
            markdown_path,
        })
    }
}

fn write_new(path: &Path, contents: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| Error::filesystem(path, e))?;
    file.write_all(contents.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| Error::filesystem(path, e))
}
