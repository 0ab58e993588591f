//! Write a configuration template

use std::path::{Path, PathBuf};

use clap::Args;
use color_eyre::eyre::{eyre, Result};
use console::style;
use motherlode_core::DeploymentsDir;

use crate::config::CONFIG_FILE;

const TEMPLATE: &str = r#"# motherlode deployment configuration
#
# Values of the form "${NAME}" are read from the environment.

# Forge build output holding <Name>.sol/<Name>.json artifacts
artifacts_dir = "out"

[networks.base]
url = "${BASE_RPC_URL}"
chain_id = 8453
explorer_url = "https://basescan.org"

[networks.baseSepolia]
url = "${BASE_SEPOLIA_RPC_URL}"
chain_id = 84532
explorer_url = "https://sepolia.basescan.org"

[deployer]
# Never commit a literal key here
private_key = "${DEPLOYER_PRIVATE_KEY}"
"#;

/// Write a motherlode.toml template in the current directory
#[derive(Args)]
pub struct InitCommand {
    /// Where to write the template
    #[arg(long, default_value = CONFIG_FILE)]
    pub path: PathBuf,
}

impl InitCommand {
    pub async fn run(self) -> Result<()> {
        write_template(&self.path)?;
        println!("{} Created {}", style("✓").green(), self.path.display());

        println!();
        println!("Next steps:");
        println!(
            "  1. Export {} and the RPC URLs for your networks",
            style("DEPLOYER_PRIVATE_KEY").cyan()
        );
        println!(
            "  2. Run {} to deploy",
            style("motherlode deploy --network baseSepolia --vault <address>").cyan()
        );
        println!(
            "  3. Receipts are written to {}/",
            style(DeploymentsDir::NAME).cyan()
        );

        Ok(())
    }
}

fn write_template(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(eyre!("{} already exists", path.display()));
    }
    std::fs::write(path, TEMPLATE)?;
    Ok(())
}
