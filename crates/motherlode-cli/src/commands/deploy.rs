//! Deploy the plan and write a receipt

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use color_eyre::eyre::Result;
use console::style;
use dialoguer::Confirm;
use motherlode_core::{
    ConfirmationPolicy, DeploymentPlan, DeploymentRecord, DeploymentsDir, Pipeline, ReceiptWriter,
    RunConfig, TokioClock, WrittenArtifacts,
};

use crate::config::{load_plan, MotherlodeConfig, NetworkConfig, CONFIG_FILE};
use crate::forge::FileSystemArtifactLoader;
use crate::rpc::AlloyChain;

/// Deploy the plan and write a receipt
#[derive(Args)]
pub struct DeployCommand {
    /// Network name from [networks] in the config file
    #[arg(long, short)]
    pub network: String,

    /// Account receiving the motherlode mint
    #[arg(long)]
    pub vault: String,

    /// Deployment plan (TOML); defaults to the genesis plan
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Deploy only the named contracts (repeatable)
    #[arg(long)]
    pub only: Vec<String>,

    /// Directory receipts are written to
    #[arg(long, default_value = DeploymentsDir::NAME)]
    pub out: PathBuf,

    /// Configuration file
    #[arg(long, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,

    /// How long to wait for each transaction to be mined
    #[arg(long, default_value_t = 30_000)]
    pub inclusion_timeout_ms: u64,

    /// Block lookups before giving up on a mined transaction
    #[arg(long, default_value_t = 5)]
    pub block_attempts: u32,

    /// Delay unit between block lookups; attempt n waits n times this
    #[arg(long, default_value_t = 1_000)]
    pub block_retry_delay_ms: u64,
}

impl DeployCommand {
    pub async fn run(self) -> Result<()> {
        // Everything the user typed is validated before the network is touched
        let run_config = self.run_config()?;

        let file = MotherlodeConfig::load_from(&self.config)?;
        let network = file.get_network(&run_config.network)?;
        let run_config = run_config.with_expected_chain_id(network.chain_id);

        print_plan(&run_config, &network);
        if !self.yes && !confirm()? {
            println!("{} Aborted", style("⚠").yellow());
            return Ok(());
        }

        let artifacts = FileSystemArtifactLoader::with_out_dir(
            file.artifacts_dir
                .as_deref()
                .unwrap_or(FileSystemArtifactLoader::DEFAULT_OUT_DIR),
        );
        let chain = AlloyChain::connect(&network.rpc_url, &file.private_key()?, Box::new(artifacts))?;

        println!(
            "{} Connecting to {}...",
            style("→").blue(),
            style(&network.name).cyan()
        );
        let clock = TokioClock::new();
        let record = Pipeline::new(&run_config, &chain, &chain, &clock)
            .execute()
            .await?;

        let written = ReceiptWriter::new(DeploymentsDir::at(&self.out)).write(&record)?;
        let expects_event = run_config.plan.targets.iter().any(|t| t.emits_motherlode);
        print_record(&record, &network, &written, expects_event);

        Ok(())
    }

    fn run_config(&self) -> Result<RunConfig> {
        let plan = match &self.plan {
            Some(path) => load_plan(path)?,
            None => DeploymentPlan::genesis(),
        };
        let plan = plan.only(&self.only)?;

        let policy = ConfirmationPolicy {
            inclusion_timeout: Duration::from_millis(self.inclusion_timeout_ms),
            max_block_attempts: self.block_attempts.max(1),
            base_delay: Duration::from_millis(self.block_retry_delay_ms),
            ..ConfirmationPolicy::default()
        };

        Ok(RunConfig::new(&self.network, &self.vault, plan)?.with_policy(policy))
    }
}

fn confirm() -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt("Broadcast these deployments?")
        .default(false)
        .interact()?)
}

fn print_plan(config: &RunConfig, network: &NetworkConfig) {
    println!(
        "{} Deploying {} to {}{}",
        style("→").blue(),
        style(config.protocol()).bold(),
        style(&network.name).cyan(),
        network
            .chain_id
            .map(|id| format!(" (chain ID: {})", id))
            .unwrap_or_default()
    );
    println!(
        "  motherlodeVault: {}",
        style(config.params.motherlode_vault).yellow()
    );
    for (index, target) in config.plan.targets.iter().enumerate() {
        println!("  {}. {}", index + 1, style(target.label()).cyan());
    }
    println!();
}

fn print_record(
    record: &DeploymentRecord,
    network: &NetworkConfig,
    written: &WrittenArtifacts,
    expects_event: bool,
) {
    for contract in &record.contracts {
        println!(
            "{} {} deployed at {} (block {})",
            style("✓").green(),
            style(&contract.name).cyan(),
            style(contract.address).yellow(),
            contract.block_number
        );
        if let Some(explorer) = &network.explorer_url {
            println!(
                "  {}/address/{}",
                explorer.trim_end_matches('/'),
                contract.address
            );
        }
    }

    match &record.motherlode_minted {
        Some(breakdown) => {
            println!();
            println!("{} MotherlodeMinted", style("✓").green());
            println!("  total:  {}", breakdown.total);
            println!("  gold:   {}", breakdown.gold);
            println!("  silver: {}", breakdown.silver);
            println!("  copper: {}", breakdown.copper);
            if !breakdown.is_consistent() {
                println!(
                    "{} gold + silver + copper does not equal total",
                    style("⚠").yellow()
                );
            }
        }
        None if expects_event => println!(
            "{} No MotherlodeMinted event decoded",
            style("⚠").yellow()
        ),
        None => {}
    }

    println!();
    println!(
        "{} Receipt written to {} and {}",
        style("✓").green().bold(),
        style(written.json_path.display()).cyan(),
        style(written.markdown_path.display()).cyan()
    );
}
