mod commands;
mod config;
mod forge;
mod rpc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Command;

/// Log filter used when `RUST_LOG` is not set
const DEFAULT_LOG_FILTER: &str = "motherlode=info,motherlode_core=info";

#[derive(Parser)]
#[command(name = "motherlode")]
#[command(about = "Sequential contract deployment with confirmed, auditable receipts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    cli.command.run().await
}
