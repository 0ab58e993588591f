//! CLI commands for motherlode

use clap::Subcommand;
use color_eyre::eyre::Result;

pub mod deploy;
pub mod init;

/// All available CLI commands
#[derive(Subcommand)]
pub enum Command {
    /// Write a motherlode.toml template in the current directory
    Init(init::InitCommand),

    /// Deploy the plan and write a receipt
    Deploy(deploy::DeployCommand),
}

impl Command {
    /// Execute the command
    pub async fn run(self) -> Result<()> {
        match self {
            Command::Init(cmd) => cmd.run().await,
            Command::Deploy(cmd) => cmd.run().await,
        }
    }
}
