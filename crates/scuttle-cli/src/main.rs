mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run { store_path, simulate, transport_encryption, bind, auth_token } => {
            commands::run(cli.config, store_path, simulate, transport_encryption, bind, auth_token).await
        }
        Command::Status { store_path, transport_encryption } => {
            commands::status(cli.config, store_path, transport_encryption).await
        }
    }
}
