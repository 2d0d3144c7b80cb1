use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use scuttle_config::UninstallConfig;

#[derive(Debug, Parser)]
#[command(name = "scuttle", about = "Framework uninstall coordinator", version)]
pub struct Cli {
    #[command(flatten)]
    pub config: UninstallConfig,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the uninstall coordinator until the plan completes.
    Run {
        /// Path to a redb state file. Omit to run against an ephemeral
        /// in-memory store (state is lost on exit).
        #[arg(long, env = "SCUTTLE_STORE_PATH")]
        store_path: Option<PathBuf>,

        /// Drive the offer loop with synthetic offers built from the
        /// store's own task resources instead of a live master connection
        /// — the only driver transport this crate implements.
        #[arg(long)]
        simulate: bool,

        /// Whether the service spec this run stands in for declares
        /// transport encryption, gating the TLS-cleanup phase. There is no
        /// service-specification loader in this crate (out of scope); this
        /// flag is the stand-in for that input.
        #[arg(long)]
        transport_encryption: bool,

        /// Address the `/plans` and `/events` HTTP surface binds to.
        #[arg(long, env = "SCUTTLE_BIND", default_value = "127.0.0.1:8090")]
        bind: SocketAddr,

        /// Bearer token required on every request to the HTTP surface.
        #[arg(long, env = "SCUTTLE_AUTH_TOKEN")]
        auth_token: String,
    },

    /// Print the current plan's phase/step tree and exit.
    Status {
        #[arg(long, env = "SCUTTLE_STORE_PATH")]
        store_path: Option<PathBuf>,

        #[arg(long)]
        transport_encryption: bool,
    },
}
