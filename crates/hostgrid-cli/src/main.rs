//! hostgrid — operator CLI for the deployment lifecycle core.
//!
//! # Usage
//!
//! ```text
//! hostgrid totals --fixture demos/fleet.json
//! hostgrid show --fixture demos/fleet.json --deployment dep-storefront
//! hostgrid run --fixture demos/fleet.json --config demos/hostgrid.toml < demos/scale.hgs
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use hostgrid_core::HostgridConfig;

mod commands;
mod script;

#[derive(Parser)]
#[command(
    name = "hostgrid",
    about = "hostgrid — deployment lifecycle and replica scaling",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to hostgrid.toml (defaults apply when omitted).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print fleet resource totals and status counts as JSON.
    Totals {
        /// Fleet fixture (JSON array of deployments).
        #[arg(short, long)]
        fixture: PathBuf,
    },
    /// Print deployments as JSON.
    Show {
        #[arg(short, long)]
        fixture: PathBuf,
        /// Only print this deployment.
        #[arg(short, long)]
        deployment: Option<String>,
    },
    /// Drive the fleet in real time from a command script on stdin.
    ///
    /// One command per line: start, stop, restart, delete <deployment>;
    /// start-service, stop-service <deployment> <service>;
    /// scale <deployment> <service> <replicas>; wait <ms>; show [deployment];
    /// totals; quit. Blank lines and `#` comments are skipped.
    Run {
        #[arg(short, long)]
        fixture: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => HostgridConfig::from_file(path)?,
        None => HostgridConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.log.filter))?,
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Totals { fixture } => commands::fleet::totals(&fixture),
        Commands::Show {
            fixture,
            deployment,
        } => commands::fleet::show(&fixture, deployment.as_deref()),
        Commands::Run { fixture } => commands::run::run(&fixture, &config).await,
    }
}
