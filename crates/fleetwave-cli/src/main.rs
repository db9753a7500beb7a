//! fleetwave — staged software rollout with gates and rollback.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod approve;
mod commands;
mod exec;
mod plan;

#[derive(Parser)]
#[command(
    name = "fleetwave",
    about = "Fleetwave — staged software rollout orchestrator",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new rollout run from a plan file
    Deploy {
        /// Path to the rollout plan
        #[arg(short, long, default_value = "fleetwave.toml")]
        plan: PathBuf,
    },
    /// Resume a paused or pending-approval run at its current stage
    Resume {
        /// Run identifier (see `fleetwave status`)
        run_id: String,
        #[arg(short, long, default_value = "fleetwave.toml")]
        plan: PathBuf,
    },
    /// Reverse every successful install of a run
    Rollback {
        run_id: String,
        /// Why the run is being reversed (stored in the snapshot)
        #[arg(short, long)]
        reason: String,
        #[arg(short, long, default_value = "fleetwave.toml")]
        plan: PathBuf,
    },
    /// Show one run as JSON, or list all runs
    Status {
        run_id: Option<String>,
        #[arg(short, long, default_value = "fleetwave.toml")]
        plan: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fleetwave_cli=info".parse()?)
                .add_directive("fleetwave_engine=info".parse()?)
                .add_directive("fleetwave_state=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy { plan } => commands::deploy(&plan),
        Commands::Resume { run_id, plan } => commands::resume(&run_id, &plan),
        Commands::Rollback {
            run_id,
            reason,
            plan,
        } => commands::rollback(&run_id, &reason, &plan),
        Commands::Status { run_id, plan } => commands::status(run_id.as_deref(), &plan),
    }
}
