//! Relay CLI - Main entry point

mod stress;

use clap::{Parser, Subcommand};
use relay_foundation::RelayConfig;
use std::path::PathBuf;
use stress::StressOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Relay - exercise a snapshot listener registry under concurrent load
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Churn registrations while dispatching and verify snapshot consistency
    Stress {
        /// Number of writer tasks
        #[arg(long, default_value = "4")]
        writers: usize,

        /// Number of dispatching reader tasks
        #[arg(long, default_value = "4")]
        readers: usize,

        /// Size of the listener pool
        #[arg(long, default_value = "32")]
        listeners: usize,

        /// Number of listeners in the pool that always fail
        #[arg(long, default_value = "0")]
        failing: usize,

        /// Operations per task
        #[arg(long, default_value = "10000")]
        rounds: u64,

        /// Random seed for writers
        #[arg(long, default_value = "7")]
        seed: u64,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config = match &args.config {
        Some(path) => RelayConfig::load_or_default(path)?,
        None => RelayConfig::default(),
    };

    match args.command {
        Command::Stress {
            writers,
            readers,
            listeners,
            failing,
            rounds,
            seed,
        } => {
            let options = StressOptions {
                writers,
                readers,
                listeners,
                failing,
                rounds,
                seed,
            };
            let summary = stress::run(config, options).await?;
            summary.print();
            anyhow::ensure!(
                summary.is_consistent(),
                "{} inconsistent snapshots observed",
                summary.violations
            );
        }
        Command::Config => {
            println!("{}", config.to_json_string()?);
        }
    }

    Ok(())
}
