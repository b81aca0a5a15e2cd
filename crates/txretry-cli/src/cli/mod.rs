//! CLI for the txretry transaction retry engine.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use txretry_core::config;

use commands::{run_config, run_simulate};

/// Top-level CLI for the txretry engine.
#[derive(Debug, Parser)]
#[command(name = "txretry")]
#[command(about = "txretry: retry serializable transactions under contention", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run contended transfers through the retry engine and report on it.
    Simulate {
        /// Concurrent worker threads (default from config).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,

        /// Accounts in the simulated store; fewer means more conflicts.
        #[arg(long, value_name = "N")]
        accounts: Option<usize>,

        /// Transfers each worker performs.
        #[arg(long, value_name = "N")]
        transfers: Option<usize>,

        /// Retries allowed after the first attempt.
        #[arg(long, value_name = "N")]
        retry_attempts: Option<u32>,

        /// Backoff ceiling in milliseconds.
        #[arg(long, value_name = "MS")]
        max_backoff_ms: Option<u64>,
    },

    /// Show the resolved configuration and where it lives.
    Config,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Simulate {
                workers,
                accounts,
                transfers,
                retry_attempts,
                max_backoff_ms,
            } => run_simulate(
                &cfg,
                workers,
                accounts,
                transfers,
                retry_attempts,
                max_backoff_ms,
            )?,
            CliCommand::Config => run_config(&cfg)?,
        }
        Ok(())
    }
}
