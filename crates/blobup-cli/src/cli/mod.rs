//! CLI for the blobup batch upload manager.

mod commands;

use anyhow::Result;
use blobup_core::strategy::StrategyKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_start, run_status, run_upload};

/// Top-level CLI for the blobup batch upload manager.
#[derive(Debug, Parser)]
#[command(name = "blobup")]
#[command(about = "blobup: batch blob upload manager", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Start the scheduler and process queued jobs until interrupted.
    Start {
        /// Path to the config file (default: ~/.config/blobup/config.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Account-selection strategy: round-robin, least-loaded,
        /// token-aware or weighted.
        #[arg(short, long, default_value_t = StrategyKind::RoundRobin)]
        strategy: StrategyKind,
    },

    /// Requeue jobs stranded in PROCESSING by a crash, then start the
    /// scheduler. Only safe when no other blobup instance is running.
    Resume {
        /// Path to the config file (default: ~/.config/blobup/config.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Account-selection strategy.
        #[arg(short, long, default_value_t = StrategyKind::RoundRobin)]
        strategy: StrategyKind,
    },

    /// Show job queue status.
    Status,

    /// Queue files for upload and process the backlog until it drains.
    Upload {
        /// Files to upload.
        #[arg(required = true)]
        files: Vec<String>,

        /// Path to the config file (default: ~/.config/blobup/config.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Account-selection strategy.
        #[arg(short, long, default_value_t = StrategyKind::RoundRobin)]
        strategy: StrategyKind,

        /// Only queue the files; process them later with `start` or `resume`.
        #[arg(long)]
        no_start: bool,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        match cli.command {
            CliCommand::Start { config, strategy } => {
                run_start(config.as_deref(), strategy, false).await
            }
            CliCommand::Resume { config, strategy } => {
                run_start(config.as_deref(), strategy, true).await
            }
            CliCommand::Status => run_status().await,
            CliCommand::Upload {
                files,
                config,
                strategy,
                no_start,
            } => run_upload(&files, config.as_deref(), strategy, no_start).await,
        }
    }
}

#[cfg(test)]
mod tests;
