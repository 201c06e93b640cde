// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ferry - cross-region catalog backup pipeline CLI

mod adapters;
mod commands;
mod completions;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{backup, config, history, run};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ferry",
    version,
    about = "Cross-region disaster-recovery backups for a data catalog"
)]
struct Cli {
    /// Path to the pipeline configuration file
    #[arg(long, global = true, default_value = "ferry.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduled backup pipeline
    Run(run::RunArgs),
    /// Fire one backup execution immediately
    Backup(backup::BackupArgs),
    /// Inspect the execution history
    History(history::HistoryArgs),
    /// Configuration management
    Config(config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run::handle(args, &cli.config).await,
        Commands::Backup(args) => backup::handle(args, &cli.config).await,
        Commands::History(args) => history::handle(args, &cli.config),
        Commands::Config(args) => config::handle(args, &cli.config),
        Commands::Completions(args) => {
            completions::generate_completions::<Cli>(args.shell);
            Ok(())
        }
    }
}
