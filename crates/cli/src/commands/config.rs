// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration management

use crate::adapters::load_config;
use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::Path;

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Check the configuration file for errors
    Validate,
    /// Print the effective configuration
    Show {
        #[arg(long)]
        json: bool,
    },
}

pub fn handle(args: ConfigArgs, config_path: &Path) -> Result<()> {
    match args.command {
        ConfigCommand::Validate => {
            // Loading already validates
            load_config(config_path)?;
            println!("{} is valid", config_path.display());
        }
        ConfigCommand::Show { json } => {
            let config = load_config(config_path)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&config).context("serializing configuration")?
                );
            } else {
                print!(
                    "{}",
                    toml::to_string_pretty(&config).context("serializing configuration")?
                );
            }
        }
    }
    Ok(())
}
