// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run the scheduled backup pipeline until interrupted

use crate::adapters::{load_config, FileCatalog};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(clap::Args)]
pub struct RunArgs {
    /// JSON file holding the catalog asset snapshots to enumerate
    #[arg(long, default_value = "assets.json")]
    assets: PathBuf,
}

pub async fn handle(args: RunArgs, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let runtime = ferry_engine::bootstrap(config, FileCatalog::new(&args.assets))?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nShutting down pipeline...");
        r.store(false, Ordering::SeqCst);
    })?;

    let config = runtime.config();
    println!("Starting ferry pipeline");
    println!("  Interval: {}m", config.backup_interval.as_secs() / 60);
    println!(
        "  Regions: {} -> {}",
        config.primary_region, config.secondary_region
    );
    println!("  Table: {}", config.table_name());
    println!();

    runtime.run(running).await?;
    Ok(())
}
