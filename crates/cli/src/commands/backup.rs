// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fire one backup execution immediately

use crate::adapters::{load_config, FileCatalog};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use ferry_core::{Clock, Execution, ExecutionState, SystemClock};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(clap::Args)]
pub struct BackupArgs {
    /// JSON file holding the catalog asset snapshots to enumerate
    #[arg(long, default_value = "assets.json")]
    assets: PathBuf,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Serialize)]
struct BackupSummary {
    execution: String,
    state: String,
    assets_written: Option<usize>,
    error: Option<String>,
    cause: Option<String>,
}

impl BackupSummary {
    fn from_execution(execution: &Execution) -> Self {
        Self {
            execution: execution.id.to_string(),
            state: execution.state.to_string(),
            assets_written: execution.response.as_ref().map(|r| r.assets_written),
            error: execution.error.as_ref().map(|e| e.error.clone()),
            cause: execution.error.as_ref().map(|e| e.cause.clone()),
        }
    }
}

impl fmt::Display for BackupSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Execution: {}", self.execution)?;
        write!(f, "State: {}", self.state)?;
        if let Some(count) = self.assets_written {
            write!(f, "\nAssets written: {}", count)?;
        }
        if let (Some(error), Some(cause)) = (&self.error, &self.cause) {
            write!(f, "\nError: {} ({})", error, cause)?;
        }
        Ok(())
    }
}

pub async fn handle(args: BackupArgs, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let runtime = ferry_engine::bootstrap(config, FileCatalog::new(&args.assets))?;

    let execution = runtime
        .backup_once(serde_json::json!({"source": "cli"}))
        .await?;

    // Flush pending cross-region propagation before reporting
    if let Some(table) = runtime.table() {
        tokio::time::sleep(table.spec().replication_lag).await;
        table.poll_replication(SystemClock.now_utc())?;
    }

    let summary = BackupSummary::from_execution(&execution);
    output::print(&summary, args.format);

    if execution.state == ExecutionState::Fail {
        std::process::exit(1);
    }
    Ok(())
}
