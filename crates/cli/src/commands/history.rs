// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inspect the execution history log

use crate::adapters::load_config;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use chrono::DateTime;
use ferry_core::{ExecutionHistory, HistoryRecord};
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(clap::Args)]
pub struct HistoryArgs {
    /// Only records belonging to this execution id
    #[arg(long)]
    execution: Option<String>,

    /// Only records with this event name (e.g. "execution:failed")
    #[arg(long)]
    name: Option<String>,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Serialize)]
#[serde(transparent)]
struct HistoryLine(HistoryRecord);

impl fmt::Display for HistoryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timestamp = DateTime::from_timestamp_millis(self.0.timestamp_ms)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| self.0.timestamp_ms.to_string());
        let payload = serde_json::to_string(&self.0.event).unwrap_or_default();
        write!(
            f,
            "{:<6} {:<32} {:<22} {}",
            self.0.sequence, timestamp, self.0.name, payload
        )
    }
}

pub fn handle(args: HistoryArgs, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let data_dir = config
        .data_dir
        .context("no data directory configured; set data_dir in the config file")?;

    let history = ExecutionHistory::open(data_dir.join("history.jsonl"))?;
    let records = match &args.execution {
        Some(id) => history.for_execution(&id.as_str().into())?,
        None => history.read_all()?,
    };
    let records: Vec<HistoryLine> = records
        .into_iter()
        .filter(|r| args.name.as_ref().map_or(true, |name| &r.name == name))
        .map(HistoryLine)
        .collect();

    if records.is_empty() {
        if matches!(args.format, OutputFormat::Text) {
            println!("No history records");
        } else {
            println!("[]");
        }
        return Ok(());
    }

    output::print_list(&records, args.format);
    Ok(())
}
