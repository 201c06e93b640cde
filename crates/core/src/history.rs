// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution history log
//!
//! Durable, append-only audit trail of every state transition and worker
//! payload, so a single run can be reconstructed end-to-end after the
//! fact. Records are newline-delimited JSON.

use crate::effect::Event;
use crate::id::ExecutionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

/// A logged event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Monotonic sequence number
    pub sequence: u64,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    /// The event name
    pub name: String,
    /// The full event data
    pub event: Event,
}

/// Append-only execution history
pub struct ExecutionHistory {
    path: PathBuf,
    sequence: u64,
}

impl ExecutionHistory {
    /// Open or create a history log at the given path
    pub fn open(path: PathBuf) -> std::io::Result<Self> {
        // Count existing entries to set sequence
        let sequence = if path.exists() {
            let file = File::open(&path)?;
            BufReader::new(file).lines().count() as u64
        } else {
            0
        };

        Ok(Self { path, sequence })
    }

    /// Append an event to the log
    pub fn append(&mut self, event: Event, now: DateTime<Utc>) -> std::io::Result<HistoryRecord> {
        self.sequence += 1;

        let record = HistoryRecord {
            sequence: self.sequence,
            timestamp_ms: now.timestamp_millis(),
            name: event.name(),
            event,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(&record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(file, "{}", json)?;

        Ok(record)
    }

    /// Read all records from the log
    pub fn read_all(&self) -> std::io::Result<Vec<HistoryRecord>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let record: HistoryRecord = serde_json::from_str(&line)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            records.push(record);
        }

        Ok(records)
    }

    /// All records belonging to one execution, in order
    pub fn for_execution(&self, id: &ExecutionId) -> std::io::Result<Vec<HistoryRecord>> {
        let all = self.read_all()?;
        Ok(all
            .into_iter()
            .filter(|r| r.event.execution_id() == Some(id))
            .collect())
    }

    /// Records with the given event name
    pub fn named(&self, name: &str) -> std::io::Result<Vec<HistoryRecord>> {
        let all = self.read_all()?;
        Ok(all.into_iter().filter(|r| r.name == name).collect())
    }

    /// Get current sequence number
    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
