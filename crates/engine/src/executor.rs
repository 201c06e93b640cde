// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect emission
//!
//! Every event a state machine emits goes two places: the tracing
//! subscriber at full detail, and the durable execution history. A run
//! can be reconstructed end-to-end from either.

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use ferry_core::{Event, ExecutionHistory, HistoryRecord};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Shared handle that records emitted events
#[derive(Clone)]
pub struct EffectExecutor {
    history: Arc<Mutex<ExecutionHistory>>,
}

impl EffectExecutor {
    pub fn new(history: ExecutionHistory) -> Self {
        Self {
            history: Arc::new(Mutex::new(history)),
        }
    }

    /// Open or create the history log at the given path
    pub fn open(path: PathBuf) -> Result<Self, EngineError> {
        Ok(Self::new(ExecutionHistory::open(path)?))
    }

    /// Log an event and append it to the history
    pub fn emit(&self, event: Event, now: DateTime<Utc>) -> Result<HistoryRecord, EngineError> {
        let payload = serde_json::to_value(&event).unwrap_or(serde_json::Value::Null);
        tracing::info!(event = %event.name(), %payload, "event");

        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        Ok(history.append(event, now)?)
    }

    /// Shared access to the underlying history log
    pub fn history(&self) -> Arc<Mutex<ExecutionHistory>> {
        self.history.clone()
    }

    /// All records currently in the history
    pub fn records(&self) -> Result<Vec<HistoryRecord>, EngineError> {
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        Ok(history.read_all()?)
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
