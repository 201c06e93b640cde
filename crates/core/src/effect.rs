// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects and events for state machine orchestration

use crate::id::ExecutionId;
use crate::registrar::RegistrarRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The event payload constructed by the scheduler on every tick
///
/// Mirrors the start-request wire shape `{ timestamp, detail }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerPayload {
    pub timestamp: DateTime<Utc>,
    pub detail: serde_json::Value,
}

impl TriggerPayload {
    pub fn new(timestamp: DateTime<Utc>, detail: serde_json::Value) -> Self {
        Self { timestamp, detail }
    }
}

/// Why a scheduler delivery was dropped without starting an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    /// The trigger event aged past the staleness bound before delivery
    Stale,
    /// Every delivery attempt failed
    AttemptsExhausted,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Stale => write!(f, "stale"),
            DropReason::AttemptsExhausted => write!(f, "attempts-exhausted"),
        }
    }
}

/// Effects are side effects that state machines request
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Emit an event for the history log and observers
    Emit(Event),
    /// Submit a start request to the workflow orchestrator
    StartExecution { payload: TriggerPayload },
    /// Invoke the registrar worker, optionally after a delay
    InvokeWorker {
        id: ExecutionId,
        request: RegistrarRequest,
        attempt: u32,
        delay: Option<Duration>,
    },
    /// Set a timer (redelivery backoff)
    SetTimer { id: String, duration: Duration },
    /// Cancel a timer
    CancelTimer { id: String },
}

/// Events emitted by state machines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Schedule events
    TickFired {
        sequence: u64,
        timestamp: DateTime<Utc>,
    },
    DeliveryAttempted {
        sequence: u64,
        attempt: u32,
    },
    DeliveryRetryScheduled {
        sequence: u64,
        attempt: u32,
        delay_ms: u64,
    },
    DeliveryDropped {
        sequence: u64,
        reason: DropReason,
        age_ms: u64,
    },

    // Execution events
    ExecutionStarted {
        id: ExecutionId,
        timestamp: DateTime<Utc>,
    },
    WorkerInvoked {
        id: ExecutionId,
        attempt: u32,
        request: serde_json::Value,
    },
    WorkerSucceeded {
        id: ExecutionId,
        attempt: u32,
        response: serde_json::Value,
    },
    WorkerFailed {
        id: ExecutionId,
        attempt: u32,
        kind: String,
        message: String,
    },
    WorkerRetryScheduled {
        id: ExecutionId,
        attempt: u32,
        delay_ms: u64,
    },
    ExecutionSucceeded {
        id: ExecutionId,
    },
    ExecutionFailed {
        id: ExecutionId,
        error: String,
        cause: String,
    },
}

impl Event {
    /// Get the event name for pattern matching
    /// Format: "category:action"
    pub fn name(&self) -> String {
        match self {
            Event::TickFired { .. } => "tick:fired".to_string(),
            Event::DeliveryAttempted { .. } => "delivery:attempted".to_string(),
            Event::DeliveryRetryScheduled { .. } => "delivery:retry".to_string(),
            Event::DeliveryDropped { .. } => "delivery:dropped".to_string(),
            Event::ExecutionStarted { .. } => "execution:started".to_string(),
            Event::WorkerInvoked { .. } => "worker:invoked".to_string(),
            Event::WorkerSucceeded { .. } => "worker:succeeded".to_string(),
            Event::WorkerFailed { .. } => "worker:failed".to_string(),
            Event::WorkerRetryScheduled { .. } => "worker:retry".to_string(),
            Event::ExecutionSucceeded { .. } => "execution:succeeded".to_string(),
            Event::ExecutionFailed { .. } => "execution:failed".to_string(),
        }
    }

    /// The execution this event belongs to, if any
    pub fn execution_id(&self) -> Option<&ExecutionId> {
        match self {
            Event::ExecutionStarted { id, .. }
            | Event::WorkerInvoked { id, .. }
            | Event::WorkerSucceeded { id, .. }
            | Event::WorkerFailed { id, .. }
            | Event::WorkerRetryScheduled { id, .. }
            | Event::ExecutionSucceeded { id }
            | Event::ExecutionFailed { id, .. } => Some(id),
            _ => None,
        }
    }
}
