// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow execution state machine
//!
//! One `Execution` is a single run of the backup workflow: it invokes the
//! registrar worker, applies the retry policy to service-level failures,
//! and routes everything else through the catch transition into the
//! failure state with the cause preserved under the dedicated error field.
//! Every execution reaches exactly one terminal state; an execution that
//! outlives its deadline is forced into a timeout failure regardless of
//! retry state.

use super::retry::Backoff;
use super::table::{ExecutionState, Outcome, TransitionTable};
use crate::clock::Clock;
use crate::config::RetryPolicy;
use crate::effect::{Effect, Event, TriggerPayload};
use crate::id::ExecutionId;
use crate::registrar::{RegistrarRequest, RegistrarResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Error-kind tag used for executions that exceed their deadline
pub const TIMEOUT_ERROR: &str = "Timeout";

/// Structured cause recorded when an execution fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
    /// Stable error-kind tag, e.g. "Unavailable" or "Timeout"
    pub error: String,
    /// Human-readable cause from the failing component
    pub cause: String,
}

/// Events that can change execution state
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    /// Begin the run: issue the first worker invocation
    Start,
    /// The registrar worker responded
    WorkerSucceeded { response: RegistrarResponse },
    /// The registrar worker failed
    WorkerFailed {
        kind: String,
        message: String,
        retryable: bool,
    },
    /// Evaluate the deadline (called periodically and before invocations)
    Tick,
}

/// One run of the backup workflow
#[derive(Debug, Clone)]
pub struct Execution {
    pub id: ExecutionId,
    /// The raw trigger input this run was started with
    pub input: TriggerPayload,
    pub started_at: DateTime<Utc>,
    pub deadline: Instant,
    pub state: ExecutionState,
    /// Worker invocation attempts made so far
    pub attempt: u32,
    /// Populated on failure; never discarded
    pub error: Option<FailureCause>,
    /// Populated on success
    pub response: Option<RegistrarResponse>,
    timeout: Duration,
    table: TransitionTable,
    backoff: Backoff,
}

impl Execution {
    pub fn new(
        id: ExecutionId,
        input: TriggerPayload,
        retry: RetryPolicy,
        timeout: Duration,
        table: TransitionTable,
        seed: u64,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id,
            input,
            started_at: clock.now_utc(),
            deadline: clock.now() + timeout,
            state: ExecutionState::Invoke,
            attempt: 0,
            error: None,
            response: None,
            timeout,
            table,
            backoff: Backoff::new(retry, seed),
        }
    }

    /// The worker invocation payload: the raw trigger input plus this
    /// execution's start time
    pub fn request(&self) -> RegistrarRequest {
        RegistrarRequest {
            input: serde_json::to_value(&self.input).unwrap_or(serde_json::Value::Null),
            timestamp: self.started_at,
        }
    }

    /// Pure transition function - returns new state and effects
    pub fn transition(&self, event: ExecutionEvent, clock: &impl Clock) -> (Execution, Vec<Effect>) {
        // The execution-level deadline overrides everything else
        if self.state == ExecutionState::Invoke && clock.now() >= self.deadline {
            return self.fail_with_timeout();
        }

        match (&self.state, event) {
            (ExecutionState::Invoke, ExecutionEvent::Start) if self.attempt == 0 => {
                let execution = Execution {
                    attempt: 1,
                    ..self.clone()
                };
                let request = self.request();
                let effects = vec![
                    Effect::Emit(Event::ExecutionStarted {
                        id: self.id.clone(),
                        timestamp: self.started_at,
                    }),
                    Effect::Emit(Event::WorkerInvoked {
                        id: self.id.clone(),
                        attempt: 1,
                        request: serde_json::to_value(&request)
                            .unwrap_or(serde_json::Value::Null),
                    }),
                    Effect::InvokeWorker {
                        id: self.id.clone(),
                        request,
                        attempt: 1,
                        delay: None,
                    },
                ];
                (execution, effects)
            }

            (ExecutionState::Invoke, ExecutionEvent::WorkerSucceeded { response }) => {
                let next = self
                    .table
                    .next(ExecutionState::Invoke, Outcome::Succeeded)
                    .unwrap_or(ExecutionState::Fail);
                let execution = Execution {
                    state: next,
                    response: Some(response.clone()),
                    ..self.clone()
                };
                let effects = vec![
                    Effect::Emit(Event::WorkerSucceeded {
                        id: self.id.clone(),
                        attempt: self.attempt,
                        response: serde_json::to_value(&response)
                            .unwrap_or(serde_json::Value::Null),
                    }),
                    Effect::Emit(Event::ExecutionSucceeded {
                        id: self.id.clone(),
                    }),
                ];
                (execution, effects)
            }

            (
                ExecutionState::Invoke,
                ExecutionEvent::WorkerFailed {
                    kind,
                    message,
                    retryable,
                },
            ) => {
                let budget_left = self.attempt < self.backoff.policy().max_attempts();
                let outcome = if retryable && budget_left {
                    Outcome::RetryableFailure
                } else {
                    Outcome::FatalFailure
                };
                let next = self
                    .table
                    .next(ExecutionState::Invoke, outcome)
                    .unwrap_or(ExecutionState::Fail);

                let failed_event = Event::WorkerFailed {
                    id: self.id.clone(),
                    attempt: self.attempt,
                    kind: kind.clone(),
                    message: message.clone(),
                };

                if next == ExecutionState::Invoke {
                    let mut execution = self.clone();
                    let delay = execution.backoff.delay(self.attempt);
                    execution.attempt = self.attempt + 1;
                    let effects = vec![
                        Effect::Emit(failed_event),
                        Effect::Emit(Event::WorkerRetryScheduled {
                            id: self.id.clone(),
                            attempt: execution.attempt,
                            delay_ms: delay.as_millis() as u64,
                        }),
                        Effect::InvokeWorker {
                            id: self.id.clone(),
                            request: self.request(),
                            attempt: execution.attempt,
                            delay: Some(delay),
                        },
                    ];
                    (execution, effects)
                } else {
                    let cause = FailureCause {
                        error: kind,
                        cause: message,
                    };
                    let execution = Execution {
                        state: ExecutionState::Fail,
                        error: Some(cause.clone()),
                        ..self.clone()
                    };
                    let effects = vec![
                        Effect::Emit(failed_event),
                        Effect::Emit(Event::ExecutionFailed {
                            id: self.id.clone(),
                            error: cause.error,
                            cause: cause.cause,
                        }),
                    ];
                    (execution, effects)
                }
            }

            // Deadline not reached; nothing to do
            (ExecutionState::Invoke, ExecutionEvent::Tick) => (self.clone(), vec![]),

            // Terminal states and invalid transitions are no-ops
            _ => (self.clone(), vec![]),
        }
    }

    fn fail_with_timeout(&self) -> (Execution, Vec<Effect>) {
        let next = self
            .table
            .next(ExecutionState::Invoke, Outcome::DeadlineExceeded)
            .unwrap_or(ExecutionState::Fail);
        let cause = FailureCause {
            error: TIMEOUT_ERROR.to_string(),
            cause: format!(
                "execution exceeded its {}s timeout",
                self.timeout.as_secs()
            ),
        };
        let execution = Execution {
            state: next,
            error: Some(cause.clone()),
            ..self.clone()
        };
        let effects = vec![Effect::Emit(Event::ExecutionFailed {
            id: self.id.clone(),
            error: cause.error,
            cause: cause.cause,
        })];
        (execution, effects)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_running(&self) -> bool {
        self.state == ExecutionState::Invoke
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
