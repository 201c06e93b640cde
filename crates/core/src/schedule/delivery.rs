// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery state machine for scheduler start requests
//!
//! Each tick produces at most one delivery. Delivery retries are bounded
//! and independent of the orchestrator's task-level retries; an event that
//! ages past the staleness window is discarded rather than executed late,
//! so backup runs do not cluster after an outage. A dropped delivery never
//! blocks subsequent ticks.

use crate::clock::Clock;
use crate::config::DeliveryPolicy;
use crate::effect::{DropReason, Effect, Event, TriggerPayload};
use crate::id::ExecutionId;

/// The current state of a delivery
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryState {
    /// Start request not yet acknowledged
    Pending,
    /// An execution was started for this trigger
    Delivered { execution_id: ExecutionId },
    /// The trigger was discarded without starting an execution
    Dropped { reason: DropReason },
}

/// Events that can change delivery state
#[derive(Debug, Clone)]
pub enum DeliveryEvent {
    /// Try to submit the start request now
    Attempt,
    /// The orchestrator accepted the start request
    Accepted { execution_id: ExecutionId },
    /// The start request could not be delivered
    Rejected { error: String },
}

/// One scheduler-to-orchestrator start request with bounded retries
#[derive(Debug, Clone)]
pub struct Delivery {
    pub tick_sequence: u64,
    pub payload: TriggerPayload,
    pub policy: DeliveryPolicy,
    pub state: DeliveryState,
    /// Attempts made so far
    pub attempts: u32,
}

impl Delivery {
    pub fn new(tick_sequence: u64, payload: TriggerPayload, policy: DeliveryPolicy) -> Self {
        Self {
            tick_sequence,
            payload,
            policy,
            state: DeliveryState::Pending,
            attempts: 0,
        }
    }

    /// Timer ID used for redelivery backoff
    pub fn timer_id(&self) -> String {
        format!("delivery:{}", self.tick_sequence)
    }

    /// Pure transition function - returns new state and effects
    pub fn transition(&self, event: DeliveryEvent, clock: &impl Clock) -> (Delivery, Vec<Effect>) {
        match (&self.state, event) {
            (DeliveryState::Pending, DeliveryEvent::Attempt) => {
                let age = (clock.now_utc() - self.payload.timestamp)
                    .to_std()
                    .unwrap_or_default();

                if age > self.policy.max_event_age {
                    let delivery = Delivery {
                        state: DeliveryState::Dropped {
                            reason: DropReason::Stale,
                        },
                        ..self.clone()
                    };
                    let effects = vec![Effect::Emit(Event::DeliveryDropped {
                        sequence: self.tick_sequence,
                        reason: DropReason::Stale,
                        age_ms: age.as_millis() as u64,
                    })];
                    return (delivery, effects);
                }

                let attempt = self.attempts + 1;
                let delivery = Delivery {
                    attempts: attempt,
                    ..self.clone()
                };
                let effects = vec![
                    Effect::Emit(Event::DeliveryAttempted {
                        sequence: self.tick_sequence,
                        attempt,
                    }),
                    Effect::StartExecution {
                        payload: self.payload.clone(),
                    },
                ];
                (delivery, effects)
            }

            (DeliveryState::Pending, DeliveryEvent::Accepted { execution_id }) => {
                let delivery = Delivery {
                    state: DeliveryState::Delivered { execution_id },
                    ..self.clone()
                };
                (delivery, vec![])
            }

            (DeliveryState::Pending, DeliveryEvent::Rejected { error }) => {
                if self.attempts >= self.policy.max_attempts {
                    let age = (clock.now_utc() - self.payload.timestamp)
                        .to_std()
                        .unwrap_or_default();
                    let delivery = Delivery {
                        state: DeliveryState::Dropped {
                            reason: DropReason::AttemptsExhausted,
                        },
                        ..self.clone()
                    };
                    let effects = vec![Effect::Emit(Event::DeliveryDropped {
                        sequence: self.tick_sequence,
                        reason: DropReason::AttemptsExhausted,
                        age_ms: age.as_millis() as u64,
                    })];
                    return (delivery, effects);
                }

                tracing::debug!(
                    sequence = self.tick_sequence,
                    attempt = self.attempts,
                    %error,
                    "start request rejected, scheduling redelivery"
                );
                let delay = self.policy.redelivery_delay(self.attempts);
                let effects = vec![
                    Effect::Emit(Event::DeliveryRetryScheduled {
                        sequence: self.tick_sequence,
                        attempt: self.attempts,
                        delay_ms: delay.as_millis() as u64,
                    }),
                    Effect::SetTimer {
                        id: self.timer_id(),
                        duration: delay,
                    },
                ];
                (self.clone(), effects)
            }

            // Invalid transitions are no-ops
            _ => (self.clone(), vec![]),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            DeliveryState::Delivered { .. } | DeliveryState::Dropped { .. }
        )
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self.state, DeliveryState::Dropped { .. })
    }
}

#[cfg(test)]
#[path = "delivery_tests.rs"]
mod tests;
