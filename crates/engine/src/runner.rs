// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives one execution to a terminal state
//!
//! The runner interprets the execution state machine's effects: emitted
//! events go to the history, worker invocations go to the registrar
//! adapter (after any jittered retry delay), and the resulting outcome is
//! fed back as the next transition. Two timeout layers apply: the state
//! machine checks its deadline on every transition, and the runner wraps
//! the whole drive in a wall-clock guard so a worker future that never
//! resolves still ends in an explicit timeout failure.

use crate::error::EngineError;
use crate::executor::EffectExecutor;
use ferry_core::{Clock, Effect, Execution, ExecutionEvent, RegistrarAdapter};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Runs executions against a registrar adapter
#[derive(Clone)]
pub struct ExecutionRunner<R, C> {
    registrar: R,
    clock: C,
    executor: EffectExecutor,
}

impl<R, C> ExecutionRunner<R, C>
where
    R: RegistrarAdapter,
    C: Clock + 'static,
{
    pub fn new(registrar: R, clock: C, executor: EffectExecutor) -> Self {
        Self {
            registrar,
            clock,
            executor,
        }
    }

    /// Drive the execution until it reaches `Succeed` or `Fail`
    pub async fn run(&self, execution: Execution) -> Result<Execution, EngineError> {
        let guard = execution.timeout();
        let cell = Arc::new(Mutex::new(execution));

        match tokio::time::timeout(guard, self.drive(cell.clone())).await {
            Ok(result) => result?,
            Err(_elapsed) => {
                tracing::warn!(
                    id = %lock(&cell).id,
                    timeout_s = guard.as_secs(),
                    "wall-clock guard elapsed, forcing timeout"
                );
                let effects = {
                    let mut execution = lock(&cell);
                    let (next, effects) = execution.transition(ExecutionEvent::Tick, &self.clock);
                    *execution = next;
                    effects
                };
                for effect in effects {
                    if let Effect::Emit(event) = effect {
                        self.executor.emit(event, self.clock.now_utc())?;
                    }
                }
            }
        }

        let terminal = lock(&cell).clone();
        Ok(terminal)
    }

    async fn drive(&self, cell: Arc<Mutex<Execution>>) -> Result<(), EngineError> {
        let mut queue: VecDeque<Effect> = {
            let mut execution = lock(&cell);
            let (next, effects) = execution.transition(ExecutionEvent::Start, &self.clock);
            *execution = next;
            effects.into()
        };

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Emit(event) => {
                    self.executor.emit(event, self.clock.now_utc())?;
                }
                Effect::InvokeWorker {
                    id,
                    request,
                    attempt,
                    delay,
                } => {
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    tracing::info!(execution = %id, attempt, "invoking registrar worker");

                    let event = match self.registrar.invoke(request).await {
                        Ok(response) => ExecutionEvent::WorkerSucceeded { response },
                        Err(e) => ExecutionEvent::WorkerFailed {
                            kind: e.kind().to_string(),
                            message: e.to_string(),
                            retryable: e.is_retryable(),
                        },
                    };

                    let effects = {
                        let mut execution = lock(&cell);
                        let (next, effects) = execution.transition(event, &self.clock);
                        *execution = next;
                        effects
                    };
                    queue.extend(effects);
                }
                // Delivery-level effects do not occur inside an execution
                Effect::StartExecution { .. }
                | Effect::SetTimer { .. }
                | Effect::CancelTimer { .. } => {}
            }
        }
        Ok(())
    }
}

fn lock(cell: &Arc<Mutex<Execution>>) -> MutexGuard<'_, Execution> {
    cell.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
