// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline runtime
//!
//! Turns schedule ticks into executions: each tick produces one delivery,
//! the delivery machine decides whether a start request goes through, and
//! every accepted start spawns an independent tokio task. The runtime
//! neither serializes nor deduplicates overlapping executions; the store's
//! keyed upserts make that safe.

use crate::error::EngineError;
use crate::executor::EffectExecutor;
use crate::registrar::StoreRegistrar;
use crate::runner::ExecutionRunner;
use ferry_core::{
    CatalogSource, Clock, Delivery, DeliveryEvent, Effect, Event, Execution, ExecutionId, IdGen,
    PipelineConfig, RegistrarAdapter, SystemClock, Tick, TickSchedule, TransitionTable,
    TriggerPayload, UuidIdGen,
};
use ferry_keys::{KeyManager, KeyPolicy};
use ferry_store::{ReplicatedTable, TableSpec};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Principal name the storage service uses when checking key grants
pub const STORAGE_SERVICE_PRINCIPAL: &str = "storage.ferry.internal";

/// Coordinates the scheduler, orchestrator, and store
pub struct Runtime<R, C, I> {
    config: PipelineConfig,
    registrar: R,
    clock: C,
    id_gen: I,
    executor: EffectExecutor,
    table: Option<ReplicatedTable>,
}

impl<R, C, I> Runtime<R, C, I>
where
    R: RegistrarAdapter,
    C: Clock + 'static,
    I: IdGen,
{
    pub fn new(
        config: PipelineConfig,
        registrar: R,
        clock: C,
        id_gen: I,
        executor: EffectExecutor,
    ) -> Self {
        Self {
            config,
            registrar,
            clock,
            id_gen,
            executor,
            table: None,
        }
    }

    /// Attach the replicated table so the pipeline loop drives its
    /// cross-region propagation
    pub fn with_table(mut self, table: ReplicatedTable) -> Self {
        self.table = Some(table);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn executor(&self) -> &EffectExecutor {
        &self.executor
    }

    pub fn table(&self) -> Option<&ReplicatedTable> {
        self.table.as_ref()
    }

    /// Process one schedule tick: drive its delivery to a terminal state,
    /// spawning an execution task if the start request is accepted.
    ///
    /// Returns the terminal delivery and the handles of any executions it
    /// started; callers may await or detach them.
    pub async fn handle_tick(
        &self,
        tick: Tick,
    ) -> Result<(Delivery, Vec<JoinHandle<Result<Execution, EngineError>>>), EngineError> {
        self.executor.emit(
            Event::TickFired {
                sequence: tick.sequence,
                timestamp: tick.timestamp,
            },
            self.clock.now_utc(),
        )?;

        let payload = TriggerPayload::new(tick.timestamp, serde_json::json!({"source": "schedule"}));
        let mut delivery = Delivery::new(tick.sequence, payload, self.config.delivery.clone());
        let mut handles = Vec::new();

        while !delivery.is_terminal() {
            let (next, effects) = delivery.transition(DeliveryEvent::Attempt, &self.clock);
            delivery = next;

            let mut accepted = None;
            let mut backoff = None;
            for effect in effects {
                match effect {
                    Effect::Emit(event) => {
                        self.executor.emit(event, self.clock.now_utc())?;
                    }
                    Effect::StartExecution { payload } => {
                        let (id, handle) = self.start_execution(payload);
                        handles.push(handle);
                        accepted = Some(id);
                    }
                    Effect::SetTimer { duration, .. } => backoff = Some(duration),
                    Effect::InvokeWorker { .. } | Effect::CancelTimer { .. } => {}
                }
            }

            if let Some(execution_id) = accepted {
                let (next, effects) =
                    delivery.transition(DeliveryEvent::Accepted { execution_id }, &self.clock);
                delivery = next;
                for effect in effects {
                    if let Effect::Emit(event) = effect {
                        self.executor.emit(event, self.clock.now_utc())?;
                    }
                }
            }

            if let Some(duration) = backoff {
                tokio::time::sleep(duration).await;
            }
        }

        Ok((delivery, handles))
    }

    /// Start one execution immediately, outside the schedule, and wait
    /// for its terminal state
    pub async fn backup_once(&self, detail: serde_json::Value) -> Result<Execution, EngineError> {
        let payload = TriggerPayload::new(self.clock.now_utc(), detail);
        let (_, handle) = self.start_execution(payload);
        handle
            .await
            .map_err(|e| EngineError::TaskJoin(e.to_string()))?
    }

    /// The pipeline loop: poll the schedule, hand ticks to the delivery
    /// machine, and keep cross-region replication moving. Runs until the
    /// flag is cleared; in-flight executions are detached and finish on
    /// their own.
    pub async fn run(&self, running: Arc<AtomicBool>) -> Result<(), EngineError> {
        let mut schedule = TickSchedule::new(self.config.backup_interval, &self.clock);
        tracing::info!(
            interval_s = self.config.backup_interval.as_secs(),
            "pipeline loop started"
        );

        while running.load(Ordering::SeqCst) {
            for tick in schedule.poll(&self.clock) {
                let (delivery, handles) = self.handle_tick(tick).await?;
                tracing::debug!(
                    sequence = delivery.tick_sequence,
                    started = handles.len(),
                    "tick handled"
                );
                // Executions run as independent tasks; overlap with the
                // next tick is allowed.
                drop(handles);
            }

            if let Some(table) = &self.table {
                if let Err(e) = table.poll_replication(self.clock.now_utc()) {
                    tracing::warn!(error = %e, "replication degraded");
                }
            }

            let wait = schedule
                .until_next(self.clock.now())
                .min(Duration::from_millis(250));
            tokio::time::sleep(wait).await;
        }

        tracing::info!("pipeline loop stopped");
        Ok(())
    }

    fn start_execution(
        &self,
        payload: TriggerPayload,
    ) -> (ExecutionId, JoinHandle<Result<Execution, EngineError>>) {
        let id = self.id_gen.next();
        let execution = Execution::new(
            id.clone(),
            payload,
            self.config.retry.clone(),
            self.config.execution_timeout,
            TransitionTable::standard(),
            seed_for(&id),
            &self.clock,
        );
        let runner = ExecutionRunner::new(
            self.registrar.clone(),
            self.clock.clone(),
            self.executor.clone(),
        );
        let handle = tokio::spawn(async move { runner.run(execution).await });
        (id, handle)
    }
}

/// Per-execution backoff seed: stable for a given id, distinct across
/// concurrent executions so their retries decorrelate
fn seed_for(id: &ExecutionId) -> u64 {
    let mut hasher = DefaultHasher::new();
    id.0.hash(&mut hasher);
    hasher.finish()
}

/// Build a fully wired production runtime in dependency order: encryption
/// keys first, then the replication link, the table, the registrar, and
/// finally the runtime itself.
pub fn bootstrap<C>(
    config: PipelineConfig,
    catalog: C,
) -> Result<Runtime<StoreRegistrar<C, SystemClock>, SystemClock, UuidIdGen>, EngineError>
where
    C: CatalogSource,
{
    let clock = SystemClock;

    let keys = KeyManager::new(STORAGE_SERVICE_PRINCIPAL, &config.admin_principal);
    let policy = KeyPolicy::replica_default(STORAGE_SERVICE_PRINCIPAL, &config.admin_principal);
    let primary_key = keys.create_primary(&config.primary_region, policy.clone(), true);
    let replica_key = keys.replicate(&primary_key, &config.secondary_region, policy)?;

    let spec = TableSpec::new(config.table_name());
    let primary = spec.replica(&config.primary_region, primary_key);
    let secondary = spec.replica(&config.secondary_region, replica_key);
    let table = ReplicatedTable::new(spec, keys, primary, secondary);

    let data_dir = config
        .data_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("ferry"));
    std::fs::create_dir_all(&data_dir)?;
    table.attach_durable_stream(&data_dir.join("stream.jsonl"))?;
    let executor = EffectExecutor::open(data_dir.join("history.jsonl"))?;

    let registrar = StoreRegistrar::new(
        catalog,
        table.clone(),
        clock.clone(),
        &config.domain_id,
        &config.project_id,
    );

    Ok(Runtime::new(config, registrar, clock, UuidIdGen, executor).with_table(table))
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
