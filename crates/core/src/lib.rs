// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ferry-core: Core library for the ferry backup pipeline
//!
//! This crate provides:
//! - Pure state machines for start-request delivery and workflow executions
//! - The typed transition table encoding retry/catch policy
//! - The registrar worker contract and test doubles
//! - Pipeline configuration and the execution history log

pub mod clock;
pub mod id;

pub mod config;
pub mod history;
pub mod registrar;

// State machines
pub mod asset;
pub mod effect;
pub mod execution;
pub mod schedule;

// Re-exports
pub use asset::{AssetId, AssetRecord};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, DeliveryPolicy, PipelineConfig, RetryPolicy};
pub use effect::{DropReason, Effect, Event, TriggerPayload};
pub use execution::{
    Backoff, Execution, ExecutionEvent, ExecutionState, FailureCause, Outcome, TransitionRule,
    TransitionTable, TIMEOUT_ERROR,
};
pub use history::{ExecutionHistory, HistoryRecord};
pub use id::{ExecutionId, IdGen, SequentialIdGen, UuidIdGen};
pub use registrar::{
    AssetPage, CatalogError, CatalogSource, FakeCatalog, FakeRegistrar, RegistrarAdapter,
    RegistrarError, RegistrarRequest, RegistrarResponse,
};
pub use schedule::{Delivery, DeliveryEvent, DeliveryState, Tick, TickSchedule};
