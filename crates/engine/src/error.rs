// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine runtime

use thiserror::Error;

/// Errors that can occur in the runtime
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("history error: {0}")]
    History(#[from] std::io::Error),
    #[error("store error: {0}")]
    Store(#[from] ferry_store::StoreError),
    #[error("key error: {0}")]
    Key(#[from] ferry_keys::KeyError),
    #[error("execution task failed: {0}")]
    TaskJoin(String),
}
