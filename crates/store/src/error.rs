// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the replicated state store

use ferry_keys::KeyError;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("encryption unavailable: {0}")]
    Encryption(#[from] KeyError),
    #[error("point-in-time recovery is not enabled on replica {0}")]
    RecoveryDisabled(String),
    #[error("restore point is outside replica {0}'s retention window")]
    OutOfRetention(String),
    #[error("no replica in region {0}")]
    UnknownRegion(String),
    #[error("change record {sequence} failed checksum verification")]
    ChecksumMismatch { sequence: u64 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
