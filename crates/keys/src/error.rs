// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for key replication

use crate::manager::KeyId;
use thiserror::Error;

/// Errors from key management operations
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key not found: {0}")]
    NotFound(KeyId),
    #[error("key is not multi-region capable: {0}")]
    NotMultiRegion(KeyId),
    #[error("key is not a primary key: {0}")]
    NotAPrimary(KeyId),
    #[error("key is pending deletion: {0}")]
    PendingDeletion(KeyId),
    #[error("replica of {primary} already exists in region {region}")]
    ReplicaExists { primary: KeyId, region: String },
    #[error("replica {replica} is broken: primary {primary} is gone")]
    ReplicaBroken { replica: KeyId, primary: KeyId },
    #[error("rotation is not enabled on key {0}")]
    RotationDisabled(KeyId),
    #[error("replica key policy must grant {principal} {action}")]
    PolicyMissingGrant { principal: String, action: String },
    #[error("key {key} denies {principal} {action}")]
    AccessDenied {
        key: KeyId,
        principal: String,
        action: String,
    },
}
