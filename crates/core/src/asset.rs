// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catalog asset snapshot records
//!
//! One `AssetRecord` is the point-in-time state of a tracked catalog asset,
//! keyed by its globally unique identifier. Re-registering the same asset
//! overwrites the previous snapshot rather than duplicating it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Globally unique identifier for a catalog asset (store partition key)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        AssetId(s)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        AssetId(s.to_string())
    }
}

/// Point-in-time snapshot of one catalog asset's metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub asset_id: AssetId,
    pub asset_type: String,
    pub asset_name: String,
    pub external_identifier: Option<String>,
    pub created_at: DateTime<Utc>,
    pub first_revision_created_at: DateTime<Utc>,
}

impl AssetRecord {
    pub fn new(
        asset_id: impl Into<AssetId>,
        asset_type: impl Into<String>,
        asset_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            asset_type: asset_type.into(),
            asset_name: asset_name.into(),
            external_identifier: None,
            created_at,
            first_revision_created_at: created_at,
        }
    }

    pub fn with_external_identifier(mut self, id: impl Into<String>) -> Self {
        self.external_identifier = Some(id.into());
        self
    }
}
