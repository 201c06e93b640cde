// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change stream with old/new item images
//!
//! Every successful write is captured as a change record carrying both the
//! previous and the new image of the item, checksummed for integrity. The
//! stream is the source for cross-region propagation and for point-in-time
//! recovery within a replica's retention window.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use ferry_core::{AssetId, AssetRecord};
use serde::{Deserialize, Serialize};

/// One captured write, with both item images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Monotonically increasing per-stream sequence number
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub asset_id: AssetId,
    /// Item state before the write (`None` for inserts)
    pub old_image: Option<AssetRecord>,
    /// Item state after the write (`None` for deletes)
    pub new_image: Option<AssetRecord>,
    /// CRC32 checksum of the images
    pub checksum: u32,
}

impl ChangeRecord {
    pub fn new(
        sequence: u64,
        timestamp: DateTime<Utc>,
        asset_id: AssetId,
        old_image: Option<AssetRecord>,
        new_image: Option<AssetRecord>,
    ) -> Self {
        let checksum = Self::calculate_checksum(&asset_id, &old_image, &new_image);
        Self {
            sequence,
            timestamp,
            asset_id,
            old_image,
            new_image,
            checksum,
        }
    }

    fn calculate_checksum(
        asset_id: &AssetId,
        old_image: &Option<AssetRecord>,
        new_image: &Option<AssetRecord>,
    ) -> u32 {
        // Unwrap safety: these types only contain strings and timestamps,
        // which always serialize
        let json = serde_json::to_string(&(asset_id, old_image, new_image))
            .unwrap_or_else(|_| String::new());
        crc32fast::hash(json.as_bytes())
    }

    /// Verify the checksum matches the images
    pub fn verify(&self) -> bool {
        self.checksum == Self::calculate_checksum(&self.asset_id, &self.old_image, &self.new_image)
    }

    /// Serialize to newline-delimited JSON (one line)
    pub fn to_line(&self) -> Result<String, StoreError> {
        serde_json::to_string(self).map_err(StoreError::from)
    }

    /// Parse from a single line of JSON
    pub fn from_line(line: &str) -> Result<Self, StoreError> {
        serde_json::from_str(line).map_err(StoreError::from)
    }
}

/// In-order change records for one regional replica
#[derive(Debug, Clone, Default)]
pub struct ChangeStream {
    records: Vec<ChangeRecord>,
    next_sequence: u64,
}

impl ChangeStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture a write
    pub fn append(
        &mut self,
        asset_id: AssetId,
        old_image: Option<AssetRecord>,
        new_image: Option<AssetRecord>,
        timestamp: DateTime<Utc>,
    ) -> ChangeRecord {
        self.next_sequence += 1;
        let record = ChangeRecord::new(self.next_sequence, timestamp, asset_id, old_image, new_image);
        self.records.push(record.clone());
        record
    }

    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    /// Records strictly after the given sequence number
    pub fn after(&self, sequence: u64) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter().filter(move |r| r.sequence > sequence)
    }

    pub fn latest_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Drop records older than the retention cutoff, returning how many
    /// were removed
    pub fn trim_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.timestamp >= cutoff);
        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
