// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One regional copy of the asset table
//!
//! A replica holds the materialized record map, its own change stream,
//! and the encryption key protecting data at rest in its region. The
//! primary replica accepts writes directly; the secondary applies change
//! records propagated from the primary, last-writer-wins by the
//! originating stream sequence. Point-in-time recovery replays the
//! replica's own stream and works independently of cross-region
//! replication.

use crate::error::StoreError;
use crate::stream::{ChangeRecord, ChangeStream};
use chrono::{DateTime, Utc};
use ferry_core::{AssetId, AssetRecord};
use ferry_keys::KeyId;
use std::collections::HashMap;
use std::time::Duration;

/// How much of each write the change stream captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamView {
    /// Both the previous and the new item image
    #[default]
    NewAndOldImages,
    /// Only the new item image
    NewImageOnly,
}

#[derive(Debug, Clone)]
struct Applied {
    /// Sequence of the originating primary-stream record, the
    /// last-writer-wins authority
    origin: u64,
    record: AssetRecord,
}

/// A regional copy of the table: records, stream, and encryption key
#[derive(Debug)]
pub struct RegionReplica {
    region: String,
    key: KeyId,
    view: StreamView,
    records: HashMap<AssetId, Applied>,
    stream: ChangeStream,
    pitr_enabled: bool,
    pitr_retention: Duration,
}

impl RegionReplica {
    pub fn new(region: impl Into<String>, key: KeyId) -> Self {
        Self {
            region: region.into(),
            key,
            view: StreamView::default(),
            records: HashMap::new(),
            stream: ChangeStream::new(),
            pitr_enabled: true,
            pitr_retention: Duration::from_secs(35 * 24 * 60 * 60),
        }
    }

    pub fn with_stream_view(mut self, view: StreamView) -> Self {
        self.view = view;
        self
    }

    pub fn with_pitr_retention(mut self, retention: Duration) -> Self {
        self.pitr_retention = retention;
        self
    }

    pub fn with_pitr_disabled(mut self) -> Self {
        self.pitr_enabled = false;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn key(&self) -> &KeyId {
        &self.key
    }

    pub fn get(&self, id: &AssetId) -> Option<&AssetRecord> {
        self.records.get(id).map(|a| &a.record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stream(&self) -> &ChangeStream {
        &self.stream
    }

    /// Write directly to this replica (primary-side upsert).
    ///
    /// The appended stream record's sequence becomes the write's
    /// last-writer-wins authority when it propagates.
    pub fn put(&mut self, record: AssetRecord, now: DateTime<Utc>) -> ChangeRecord {
        let id = record.asset_id.clone();
        let old = self.records.get(&id).map(|a| a.record.clone());
        let old_image = match self.view {
            StreamView::NewAndOldImages => old,
            StreamView::NewImageOnly => None,
        };
        let change = self
            .stream
            .append(id.clone(), old_image, Some(record.clone()), now);
        self.records.insert(
            id,
            Applied {
                origin: change.sequence,
                record,
            },
        );
        change
    }

    /// Apply a change record propagated from the primary.
    ///
    /// Returns `false` when the record is stale: a write with an equal or
    /// newer originating sequence has already been applied.
    pub fn apply_replicated(
        &mut self,
        change: &ChangeRecord,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        if !change.verify() {
            return Err(StoreError::ChecksumMismatch {
                sequence: change.sequence,
            });
        }

        if let Some(existing) = self.records.get(&change.asset_id) {
            if existing.origin >= change.sequence {
                return Ok(false);
            }
        }

        let old = self
            .records
            .get(&change.asset_id)
            .map(|a| a.record.clone());
        let old_image = match self.view {
            StreamView::NewAndOldImages => old,
            StreamView::NewImageOnly => None,
        };
        self.stream.append(
            change.asset_id.clone(),
            old_image,
            change.new_image.clone(),
            now,
        );

        match &change.new_image {
            Some(record) => {
                self.records.insert(
                    change.asset_id.clone(),
                    Applied {
                        origin: change.sequence,
                        record: record.clone(),
                    },
                );
            }
            None => {
                self.records.remove(&change.asset_id);
            }
        }
        Ok(true)
    }

    /// Roll the record map back to its state at `point`, replaying this
    /// replica's own stream. Returns the number of records restored.
    pub fn restore_to_point_in_time(
        &mut self,
        point: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        if !self.pitr_enabled {
            return Err(StoreError::RecoveryDisabled(self.region.clone()));
        }
        let window = chrono::Duration::from_std(self.pitr_retention)
            .unwrap_or_else(|_| chrono::Duration::MAX);
        if point < now - window {
            return Err(StoreError::OutOfRetention(self.region.clone()));
        }

        let mut restored: HashMap<AssetId, Applied> = HashMap::new();
        for record in self.stream.records() {
            if record.timestamp > point {
                break;
            }
            if !record.verify() {
                return Err(StoreError::ChecksumMismatch {
                    sequence: record.sequence,
                });
            }
            match &record.new_image {
                Some(image) => {
                    restored.insert(
                        record.asset_id.clone(),
                        Applied {
                            origin: record.sequence,
                            record: image.clone(),
                        },
                    );
                }
                None => {
                    restored.remove(&record.asset_id);
                }
            }
        }

        let count = restored.len();
        self.records = restored;
        tracing::info!(region = %self.region, %point, records = count, "restored replica to point in time");
        Ok(count)
    }

    /// Drop stream records that have aged out of the retention window
    pub fn trim_retention(&mut self, now: DateTime<Utc>) -> usize {
        let window = chrono::Duration::from_std(self.pitr_retention)
            .unwrap_or_else(|_| chrono::Duration::MAX);
        self.stream.trim_older_than(now - window)
    }
}

#[cfg(test)]
#[path = "replica_tests.rs"]
mod tests;
