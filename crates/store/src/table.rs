// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The cross-region replicated asset table
//!
//! `ReplicatedTable` is the one shared mutable resource in the pipeline.
//! It is never locked by callers: all writers go through idempotent keyed
//! upserts, so concurrent executions cannot corrupt state, only overwrite
//! a record with a more recent snapshot. Writes land on the primary
//! replica and propagate to the secondary after the replication lag,
//! last-writer-wins by stream sequence. Every store operation checks that
//! the target region's encryption key is usable first.

use crate::durable::DurableStream;
use crate::error::StoreError;
use crate::replica::{RegionReplica, StreamView};
use crate::stream::ChangeRecord;
use chrono::{DateTime, Utc};
use ferry_core::{AssetId, AssetRecord};
use ferry_keys::{KeyId, KeyManager, KeyOp};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Declarative shape of the replicated table.
///
/// Throughput is on-demand: there are no capacity knobs anywhere in this
/// API, so bursty registrar writes need no advance provisioning.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub name: String,
    /// The sole key attribute; there is no sort key
    pub partition_key: String,
    pub stream_view: StreamView,
    /// How long a change waits before it is visible in the secondary
    pub replication_lag: Duration,
    /// Per-replica point-in-time recovery window
    pub pitr_retention: Duration,
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_key: "AssetId".to_string(),
            stream_view: StreamView::NewAndOldImages,
            replication_lag: Duration::from_secs(1),
            pitr_retention: Duration::from_secs(35 * 24 * 60 * 60),
        }
    }

    pub fn with_replication_lag(mut self, lag: Duration) -> Self {
        self.replication_lag = lag;
        self
    }

    pub fn with_pitr_retention(mut self, retention: Duration) -> Self {
        self.pitr_retention = retention;
        self
    }

    /// Build a replica configured to this table's stream view and
    /// retention window
    pub fn replica(&self, region: impl Into<String>, key: KeyId) -> RegionReplica {
        RegionReplica::new(region, key)
            .with_stream_view(self.stream_view)
            .with_pitr_retention(self.pitr_retention)
    }
}

struct PendingChange {
    queued_at: DateTime<Utc>,
    change: ChangeRecord,
}

struct Inner {
    primary: RegionReplica,
    secondary: RegionReplica,
    pending: VecDeque<PendingChange>,
    durable: Option<DurableStream>,
}

/// Shared handle to the replicated table
#[derive(Clone)]
pub struct ReplicatedTable {
    spec: TableSpec,
    keys: KeyManager,
    inner: Arc<Mutex<Inner>>,
}

impl ReplicatedTable {
    pub fn new(
        spec: TableSpec,
        keys: KeyManager,
        primary: RegionReplica,
        secondary: RegionReplica,
    ) -> Self {
        Self {
            spec,
            keys,
            inner: Arc::new(Mutex::new(Inner {
                primary,
                secondary,
                pending: VecDeque::new(),
                durable: None,
            })),
        }
    }

    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    /// Persist every primary-stream change record to a checksummed log at
    /// the given path
    pub fn attach_durable_stream(&self, path: &Path) -> Result<(), StoreError> {
        let stream = DurableStream::open(path)?;
        self.lock().durable = Some(stream);
        Ok(())
    }

    /// Idempotent keyed upsert.
    ///
    /// Requires the primary region's key to be usable for encryption. The
    /// write is captured in the primary change stream and queued for
    /// propagation to the secondary.
    pub fn put_item(
        &self,
        record: AssetRecord,
        now: DateTime<Utc>,
    ) -> Result<ChangeRecord, StoreError> {
        let mut inner = self.lock();
        self.keys.ensure_usable(inner.primary.key(), KeyOp::Encrypt)?;

        let change = inner.primary.put(record, now);
        if let Some(durable) = inner.durable.as_mut() {
            durable.append(&change)?;
        }
        inner.pending.push_back(PendingChange {
            queued_at: now,
            change: change.clone(),
        });

        tracing::debug!(
            table = %self.spec.name,
            asset = %change.asset_id,
            sequence = change.sequence,
            insert = change.old_image.is_none(),
            "upserted asset record"
        );
        Ok(change)
    }

    /// Read one record from the replica in the given region.
    ///
    /// Requires that region's key to be usable for decryption.
    pub fn get_item(&self, region: &str, id: &AssetId) -> Result<Option<AssetRecord>, StoreError> {
        let inner = self.lock();
        let replica = Self::replica_in(&inner, region)?;
        self.keys.ensure_usable(replica.key(), KeyOp::Decrypt)?;
        Ok(replica.get(id).cloned())
    }

    /// Apply queued changes whose replication lag has elapsed to the
    /// secondary replica. Returns how many were applied.
    ///
    /// A degraded secondary (key unusable) leaves the queue intact, so
    /// replication resumes once the platform recovers.
    pub fn poll_replication(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let lag = chrono::Duration::from_std(self.spec.replication_lag)
            .unwrap_or_else(|_| chrono::Duration::zero());
        let mut inner = self.lock();
        let mut applied = 0;

        while let Some(front) = inner.pending.front() {
            if front.queued_at + lag > now {
                break;
            }
            self.keys.ensure_usable(inner.secondary.key(), KeyOp::Encrypt)?;
            let Some(pending) = inner.pending.pop_front() else {
                break;
            };
            if inner.secondary.apply_replicated(&pending.change, now)? {
                applied += 1;
            }
        }

        if applied > 0 {
            tracing::debug!(
                table = %self.spec.name,
                applied,
                remaining = inner.pending.len(),
                "propagated changes to secondary region"
            );
        }
        Ok(applied)
    }

    /// Changes captured but not yet applied to the secondary
    pub fn pending_replication(&self) -> usize {
        self.lock().pending.len()
    }

    /// Number of records held by the replica in the given region
    pub fn item_count(&self, region: &str) -> Result<usize, StoreError> {
        let inner = self.lock();
        Ok(Self::replica_in(&inner, region)?.len())
    }

    /// Snapshot of a regional replica's change stream
    pub fn stream_records(&self, region: &str) -> Result<Vec<ChangeRecord>, StoreError> {
        let inner = self.lock();
        Ok(Self::replica_in(&inner, region)?.stream().records().to_vec())
    }

    /// Roll one regional replica back to its state at `point`
    pub fn restore_to_point_in_time(
        &self,
        region: &str,
        point: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut inner = self.lock();
        if inner.primary.region() == region {
            inner.primary.restore_to_point_in_time(point, now)
        } else if inner.secondary.region() == region {
            inner.secondary.restore_to_point_in_time(point, now)
        } else {
            Err(StoreError::UnknownRegion(region.to_string()))
        }
    }

    fn replica_in<'a>(inner: &'a Inner, region: &str) -> Result<&'a RegionReplica, StoreError> {
        if inner.primary.region() == region {
            Ok(&inner.primary)
        } else if inner.secondary.region() == region {
            Ok(&inner.secondary)
        } else {
            Err(StoreError::UnknownRegion(region.to_string()))
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
