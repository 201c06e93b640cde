// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key replication manager
//!
//! Maintains multi-region primary keys and their regional replicas. A
//! replica is always derived from a live primary and cannot exist on its
//! own: deleting the primary breaks every replica. Rotation happens on the
//! primary and is mirrored through the replication link with no separate
//! operator action.

use crate::error::KeyError;
use crate::policy::{KeyOp, KeyPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Unique identifier for an encryption key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId(pub String);

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for KeyId {
    fn from(s: &str) -> Self {
        KeyId(s.to_string())
    }
}

/// Lifecycle state of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Enabled,
    PendingDeletion,
}

/// The one-to-many relationship binding replicas to their primary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationLink {
    pub primary: KeyId,
    /// (region, replica key id) pairs
    pub replicas: Vec<(String, KeyId)>,
}

#[derive(Debug, Clone)]
struct KeyEntry {
    id: KeyId,
    region: String,
    policy: KeyPolicy,
    multi_region: bool,
    rotation_enabled: bool,
    rotation_epoch: u64,
    state: KeyState,
    /// Set for replicas: the primary this key is derived from
    primary: Option<KeyId>,
    replicas: Vec<KeyId>,
}

struct Inner {
    keys: HashMap<KeyId, KeyEntry>,
    service_principal: String,
    admin_principal: String,
    counter: u64,
}

/// Shared handle to the key registry
#[derive(Clone)]
pub struct KeyManager {
    inner: Arc<Mutex<Inner>>,
}

impl KeyManager {
    pub fn new(service_principal: impl Into<String>, admin_principal: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                keys: HashMap::new(),
                service_principal: service_principal.into(),
                admin_principal: admin_principal.into(),
                counter: 0,
            })),
        }
    }

    /// Create a primary key in the given region, rotation enabled
    pub fn create_primary(&self, region: &str, policy: KeyPolicy, multi_region: bool) -> KeyId {
        let mut inner = self.lock();
        inner.counter += 1;
        let id = KeyId(format!("mrk-{:04}", inner.counter));

        inner.keys.insert(
            id.clone(),
            KeyEntry {
                id: id.clone(),
                region: region.to_string(),
                policy,
                multi_region,
                rotation_enabled: true,
                rotation_epoch: 0,
                state: KeyState::Enabled,
                primary: None,
                replicas: Vec::new(),
            },
        );
        tracing::info!(key = %id, region, multi_region, "created primary key");
        id
    }

    /// Create a replica of a multi-region primary in another region.
    ///
    /// The replica's policy is validated here: it must explicitly grant the
    /// storage service and the administrative principal, since nothing is
    /// inherited from the primary.
    pub fn replicate(
        &self,
        primary: &KeyId,
        region: &str,
        policy: KeyPolicy,
    ) -> Result<KeyId, KeyError> {
        let mut inner = self.lock();

        policy.validate_for_replica(&inner.service_principal, &inner.admin_principal)?;

        let entry = inner
            .keys
            .get(primary)
            .ok_or_else(|| KeyError::NotFound(primary.clone()))?;
        if entry.primary.is_some() {
            return Err(KeyError::NotAPrimary(primary.clone()));
        }
        if !entry.multi_region {
            return Err(KeyError::NotMultiRegion(primary.clone()));
        }
        if entry.state != KeyState::Enabled {
            return Err(KeyError::PendingDeletion(primary.clone()));
        }
        let occupied = entry.region == region
            || entry.replicas.iter().any(|r| {
                inner
                    .keys
                    .get(r)
                    .is_some_and(|replica| replica.region == region)
            });
        if occupied {
            return Err(KeyError::ReplicaExists {
                primary: primary.clone(),
                region: region.to_string(),
            });
        }

        let id = KeyId(format!("{}:{}", primary.0, region));
        inner.keys.insert(
            id.clone(),
            KeyEntry {
                id: id.clone(),
                region: region.to_string(),
                policy,
                multi_region: true,
                rotation_enabled: true,
                rotation_epoch: 0,
                state: KeyState::Enabled,
                primary: Some(primary.clone()),
                replicas: Vec::new(),
            },
        );
        if let Some(entry) = inner.keys.get_mut(primary) {
            entry.replicas.push(id.clone());
        }
        tracing::info!(primary = %primary, replica = %id, region, "replicated key");
        Ok(id)
    }

    /// Rotate a primary key. Replicas mirror the new epoch transparently.
    pub fn rotate(&self, primary: &KeyId) -> Result<u64, KeyError> {
        let mut inner = self.lock();
        let entry = inner
            .keys
            .get_mut(primary)
            .ok_or_else(|| KeyError::NotFound(primary.clone()))?;
        if entry.primary.is_some() {
            return Err(KeyError::NotAPrimary(primary.clone()));
        }
        if !entry.rotation_enabled {
            return Err(KeyError::RotationDisabled(primary.clone()));
        }
        if entry.state != KeyState::Enabled {
            return Err(KeyError::PendingDeletion(primary.clone()));
        }
        entry.rotation_epoch += 1;
        let epoch = entry.rotation_epoch;
        tracing::info!(key = %primary, epoch, "rotated primary key");
        Ok(epoch)
    }

    /// The rotation epoch a key currently encrypts with. Replicas report
    /// their primary's epoch.
    pub fn rotation_epoch(&self, key: &KeyId) -> Result<u64, KeyError> {
        let inner = self.lock();
        let entry = inner
            .keys
            .get(key)
            .ok_or_else(|| KeyError::NotFound(key.clone()))?;
        match &entry.primary {
            None => Ok(entry.rotation_epoch),
            Some(primary) => inner
                .keys
                .get(primary)
                .map(|p| p.rotation_epoch)
                .ok_or_else(|| KeyError::ReplicaBroken {
                    replica: key.clone(),
                    primary: primary.clone(),
                }),
        }
    }

    /// Schedule a key for deletion. Scheduling the primary breaks every
    /// replica derived from it.
    pub fn schedule_deletion(&self, key: &KeyId) -> Result<(), KeyError> {
        let mut inner = self.lock();
        let entry = inner
            .keys
            .get_mut(key)
            .ok_or_else(|| KeyError::NotFound(key.clone()))?;
        entry.state = KeyState::PendingDeletion;
        tracing::warn!(key = %key, "key scheduled for deletion");
        Ok(())
    }

    /// Check that the storage service can perform the given operation with
    /// the key right now. A replica is usable only while its primary is
    /// live.
    pub fn ensure_usable(&self, key: &KeyId, op: KeyOp) -> Result<(), KeyError> {
        let inner = self.lock();
        let entry = inner
            .keys
            .get(key)
            .ok_or_else(|| KeyError::NotFound(key.clone()))?;
        if entry.state != KeyState::Enabled {
            return Err(KeyError::PendingDeletion(key.clone()));
        }
        if let Some(primary) = &entry.primary {
            let live = inner
                .keys
                .get(primary)
                .is_some_and(|p| p.state == KeyState::Enabled);
            if !live {
                return Err(KeyError::ReplicaBroken {
                    replica: key.clone(),
                    primary: primary.clone(),
                });
            }
        }
        if !entry.policy.allows(&inner.service_principal, op.action()) {
            return Err(KeyError::AccessDenied {
                key: key.clone(),
                principal: inner.service_principal.clone(),
                action: op.action().to_string(),
            });
        }
        Ok(())
    }

    /// The replication link of a primary key
    pub fn replication_link(&self, primary: &KeyId) -> Result<ReplicationLink, KeyError> {
        let inner = self.lock();
        let entry = inner
            .keys
            .get(primary)
            .ok_or_else(|| KeyError::NotFound(primary.clone()))?;
        if entry.primary.is_some() {
            return Err(KeyError::NotAPrimary(primary.clone()));
        }
        let replicas = entry
            .replicas
            .iter()
            .filter_map(|id| inner.keys.get(id).map(|r| (r.region.clone(), r.id.clone())))
            .collect();
        Ok(ReplicationLink {
            primary: primary.clone(),
            replicas,
        })
    }

    /// The region a key lives in
    pub fn region_of(&self, key: &KeyId) -> Result<String, KeyError> {
        let inner = self.lock();
        inner
            .keys
            .get(key)
            .map(|e| e.region.clone())
            .ok_or_else(|| KeyError::NotFound(key.clone()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
