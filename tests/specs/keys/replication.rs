//! Key replication specs
//!
//! A replica key is always derived from a live multi-region primary, its
//! policy grants are declared explicitly, rotation mirrors through the
//! link, and deleting the primary breaks every replica.

use crate::prelude::*;
use ferry_keys::{KeyError, KeyManager, KeyOp, KeyPolicy, PolicyStatement};

fn manager() -> (KeyManager, ferry_keys::KeyId) {
    let keys = KeyManager::new(SERVICE, ADMIN);
    let primary = keys.create_primary(
        PRIMARY_REGION,
        KeyPolicy::replica_default(SERVICE, ADMIN),
        true,
    );
    (keys, primary)
}

#[test]
fn replica_policy_must_grant_the_storage_service_explicitly() {
    let (keys, primary) = manager();

    // Admin-only policy: nothing is inherited from the primary
    let policy = KeyPolicy::new(vec![PolicyStatement::new("admin", ADMIN, &["kms:*"])]);
    let err = keys
        .replicate(&primary, SECONDARY_REGION, policy)
        .unwrap_err();
    assert!(matches!(err, KeyError::PolicyMissingGrant { .. }));

    // With both grants declared the replica is created
    let policy = KeyPolicy::replica_default(SERVICE, ADMIN);
    let replica = keys.replicate(&primary, SECONDARY_REGION, policy).unwrap();
    keys.ensure_usable(&replica, KeyOp::Encrypt).unwrap();
    keys.ensure_usable(&replica, KeyOp::Decrypt).unwrap();
    keys.ensure_usable(&replica, KeyOp::GenerateDataKey).unwrap();
}

#[test]
fn replica_policy_must_grant_the_admin_principal_explicitly() {
    let (keys, primary) = manager();

    let policy = KeyPolicy::new(vec![PolicyStatement::new(
        "service",
        SERVICE,
        &["kms:Encrypt", "kms:Decrypt", "kms:GenerateDataKey*"],
    )]);
    let err = keys
        .replicate(&primary, SECONDARY_REGION, policy)
        .unwrap_err();

    assert!(matches!(
        err,
        KeyError::PolicyMissingGrant { principal, .. } if principal == ADMIN
    ));
}

#[test]
fn rotation_mirrors_through_the_replication_link() {
    let (keys, primary) = manager();
    let replica = keys
        .replicate(&primary, SECONDARY_REGION, KeyPolicy::replica_default(SERVICE, ADMIN))
        .unwrap();

    assert_eq!(keys.rotation_epoch(&replica).unwrap(), 0);

    // No separate operator action on the replica
    keys.rotate(&primary).unwrap();
    assert_eq!(keys.rotation_epoch(&primary).unwrap(), 1);
    assert_eq!(keys.rotation_epoch(&replica).unwrap(), 1);
}

#[test]
fn replicas_cannot_be_created_from_a_single_region_key() {
    let keys = KeyManager::new(SERVICE, ADMIN);
    let primary = keys.create_primary(
        PRIMARY_REGION,
        KeyPolicy::replica_default(SERVICE, ADMIN),
        false,
    );

    let err = keys
        .replicate(&primary, SECONDARY_REGION, KeyPolicy::replica_default(SERVICE, ADMIN))
        .unwrap_err();
    assert!(matches!(err, KeyError::NotMultiRegion(_)));
}

#[test]
fn deleting_the_primary_breaks_every_replica() {
    let (keys, primary) = manager();
    let replica = keys
        .replicate(&primary, SECONDARY_REGION, KeyPolicy::replica_default(SERVICE, ADMIN))
        .unwrap();

    keys.schedule_deletion(&primary).unwrap();

    let err = keys.ensure_usable(&replica, KeyOp::Decrypt).unwrap_err();
    assert!(matches!(err, KeyError::ReplicaBroken { .. }));
}

#[test]
fn the_link_records_one_primary_with_its_replicas() {
    let (keys, primary) = manager();
    let replica = keys
        .replicate(&primary, SECONDARY_REGION, KeyPolicy::replica_default(SERVICE, ADMIN))
        .unwrap();

    let link = keys.replication_link(&primary).unwrap();
    assert_eq!(link.primary, primary);
    assert_eq!(
        link.replicas,
        vec![(SECONDARY_REGION.to_string(), replica)]
    );
}
