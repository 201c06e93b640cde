//! Replicated store specs
//!
//! Every write is captured with both item images, and the secondary
//! region converges to the primary once the replication lag elapses.

use crate::prelude::*;
use std::time::Duration;

#[test]
fn change_stream_carries_old_and_new_images() {
    let (table, _, _, _) = managed_table(Duration::ZERO);

    table.put_item(asset("a", "before"), ts(0)).unwrap();
    table.put_item(asset("a", "after"), ts(1)).unwrap();

    let records = table.stream_records(PRIMARY_REGION).unwrap();
    assert_eq!(records.len(), 2);

    assert!(records[0].old_image.is_none());
    assert_eq!(records[0].new_image.as_ref().unwrap().asset_name, "before");

    assert_eq!(records[1].old_image.as_ref().unwrap().asset_name, "before");
    assert_eq!(records[1].new_image.as_ref().unwrap().asset_name, "after");
}

#[test]
fn secondary_region_converges_within_the_lag() {
    let (table, _, _, _) = managed_table(Duration::from_secs(2));

    table.put_item(asset("a", "orders"), ts(0)).unwrap();
    table.put_item(asset("b", "users"), ts(0)).unwrap();

    // Not yet visible in the secondary
    table.poll_replication(ts(1)).unwrap();
    assert_eq!(table.item_count(SECONDARY_REGION).unwrap(), 0);

    // Converged after the lag
    table.poll_replication(ts(2)).unwrap();
    assert_eq!(table.item_count(SECONDARY_REGION).unwrap(), 2);
    for id in ["a", "b"] {
        assert_eq!(
            table.get_item(PRIMARY_REGION, &id.into()).unwrap(),
            table.get_item(SECONDARY_REGION, &id.into()).unwrap()
        );
    }
}

#[test]
fn replication_preserves_write_order_per_key() {
    let (table, _, _, _) = managed_table(Duration::ZERO);

    for version in 1..=5 {
        table
            .put_item(asset("a", &format!("v{}", version)), ts(version))
            .unwrap();
    }
    table.poll_replication(ts(10)).unwrap();

    let item = table
        .get_item(SECONDARY_REGION, &"a".into())
        .unwrap()
        .unwrap();
    assert_eq!(item.asset_name, "v5");
    assert_eq!(table.item_count(SECONDARY_REGION).unwrap(), 1);
}

#[test]
fn degraded_replication_surfaces_without_losing_changes() {
    let (table, keys, _, replica_key) = managed_table(Duration::ZERO);
    table.put_item(asset("a", "orders"), ts(0)).unwrap();

    keys.schedule_deletion(&replica_key).unwrap();

    assert!(table.poll_replication(ts(1)).is_err());
    // Nothing is silently swallowed: the change is still queued
    assert_eq!(table.pending_replication(), 1);
}
