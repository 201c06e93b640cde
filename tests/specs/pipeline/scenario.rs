//! End-to-end pipeline scenarios
//!
//! The full chain: schedule tick, delivery, execution, registrar
//! enumeration, replicated store writes.

use crate::prelude::*;
use ferry_core::{
    Clock, DeliveryState, ExecutionState, FakeCatalog, FakeClock, SequentialIdGen, SystemClock,
    TickSchedule,
};
use ferry_engine::{EffectExecutor, Runtime, StoreRegistrar};
use std::time::Duration;

#[tokio::test]
async fn twelve_hour_tick_backs_up_every_enumerated_asset() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let interval = Duration::from_secs(720 * 60);

    // Catalog state at T0: three assets across two pages
    let catalog = FakeCatalog::new();
    catalog.add_page(vec![asset("a", "orders"), asset("b", "users")]);
    catalog.add_page(vec![asset("c", "payments")]);

    let (table, _, _, _) = managed_table(Duration::ZERO);
    let registrar = StoreRegistrar::new(
        catalog,
        table.clone(),
        clock.clone(),
        "dzd_domain",
        "prj_1",
    );
    let executor = EffectExecutor::open(dir.path().join("history.jsonl")).unwrap();
    let runtime = Runtime::new(
        test_config(interval),
        registrar,
        clock.clone(),
        SequentialIdGen::default(),
        executor,
    )
    .with_table(table.clone());

    let mut schedule = TickSchedule::new(interval, &clock);
    clock.advance(interval);
    let ticks = schedule.poll(&clock);
    assert_eq!(ticks.len(), 1);

    let Some(tick) = ticks.into_iter().next() else {
        unreachable!()
    };
    let (delivery, handles) = runtime.handle_tick(tick).await.unwrap();
    assert!(matches!(delivery.state, DeliveryState::Delivered { .. }));

    let mut succeeded = 0;
    for handle in handles {
        let execution = handle.await.unwrap().unwrap();
        assert_eq!(execution.state, ExecutionState::Succeed);
        assert_eq!(execution.response.unwrap().assets_written, 3);
        succeeded += 1;
    }
    assert_eq!(succeeded, 1);

    // Store holds exactly the assets enumerated at T0
    assert_eq!(table.item_count(PRIMARY_REGION).unwrap(), 3);
    table.poll_replication(clock.now_utc()).unwrap();
    assert_eq!(table.item_count(SECONDARY_REGION).unwrap(), 3);
}

#[tokio::test]
async fn rerunning_a_backup_for_the_same_timestamp_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::with_assets(vec![asset("a", "orders"), asset("b", "users")]);
    let (table, _, _, _) = managed_table(Duration::ZERO);
    let registrar = StoreRegistrar::new(
        catalog,
        table.clone(),
        SystemClock,
        "dzd_domain",
        "prj_1",
    );
    let executor = EffectExecutor::open(dir.path().join("history.jsonl")).unwrap();
    let runtime = Runtime::new(
        test_config(Duration::from_secs(720 * 60)),
        registrar,
        SystemClock,
        SequentialIdGen::default(),
        executor,
    )
    .with_table(table.clone());

    let detail = serde_json::json!({"source": "spec"});
    runtime.backup_once(detail.clone()).await.unwrap();
    let first: Vec<_> = ["a", "b"]
        .iter()
        .map(|id| table.get_item(PRIMARY_REGION, &(*id).into()).unwrap())
        .collect();

    runtime.backup_once(detail).await.unwrap();
    let second: Vec<_> = ["a", "b"]
        .iter()
        .map(|id| table.get_item(PRIMARY_REGION, &(*id).into()).unwrap())
        .collect();

    assert_eq!(table.item_count(PRIMARY_REGION).unwrap(), 2);
    assert_eq!(first, second);
}

#[tokio::test]
async fn overlapping_executions_write_concurrently_without_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::with_assets(vec![asset("a", "orders"), asset("b", "users")]);
    let (table, _, _, _) = managed_table(Duration::ZERO);
    let registrar = StoreRegistrar::new(
        catalog,
        table.clone(),
        SystemClock,
        "dzd_domain",
        "prj_1",
    );
    let executor = EffectExecutor::open(dir.path().join("history.jsonl")).unwrap();
    let runtime = Runtime::new(
        test_config(Duration::from_secs(60)),
        registrar,
        SystemClock,
        SequentialIdGen::default(),
        executor,
    )
    .with_table(table.clone());

    // Two backups in flight at once, as when an interval is shorter than
    // a run's duration
    let (first, second) = tokio::join!(
        runtime.backup_once(serde_json::json!({"run": 1})),
        runtime.backup_once(serde_json::json!({"run": 2})),
    );
    assert_eq!(first.unwrap().state, ExecutionState::Succeed);
    assert_eq!(second.unwrap().state, ExecutionState::Succeed);

    // Keyed upserts: still one record per asset, last writer won
    assert_eq!(table.item_count(PRIMARY_REGION).unwrap(), 2);
    table.poll_replication(SystemClock.now_utc()).unwrap();
    assert_eq!(table.item_count(SECONDARY_REGION).unwrap(), 2);
}
