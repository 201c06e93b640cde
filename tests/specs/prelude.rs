//! Shared helpers for the behavioral specs

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use ferry_core::{AssetRecord, DeliveryPolicy, PipelineConfig, RetryPolicy};
use ferry_keys::{KeyId, KeyManager, KeyPolicy};
use ferry_store::{ReplicatedTable, TableSpec};
use std::time::Duration;

pub const PRIMARY_REGION: &str = "eu-west-1";
pub const SECONDARY_REGION: &str = "eu-central-1";
pub const SERVICE: &str = "storage.service";
pub const ADMIN: &str = "admin";

/// A pipeline config with fast retries, suitable for driving executions
/// inside a test
pub fn test_config(backup_interval: Duration) -> PipelineConfig {
    PipelineConfig {
        application: "ferry".to_string(),
        stage: "test".to_string(),
        primary_region: PRIMARY_REGION.to_string(),
        secondary_region: SECONDARY_REGION.to_string(),
        backup_interval,
        domain_id: "dzd_domain".to_string(),
        project_id: "prj_1".to_string(),
        admin_principal: ADMIN.to_string(),
        delivery: DeliveryPolicy::default(),
        retry: RetryPolicy {
            max_retries: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        },
        execution_timeout: Duration::from_secs(5 * 60),
        data_dir: None,
    }
}

/// Fixed reference instant so record timestamps are stable
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap()
}

pub fn ts(seconds: i64) -> DateTime<Utc> {
    epoch() + chrono::Duration::seconds(seconds)
}

pub fn asset(id: &str, name: &str) -> AssetRecord {
    AssetRecord::new(id, "table", name, epoch())
}

/// A replicated table wired to a primary key and its secondary-region
/// replica, the way the engine bootstraps one
pub fn managed_table(replication_lag: Duration) -> (ReplicatedTable, KeyManager, KeyId, KeyId) {
    let keys = KeyManager::new(SERVICE, ADMIN);
    let policy = KeyPolicy::replica_default(SERVICE, ADMIN);
    let primary_key = keys.create_primary(PRIMARY_REGION, policy.clone(), true);
    let replica_key = keys.replicate(&primary_key, SECONDARY_REGION, policy).unwrap();

    let spec = TableSpec::new("ferry-assets-info").with_replication_lag(replication_lag);
    let primary = spec.replica(PRIMARY_REGION, primary_key.clone());
    let secondary = spec.replica(SECONDARY_REGION, replica_key.clone());
    let table = ReplicatedTable::new(spec, keys.clone(), primary, secondary);
    (table, keys, primary_key, replica_key)
}
