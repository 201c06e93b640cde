// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline configuration
//!
//! All region, interval, and identifier values live in one explicit object
//! passed to the scheduler and orchestrator at construction time, so
//! multiple independently configured pipeline instances can coexist in
//! tests. Nothing here is reloaded at runtime.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Static configuration for one backup pipeline instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Application name used in table names, key aliases, and log fields
    pub application: String,
    #[serde(default = "default_stage")]
    pub stage: String,
    pub primary_region: String,
    pub secondary_region: String,
    /// Interval between backup runs
    #[serde(with = "humantime_serde", default = "default_backup_interval")]
    pub backup_interval: Duration,
    /// Source catalog domain identifier
    pub domain_id: String,
    /// Source catalog project identifier
    pub project_id: String,
    /// Administrative principal granted full control on replica keys
    #[serde(default = "default_admin_principal")]
    pub admin_principal: String,
    #[serde(default)]
    pub delivery: DeliveryPolicy,
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Hard wall-clock bound on a whole execution
    #[serde(with = "humantime_serde", default = "default_execution_timeout")]
    pub execution_timeout: Duration,
    /// Directory for the execution history log and stream files
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Scheduler-side delivery retry policy, independent of the orchestrator's
/// task-level retries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryPolicy {
    /// Total delivery attempts before the event is dropped
    pub max_attempts: u32,
    /// First redelivery delay; doubles per attempt up to `max_delay`
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Events older than this are discarded rather than executed late
    #[serde(with = "humantime_serde")]
    pub max_event_age: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_event_age: Duration::from_secs(2 * 60 * 60),
        }
    }
}

impl DeliveryPolicy {
    /// Deterministic exponential redelivery delay for the given attempt
    /// (1-based)
    pub fn redelivery_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exp);
        delay.min(self.max_delay)
    }
}

/// Orchestrator retry policy for registrar invocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Additional invocation attempts after the first failure
    pub max_retries: u32,
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    /// Cap on any single retry delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Total invocation attempts permitted (first try plus retries)
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

fn default_stage() -> String {
    "dev".to_string()
}

fn default_backup_interval() -> Duration {
    Duration::from_secs(720 * 60)
}

fn default_admin_principal() -> String {
    "admin".to_string()
}

fn default_execution_timeout() -> Duration {
    Duration::from_secs(5 * 60)
}

impl PipelineConfig {
    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application.is_empty() {
            return Err(ConfigError::Invalid("application must not be empty".into()));
        }
        if self.primary_region == self.secondary_region {
            return Err(ConfigError::Invalid(format!(
                "secondary region must differ from primary region ({})",
                self.primary_region
            )));
        }
        if self.backup_interval.is_zero() {
            return Err(ConfigError::Invalid("backup interval must be nonzero".into()));
        }
        if self.delivery.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "delivery policy needs at least one attempt".into(),
            ));
        }
        if self.execution_timeout.is_zero() {
            return Err(ConfigError::Invalid("execution timeout must be nonzero".into()));
        }
        Ok(())
    }

    /// Table name for the replicated asset store
    pub fn table_name(&self) -> String {
        format!("{}-assets-info", self.application)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
