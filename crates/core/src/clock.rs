// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling
//!
//! Trigger payloads carry wall-clock timestamps while deadlines and
//! schedules are tracked on the monotonic clock, so the trait exposes both.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A clock that provides the current time
pub trait Clock: Clone + Send + Sync {
    /// Monotonic time, used for deadlines and schedule arithmetic
    fn now(&self) -> Instant;

    /// Wall-clock time, used for trigger and record timestamps
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Real system clock
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fake clock for testing with controllable time
///
/// Both time sources advance together, so a test that advances the clock
/// by two hours ages wall-clock timestamps by the same amount.
#[derive(Clone)]
pub struct FakeClock {
    base_instant: Instant,
    base_utc: DateTime<Utc>,
    offset: Arc<Mutex<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::starting_at(default_epoch())
    }

    /// Create a fake clock whose wall clock starts at the given instant
    pub fn starting_at(base_utc: DateTime<Utc>) -> Self {
        Self {
            base_instant: Instant::now(),
            base_utc,
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += duration;
    }
}

fn default_epoch() -> DateTime<Utc> {
    // An arbitrary fixed starting point keeps test timestamps stable
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.base_instant + *offset
    }

    fn now_utc(&self) -> DateTime<Utc> {
        let offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.base_utc
            + chrono::Duration::from_std(*offset).unwrap_or_else(|_| chrono::Duration::zero())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
