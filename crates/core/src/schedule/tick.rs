// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-interval tick source for the backup scheduler
//!
//! Ticks are not persisted; each due tick carries the wall-clock time at
//! which it was scheduled to fire, which becomes the trigger timestamp of
//! the delivery it produces.

use crate::clock::Clock;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// One scheduler firing
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub sequence: u64,
    /// Wall-clock time the tick was scheduled for
    pub timestamp: DateTime<Utc>,
}

/// Emits one tick per fixed interval
#[derive(Debug, Clone)]
pub struct TickSchedule {
    interval: Duration,
    next_fire: Instant,
    next_timestamp: DateTime<Utc>,
    sequence: u64,
}

impl TickSchedule {
    /// Create a schedule whose first tick fires one interval from now
    pub fn new(interval: Duration, clock: &impl Clock) -> Self {
        Self {
            interval,
            next_fire: clock.now() + interval,
            next_timestamp: clock.now_utc()
                + chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::zero()),
            sequence: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time remaining until the next tick fires
    pub fn until_next(&self, now: Instant) -> Duration {
        self.next_fire.saturating_duration_since(now)
    }

    /// Return every tick due at or before now, advancing the schedule.
    ///
    /// A schedule that has fallen behind yields one tick per missed
    /// interval, each stamped with its originally scheduled time.
    pub fn poll(&mut self, clock: &impl Clock) -> Vec<Tick> {
        let now = clock.now();
        let mut due = Vec::new();

        while self.next_fire <= now {
            self.sequence += 1;
            due.push(Tick {
                sequence: self.sequence,
                timestamp: self.next_timestamp,
            });

            self.next_fire += self.interval;
            self.next_timestamp = self.next_timestamp
                + chrono::Duration::from_std(self.interval)
                    .unwrap_or_else(|_| chrono::Duration::zero());
        }

        due
    }
}

#[cfg(test)]
#[path = "tick_tests.rs"]
mod tests;
