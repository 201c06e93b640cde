// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full-jitter retry backoff
//!
//! Retry delays are drawn uniformly from `[0, min(max_delay, base * 2^n)]`
//! so concurrent executions that fail together do not retry together.
//! The generator is seeded per execution, which keeps tests deterministic
//! while still decorrelating retry storms in production.

use crate::config::RetryPolicy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Seedable full-jitter delay source for one execution's retries
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    rng: StdRng,
}

impl Backoff {
    pub fn new(policy: RetryPolicy, seed: u64) -> Self {
        Self {
            policy,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Delay before the retry that follows the given failed attempt
    /// (1-based)
    pub fn delay(&mut self, failed_attempt: u32) -> Duration {
        let exp = failed_attempt.saturating_sub(1).min(16);
        let cap = self
            .policy
            .base_delay
            .saturating_mul(1u32 << exp)
            .min(self.policy.max_delay);

        let cap_ms = cap.as_millis() as u64;
        if cap_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.rng.gen_range(0..=cap_ms))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
