// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Retry delay policy.
//!
//! One policy type drives both the realtime channel's reconnect timer and
//! the background flush loop. The default is the fixed one-second delay with
//! no attempt cap; exponential growth, jitter and a cap are opt-in through
//! configuration.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Delay schedule for repeated attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Delay before the first retry (milliseconds).
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay (milliseconds).
    pub max_delay_ms: u64,
    /// Growth factor per attempt. `1.0` gives a fixed delay.
    pub multiplier: f64,
    /// Random spread as a fraction of the delay, in `0.0..=1.0`.
    pub jitter: f64,
    /// Maximum number of attempts. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_millis(1000))
    }
}

impl BackoffPolicy {
    /// The same delay before every attempt, forever.
    pub fn fixed(delay: Duration) -> Self {
        let ms = delay.as_millis() as u64;
        BackoffPolicy {
            initial_delay_ms: ms,
            max_delay_ms: ms,
            multiplier: 1.0,
            jitter: 0.0,
            max_attempts: None,
        }
    }

    /// Doubling delay with 20% jitter, capped at `max`.
    pub fn exponential(initial: Duration, max: Duration) -> Self {
        BackoffPolicy {
            initial_delay_ms: initial.as_millis() as u64,
            max_delay_ms: max.as_millis() as u64,
            multiplier: 2.0,
            jitter: 0.2,
            max_attempts: None,
        }
    }

    /// Sets the jitter ratio.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Caps the number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Checks that the numbers describe a usable schedule.
    pub fn validate(&self) -> Result<(), String> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(format!(
                "multiplier must be at least 1.0, got {}",
                self.multiplier
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(format!("jitter must be within 0.0..=1.0, got {}", self.jitter));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(format!(
                "max_delay_ms ({}) is below initial_delay_ms ({})",
                self.max_delay_ms, self.initial_delay_ms
            ));
        }
        if self.max_attempts == Some(0) {
            return Err("max_attempts must be at least 1 when set".to_string());
        }
        Ok(())
    }

    /// Whether attempt number `attempt` (1-based) is still allowed.
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt <= max)
    }

    /// Delay before attempt `attempt` (1-based), without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(64) as i32;
        let ms = (self.initial_delay_ms as f64) * self.multiplier.powi(exponent);
        let capped = ms.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Delay before attempt `attempt` (1-based), with jitter applied.
    ///
    /// Jitter spreads the delay uniformly by `±jitter` of its base value and
    /// never exceeds `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter <= 0.0 {
            return base;
        }
        let spread = rand::rng().random_range(-self.jitter..=self.jitter);
        let ms = (base.as_millis() as f64) * (1.0 + spread);
        let capped = ms.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
