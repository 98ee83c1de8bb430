//! Retry Policy
//!
//! Exponential backoff as a plain value: `delay = min(base * 2^attempt, max)`,
//! at most `max_retries` retries after the first attempt.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backoff configuration for a retried operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub base_delay_ms: u64,

    /// Upper bound on any single delay
    pub max_delay_ms: u64,

    /// Retries after the initial attempt (0 = never retry)
    pub max_retries: u32,

    /// Add up to 25% random jitter to each delay
    pub use_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::polling()
    }
}

impl RetryPolicy {
    /// Policy for periodic fetches: 1s base, 10s cap, 2 retries
    #[must_use]
    pub const fn polling() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            max_retries: 2,
            use_jitter: false,
        }
    }

    /// Policy for sending chat messages: 1s base, 30s cap, 3 retries
    #[must_use]
    pub const fn chat_send() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            max_retries: 3,
            use_jitter: false,
        }
    }

    /// Never retry
    #[must_use]
    pub const fn none() -> Self {
        Self {
            base_delay_ms: 0,
            max_delay_ms: 0,
            max_retries: 0,
            use_jitter: false,
        }
    }

    /// Delay before retry number `attempt` (0-indexed)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let capped = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);

        let delay_ms = if self.use_jitter {
            let jitter = rand::random::<f64>() * 0.25;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
            let jittered = (capped as f64 * (1.0 + jitter)) as u64;
            jittered
        } else {
            capped
        };

        Duration::from_millis(delay_ms)
    }

    /// Whether another retry is allowed after `retries_done` retries
    #[must_use]
    pub fn allows_retry(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }
}
