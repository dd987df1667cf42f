//! Bounded retry schedule for timed-out model calls.

use backon::{BackoffBuilder, ExponentialBuilder};
use std::time::Duration;

/// Delay before the first retry.
pub const BASE_DELAY: Duration = Duration::from_secs(1);

/// Ceiling on a single backoff sleep.
const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Exponential backoff with no jitter: retry `n` (0-indexed) waits
/// `BASE_DELAY * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: BASE_DELAY,
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Sleeps between attempts, one per retry.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_factor(2.0)
            .with_max_delay(MAX_DELAY)
            .with_max_times(self.max_retries as usize)
            .build()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}
