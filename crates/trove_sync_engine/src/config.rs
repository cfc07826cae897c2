//! Configuration for the sync coordinator.

use std::time::Duration;

/// Configuration for sync behavior.
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Retry policy for failed queue entries.
    pub retry: RetryPolicy,
}

impl SyncConfig {
    /// Creates a configuration with the default retry policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Retry policy for queue entries that fail their remote call.
///
/// Each failure increments the entry's retry counter and requeues it behind
/// a backoff gate; once the counter reaches `max_attempts` the entry is
/// dropped and its item marked `Abandoned`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum remote attempts per entry before it is abandoned.
    pub max_attempts: u32,
    /// Backoff delay after the first failure.
    pub initial_delay: Duration,
    /// Upper bound on the backoff delay.
    pub max_delay: Duration,
    /// Multiplier applied per additional failure.
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Creates a policy with the given attempt ceiling and default delays.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5 * 60),
            backoff_multiplier: 2.0,
        }
    }

    /// A policy that never retries: the first failure abandons the entry.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// The backoff delay before retry number `attempt` (1-indexed: the
    /// first retry is attempt 1).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        Duration::from_secs_f64(base.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5)
    }
}
