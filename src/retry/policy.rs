// src/retry/policy.rs

//! Retry policy: how many attempts, and how long to wait between them.

use std::time::Duration;

/// Policy governing one run of the retry loop.
///
/// The delay before the next attempt after `n` failures is
/// `base_delay * 2^n`, optionally capped at `max_delay`. With `n` counted
/// after the failure, the first wait is already `base_delay * 2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound on total attempts, including the first. Must be >= 1.
    pub max_attempts: u32,

    /// Base unit for exponential backoff. Zero disables waiting.
    pub base_delay: Duration,

    /// Optional cap on a single backoff delay. `None` means uncapped.
    pub max_delay: Option<Duration>,

    /// Optional per-attempt timeout. A timed-out attempt counts as a failure.
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: None,
            attempt_timeout: None,
        }
    }
}

impl RetryPolicy {
    /// Exponential policy with no cap and no timeout.
    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: None,
            attempt_timeout: None,
        }
    }

    /// Policy that retries immediately, without waiting.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::exponential(max_attempts, Duration::ZERO)
    }

    /// Cap every backoff delay at `max_delay`.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Abandon an attempt that runs longer than `timeout`.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Check the policy before any attempt is made.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts < 1 {
            return Err(format!(
                "max_attempts must be >= 1 (got {})",
                self.max_attempts
            ));
        }
        if let Some(timeout) = self.attempt_timeout {
            if timeout.is_zero() {
                return Err("attempt_timeout must be greater than zero".to_string());
            }
        }
        Ok(())
    }

    /// Delay to wait after `failures` failed attempts, before the next one.
    ///
    /// Saturates instead of overflowing for large failure counts.
    pub fn delay_after(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures);
        let delay = self.base_delay.saturating_mul(factor);
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }
}
