//! Backoff policy for status polling after transient failures.
//!
//! A failed status request does not stop polling. Each consecutive failure
//! stretches the wait before the next attempt, a successful response resets
//! it to the base interval, and an optional bound makes the poller give up.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
    /// Consecutive failures tolerated before giving up; `None` polls forever.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_consecutive_failures: Some(10),
        }
    }
}

impl RetryPolicy {
    pub fn gives_up_after(&self, failures: u32) -> bool {
        self.max_consecutive_failures
            .is_some_and(|limit| failures >= limit)
    }
}

/// Calculate the next backoff delay from the current delay and policy.
///
/// The result is clamped to [`RetryPolicy::max_delay`].
pub fn next_delay(current: Duration, policy: &RetryPolicy) -> Duration {
    let multiplier = policy.multiplier.max(1.0);
    let next_ms = (current.as_millis() as f64 * multiplier) as u64;
    Duration::from_millis(next_ms).min(policy.max_delay)
}
