//! Bounded retry with exponential backoff.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::domain::entities::FailureDisposition;

/// Decides what happens to a job after a failed attempt.
///
/// A failure on the n-th delivery reschedules the job `base * 2^(n-1)` later,
/// capped at `max_delay`. A failure on delivery `max_attempts` or later
/// dead-letters the job instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(3600),
        }
    }
}

impl RetryPolicy {
    /// `attempt` is the 1-based delivery that just failed, as counted by the
    /// store at lease time.
    pub fn disposition(&self, attempt: i32, now: DateTime<Utc>) -> FailureDisposition {
        let attempts = attempt.max(1) as u32;
        if self.exhausted(attempt) {
            return FailureDisposition::DeadLetter;
        }

        let delay = self.delay_for(attempts);
        let delay = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::hours(1));
        FailureDisposition::RetryAt(now + delay)
    }

    /// True once `attempt` has reached the ceiling.
    pub fn exhausted(&self, attempt: i32) -> bool {
        attempt.max(1) as u32 >= self.max_attempts
    }

    /// Backoff after the `attempts`-th failure (1-based).
    pub fn delay_for(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}
