//! Bounded retry policy for conditional-write conflicts and transient
//! persistence failures. Shared by every service operation that writes.

use std::time::Duration;

use rand::Rng;

/// Doubling backoff with jitter, capped at a fixed number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 50,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
        }
    }

    /// Delay before the given retry (1-based attempt that just failed).
    /// Doubles per attempt, plus up to half the base as jitter so two
    /// conflicting sessions do not re-collide in lockstep.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self.base_delay_ms.saturating_mul(1u64 << exponent);
        let jitter = if self.base_delay_ms > 1 {
            rand::thread_rng().gen_range(0..self.base_delay_ms / 2)
        } else {
            0
        };
        Duration::from_millis(backoff.saturating_add(jitter))
    }

    /// Whether another attempt is allowed after `attempt` failures.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
