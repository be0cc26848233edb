//! Bounded exponential backoff with jitter
//!
//! The delay for retry `n` (0-based) is `min(initial * 2^n, max)`. Jitter removes a
//! random fraction of that value, so a jittered delay never exceeds the cap and with
//! jitter 0 the sequence is exact.
//!
//! ```
//! use pbi_export::core::export::backoff::BackoffPolicy;
//! use std::time::Duration;
//!
//! let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(5), 0.0);
//! let delays: Vec<u64> = (0..5).map(|n| policy.delay(n).as_secs()).collect();
//! assert_eq!(delays, vec![1, 2, 4, 5, 5]);
//! ```

use crate::config::{BackoffConfig, PollConfig};
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
    /// Fraction in `[0, 1)` that may be subtracted from each delay
    pub jitter: f64,
}

impl BackoffPolicy {
    pub fn new(initial: Duration, max: Duration, jitter: f64) -> Self {
        Self {
            initial,
            max: max.max(initial),
            jitter: jitter.clamp(0.0, 0.99),
        }
    }

    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.jitter,
        )
    }

    pub fn from_poll_config(config: &PollConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_interval_ms),
            Duration::from_millis(config.max_interval_ms),
            config.jitter,
        )
    }

    /// Un-jittered delay for retry `attempt`
    pub fn ceiling(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.initial.checked_mul(factor))
            .map_or(self.max, |delay| delay.min(self.max))
    }

    /// Jittered delay for retry `attempt`
    pub fn delay(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt);
        if self.jitter <= 0.0 {
            return ceiling;
        }
        let fraction = rand::thread_rng().gen_range(0.0..self.jitter);
        ceiling.mul_f64(1.0 - fraction)
    }

    /// Raise a delay to a server hint (`Retry-After`), still capped
    pub fn honour_hint(&self, delay: Duration, hint: Option<Duration>) -> Duration {
        match hint {
            Some(hint) => delay.max(hint).min(self.max),
            None => delay,
        }
    }
}

/// Stateful cursor over a policy's delays
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    attempt: u32,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Delay before the next attempt; advances the cursor
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.policy.delay(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}
