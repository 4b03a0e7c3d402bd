//! Reconnect delay policy for the stream supervisor.
//!
//! Delay for attempt `n` is `min(base * 2^n, max)`, shortened by a random
//! fraction of at most `jitter`. Jitter only ever subtracts, so the ceiling
//! holds. With `jitter < 0.5` a shaved delay still exceeds the previous
//! ceiling, so consecutive delays keep growing until they reach it.

use std::time::Duration;

/// Largest jitter fraction that keeps delays strictly increasing.
pub const MAX_JITTER: f64 = 0.49;

#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
    /// Fraction of each delay that may be randomly shaved off, at most `MAX_JITTER`
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max: Duration::from_secs(60),
            jitter: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    attempt: u32,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Reconnects scheduled since the last healthy connection.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Un-jittered delay for the current attempt.
    pub fn ceiling_delay(&self) -> Duration {
        let factor = 2u32.checked_pow(self.attempt).unwrap_or(u32::MAX);
        self.policy
            .base
            .checked_mul(factor)
            .unwrap_or(self.policy.max)
            .min(self.policy.max)
    }

    /// Delay before the next reconnect; advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.ceiling_delay();
        self.attempt = self.attempt.saturating_add(1);

        if self.policy.jitter <= 0.0 {
            return delay;
        }
        let jitter = self.policy.jitter.clamp(0.0, MAX_JITTER);
        delay.saturating_sub(delay.mul_f64(jitter * fastrand::f64()))
    }
}
