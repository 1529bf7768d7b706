//! Exponential backoff with optional jitter for the live-channel reconnect
//! policy.

use std::time::Duration;

use rand::Rng;

/// Jitter strategy applied to each delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Jitter {
    /// Always return the capped exponential delay.
    None,
    /// Return a random delay in `[0, capped_delay]`.
    Full,
}

#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<u32>,
    jitter: Jitter,
    attempt: u32,
}

impl ExponentialBackoff {
    /// `max_attempts` of 0 means unlimited attempts.
    pub fn new(base_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts: if max_attempts == 0 {
                None
            } else {
                Some(max_attempts)
            },
            jitter: Jitter::Full,
            attempt: 0,
        }
    }

    /// Override the jitter strategy (defaults to `Full`).
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Next delay in the sequence, or `None` once the attempt budget is
    /// exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| self.attempt >= max) {
            return None;
        }

        let base_ms = self.base_delay.as_millis() as u128;
        let max_ms = self.max_delay.as_millis() as u128;
        let shift = self.attempt.min(63);
        let multiplier = 1u128.checked_shl(shift).unwrap_or(u128::MAX);
        let capped_ms = std::cmp::min(base_ms.saturating_mul(multiplier), max_ms);

        let delay_ms = match self.jitter {
            Jitter::None => capped_ms,
            Jitter::Full => {
                let capped = capped_ms.min(u64::MAX as u128) as u64;
                rand::thread_rng().gen_range(0..=capped) as u128
            }
        };

        self.attempt = self.attempt.saturating_add(1);
        Some(Duration::from_millis(delay_ms.min(u64::MAX as u128) as u64))
    }

    /// Reset the attempt counter after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
