//! Retry policy with capped exponential backoff.

use std::time::Duration;

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
  /// Uses a fixed delay between retries.
  Fixed {
    /// Delay between retries.
    delay: Duration,
  },
  /// Doubles the delay after every retry.
  ///
  /// The delay is calculated as `base * 2^retry`, capped at `max`.
  Exponential {
    /// The initial backoff duration.
    base: Duration,
    /// The maximum duration to wait between retries.
    max: Duration,
  },
}

impl Default for Backoff {
  fn default() -> Self {
    Self::Exponential { base: Duration::from_secs(1), max: Duration::from_secs(16) }
  }
}

impl Backoff {
  /// Delay to wait after the failure of retry number `retry` (0-based).
  pub fn delay(self, retry: u32) -> Duration {
    match self {
      Self::Fixed { delay } => delay,
      Self::Exponential { base, max } => {
        let scale = 2_f64.powi(retry.min(31) as i32);
        let seconds = (base.as_secs_f64() * scale).min(max.as_secs_f64());
        Duration::from_secs_f64(seconds)
      }
    }
  }
}

/// How many times a request is attempted and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
  /// Total attempts, including the first one.
  pub max_attempts: u32,
  pub backoff: Backoff,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_attempts: 5, backoff: Backoff::default() }
  }
}

impl RetryPolicy {
  /// Exponential policy with the given attempt budget and backoff bounds.
  pub fn exponential(max_attempts: u32, base: Duration, max: Duration) -> Self {
    Self { max_attempts: max_attempts.max(1), backoff: Backoff::Exponential { base, max } }
  }

  /// A single attempt, no waiting.
  pub fn no_retry() -> Self {
    Self { max_attempts: 1, backoff: Backoff::Fixed { delay: Duration::ZERO } }
  }

  /// Delay before attempt `attempt + 1`, where `attempt` is the 1-based
  /// number of the attempt that just failed.
  pub fn delay_after(&self, attempt: u32) -> Duration {
    self.backoff.delay(attempt.saturating_sub(1))
  }

  /// Whether another attempt is allowed after `attempt` failures.
  pub fn allows_retry_after(&self, attempt: u32) -> bool {
    attempt < self.max_attempts
  }
}
