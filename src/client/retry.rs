//! Retry policy and the per-call retry state machine.
//!
//! ```text
//! Idle ──▶ Dispatched(1) ──▶ Success | TerminalFailure
//!               │
//!               └─ transient ──▶ BackoffWait(1, d) ──▶ Dispatched(2) ──▶ …
//!                                                       (up to max_attempts,
//!                                                        then TerminalFailure)
//! ```
//!
//! Backoff is linear: after attempt `n` the client waits `base_backoff * n`,
//! plus an optional random jitter. No wait follows the final attempt.
//!
//! Sleeping and jitter go through the [`Sleeper`] and [`Jitter`] traits so
//! tests can run the whole retry path instantly and deterministically.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// How many attempts a call gets and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Treated as at least 1.
    pub max_attempts: u32,
    /// Wait after attempt `n` is `base_backoff * n`.
    pub base_backoff: Duration,
    /// Upper bound of the random extra wait. Zero disables jitter.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_secs(5),
            max_jitter: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts,
            base_backoff,
            max_jitter: Duration::ZERO,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Linear backoff after the given (1-based) attempt, before jitter.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(attempt)
    }

    /// The wait before the next attempt, or `None` when `attempt` was the last.
    pub fn next_delay(&self, attempt: u32, jitter: &dyn Jitter) -> Option<Duration> {
        if attempt >= self.attempts() {
            return None;
        }
        let extra = if self.max_jitter.is_zero() {
            Duration::ZERO
        } else {
            jitter.jitter(self.max_jitter)
        };
        Some(self.backoff_after(attempt) + extra)
    }
}

/// Where a single logical request currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    /// Attempt `attempt` (1-based) is in flight.
    Dispatched { attempt: u32 },
    /// Attempt `attempt` failed transiently; waiting `delay` before the next.
    BackoffWait { attempt: u32, delay: Duration },
}

impl RetryState {
    /// The state after a transient failure in `Dispatched { attempt }`.
    ///
    /// `None` means retries are exhausted.
    pub fn after_transient(attempt: u32, policy: &RetryPolicy, jitter: &dyn Jitter) -> Option<Self> {
        policy
            .next_delay(attempt, jitter)
            .map(|delay| RetryState::BackoffWait { attempt, delay })
    }
}

/// Waits between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real time, via `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Source of the random extra wait.
pub trait Jitter: Send + Sync {
    /// A duration in `0..=max`.
    fn jitter(&self, max: Duration) -> Duration;
}

/// Uniform jitter from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn jitter(&self, max: Duration) -> Duration {
        let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

/// Always zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn jitter(&self, _max: Duration) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedJitter(Duration);

    impl Jitter for FixedJitter {
        fn jitter(&self, max: Duration) -> Duration {
            self.0.min(max)
        }
    }

    #[test]
    fn linear_backoff() {
        let p = RetryPolicy::new(4, Duration::from_secs(5));
        assert_eq!(p.next_delay(1, &NoJitter), Some(Duration::from_secs(5)));
        assert_eq!(p.next_delay(2, &NoJitter), Some(Duration::from_secs(10)));
        assert_eq!(p.next_delay(3, &NoJitter), Some(Duration::from_secs(15)));
        assert_eq!(p.next_delay(4, &NoJitter), None);
    }

    #[test]
    fn zero_attempts_means_one() {
        let p = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(p.attempts(), 1);
        assert_eq!(p.next_delay(1, &NoJitter), None);
    }

    #[test]
    fn jitter_is_added_and_bounded() {
        let p = RetryPolicy {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
            max_jitter: Duration::from_millis(50),
        };
        let d = p.next_delay(1, &FixedJitter(Duration::from_millis(500))).unwrap();
        assert_eq!(d, Duration::from_millis(150));

        for _ in 0..100 {
            let d = p.next_delay(2, &RandomJitter).unwrap();
            assert!(d >= Duration::from_millis(200) && d <= Duration::from_millis(250));
        }
    }

    #[test]
    fn jitter_ignored_when_disabled() {
        let p = RetryPolicy::new(2, Duration::from_millis(100));
        let d = p.next_delay(1, &FixedJitter(Duration::from_millis(40))).unwrap();
        assert_eq!(d, Duration::from_millis(100));
    }

    #[test]
    fn transitions() {
        let p = RetryPolicy::new(2, Duration::from_secs(1));
        assert_eq!(
            RetryState::after_transient(1, &p, &NoJitter),
            Some(RetryState::BackoffWait {
                attempt: 1,
                delay: Duration::from_secs(1)
            })
        );
        assert_eq!(RetryState::after_transient(2, &p, &NoJitter), None);
    }

    #[test]
    fn tokio_sleeper_sleeps() {
        tokio_test::block_on(async {
            let start = std::time::Instant::now();
            TokioSleeper.sleep(Duration::from_millis(5)).await;
            assert!(start.elapsed() >= Duration::from_millis(5));
        });
    }
}
