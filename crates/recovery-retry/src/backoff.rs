//! Backoff computation shared by every retry loop in the workspace.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff with a cap and additive uniform jitter.
///
/// The delay before retry number `attempt` (0-based) is
/// `min(initial × 2^attempt, max) + U(0, jitter)`.
///
/// # Example
///
/// ```rust
/// use recovery_retry::ExponentialJitterBackoff;
/// use std::time::Duration;
///
/// let backoff = ExponentialJitterBackoff::new(Duration::from_millis(100), Duration::from_secs(1));
/// assert_eq!(backoff.base_delay(0), Duration::from_millis(100));
/// assert_eq!(backoff.base_delay(3), Duration::from_millis(800));
/// assert_eq!(backoff.base_delay(10), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialJitterBackoff {
    initial: Duration,
    max: Duration,
    jitter: Duration,
}

impl ExponentialJitterBackoff {
    /// Creates a backoff without jitter.
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            jitter: Duration::ZERO,
        }
    }

    /// Sets the upper bound of the uniformly distributed jitter.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn initial(&self) -> Duration {
        self.initial
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    /// The capped exponential part of the delay, without jitter.
    pub fn base_delay(&self, attempt: usize) -> Duration {
        let exponent = attempt.min(64) as i32;
        let secs = self.initial.as_secs_f64() * 2f64.powi(exponent);
        let capped = secs.min(self.max.as_secs_f64());
        // the f64 form of a near-maximal cap can round past what Duration holds
        Duration::try_from_secs_f64(capped.max(0.0)).unwrap_or(self.max)
    }

    /// The full delay for `attempt`, jitter included.
    pub fn next_interval(&self, attempt: usize) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter.is_zero() {
            return base;
        }
        let extra = rand::rng().random_range(0.0..=self.jitter.as_secs_f64());
        let extra = Duration::try_from_secs_f64(extra).unwrap_or(self.jitter);
        base.saturating_add(extra)
    }
}
