use recovery_core::events::ResilienceEvent;
use recovery_core::FailureClassification;
use std::time::{Duration, Instant};

/// Events emitted by the retry engine.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// A retry is about to be made after `delay`.
    Retry {
        name: String,
        timestamp: Instant,
        attempt: usize,
        delay: Duration,
        classification: FailureClassification,
    },
    /// The operation succeeded, on the first try or after retries.
    Success {
        name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// A retryable failure hit the attempt limit and was propagated.
    Exhausted {
        name: String,
        timestamp: Instant,
        attempts: usize,
        classification: FailureClassification,
    },
    /// A non-retryable failure was propagated immediately.
    IgnoredError {
        name: String,
        timestamp: Instant,
        classification: FailureClassification,
    },
}

impl ResilienceEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Success { .. } => "success",
            RetryEvent::Exhausted { .. } => "exhausted",
            RetryEvent::IgnoredError { .. } => "ignored_error",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            RetryEvent::Retry { name, .. }
            | RetryEvent::Success { name, .. }
            | RetryEvent::Exhausted { name, .. }
            | RetryEvent::IgnoredError { name, .. } => name,
        }
    }
}
