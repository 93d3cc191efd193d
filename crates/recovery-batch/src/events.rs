use crate::outcome::BatchOutcome;
use recovery_core::events::ResilienceEvent;
use recovery_core::FailureClassification;
use std::time::{Duration, Instant};

/// Events emitted by the batch processor.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// An item failed an attempt and will be tried again after `delay`.
    ItemRetry {
        name: String,
        timestamp: Instant,
        item_id: String,
        attempt: usize,
        delay: Duration,
    },
    /// An item used up its attempts.
    ItemFailed {
        name: String,
        timestamp: Instant,
        item_id: String,
        attempts: usize,
        classification: FailureClassification,
    },
    /// A batch finished.
    Completed {
        name: String,
        timestamp: Instant,
        total: usize,
        successful: usize,
        outcome: BatchOutcome,
    },
}

impl ResilienceEvent for BatchEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BatchEvent::ItemRetry { .. } => "item_retry",
            BatchEvent::ItemFailed { .. } => "item_failed",
            BatchEvent::Completed { .. } => "completed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BatchEvent::ItemRetry { timestamp, .. }
            | BatchEvent::ItemFailed { timestamp, .. }
            | BatchEvent::Completed { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            BatchEvent::ItemRetry { name, .. }
            | BatchEvent::ItemFailed { name, .. }
            | BatchEvent::Completed { name, .. } => name,
        }
    }
}
