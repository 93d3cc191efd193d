//! Batch processor tests.
//!
//! Test organization:
//! - thresholds.rs: the failure-rate policy and partial success
//! - retries.rs: per-item retry, panics and events
//! - blocking.rs: the worker pool adapter

mod blocking;
mod retries;
mod thresholds;

use recovery_batch::BatchConfigBuilder;
use recovery_core::{Failure, FailureCounters};
use std::sync::Arc;
use std::time::Duration;

pub(crate) fn config(counters: &Arc<FailureCounters>) -> BatchConfigBuilder {
    BatchConfigBuilder::new()
        .name("test")
        .initial_backoff(Duration::from_millis(10))
        .jitter(Duration::ZERO)
        .counters(Arc::clone(counters))
}

/// Fails every item whose number is below `failing`.
pub(crate) fn fail_below(failing: u32) -> impl Fn(u32) -> Result<u32, Failure> + Clone {
    move |n| {
        if n < failing {
            Err(Failure::validation(format!("item {n} rejected")))
        } else {
            Ok(n)
        }
    }
}
