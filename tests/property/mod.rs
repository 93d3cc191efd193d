//! Property-based tests.
//!
//! Test organization:
//! - batch.rs: batch outcome policy and success rate
//! - dispatch.rs: recovery decisions are total and deterministic
//! - health.rs: every score stays in range
//! - retry.rs: attempt bound and backoff cap

mod batch;
mod dispatch;
mod retry;

use proptest::prelude::*;
use recovery_core::FailureClassification;

pub(crate) fn classification() -> impl Strategy<Value = FailureClassification> {
    prop_oneof![
        Just(FailureClassification::Timeout),
        Just(FailureClassification::Connection),
        Just(FailureClassification::Resource),
        Just(FailureClassification::Permission),
        Just(FailureClassification::Validation),
        Just(FailureClassification::Conflict),
        Just(FailureClassification::RateLimit),
        Just(FailureClassification::Unknown),
    ]
}
