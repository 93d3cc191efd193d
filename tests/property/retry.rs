//! Property tests for the retry engine.
//!
//! Invariants tested:
//! - An always-failing operation runs exactly max_retries + 1 times
//! - A non-retryable failure runs once
//! - Backoff never exceeds max + jitter

use proptest::prelude::*;
use recovery_core::{Failure, FailureCounters};
use recovery_retry::{retry_blocking, ExponentialJitterBackoff, RetryConfig};
use std::sync::Arc;
use std::time::Duration;

fn config(max_retries: usize) -> RetryConfig {
    RetryConfig::builder()
        .max_retries(max_retries)
        .initial_backoff(Duration::ZERO)
        .max_backoff(Duration::ZERO)
        .jitter(Duration::ZERO)
        .counters(Arc::new(FailureCounters::new()))
        .build()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn attempts_are_bounded(max_retries in 0usize..8) {
        let config = config(max_retries);
        let mut calls = 0;
        let result: Result<(), Failure> = retry_blocking(
            || {
                calls += 1;
                Err(Failure::timeout("timed out"))
            },
            &config,
        );

        prop_assert!(result.is_err());
        prop_assert_eq!(calls, max_retries + 1);
        prop_assert_eq!(config.counters().retry_exhaustions(), 1);
    }

    #[test]
    fn non_retryable_failures_run_once(max_retries in 0usize..8) {
        let config = config(max_retries);
        let mut calls = 0;
        let result: Result<(), Failure> = retry_blocking(
            || {
                calls += 1;
                Err(Failure::validation("bad input"))
            },
            &config,
        );

        prop_assert!(result.is_err());
        prop_assert_eq!(calls, 1);
    }

    #[test]
    fn backoff_is_capped(
        initial_ms in 1u64..1_000,
        max_ms in 1u64..60_000,
        jitter_ms in 0u64..1_000,
        attempt in 0usize..100,
    ) {
        let max = Duration::from_millis(max_ms);
        let jitter = Duration::from_millis(jitter_ms);
        let backoff = ExponentialJitterBackoff::new(Duration::from_millis(initial_ms), max)
            .with_jitter(jitter);

        let base = backoff.base_delay(attempt);
        prop_assert!(base <= max + Duration::from_micros(1));
        prop_assert!(backoff.next_interval(attempt) <= max + jitter + Duration::from_micros(1));
    }
}
