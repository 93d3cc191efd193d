//! Property tests for the batch outcome policy.
//!
//! Invariants tested:
//! - A batch without failures always succeeds
//! - Partial success only appears when enabled
//! - Without partial success, failure follows the threshold exactly
//! - The success rate is a percentage

use proptest::prelude::*;
use recovery_batch::{success_rate, BatchConfig, BatchOutcome};

fn config(threshold: f64, partial: bool) -> BatchConfig {
    BatchConfig::builder()
        .failure_threshold_percentage(threshold)
        .enable_partial_success(partial)
        .build()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn no_failures_means_success(
        successful in 0usize..500,
        threshold in 0.0f64..=100.0,
        partial in any::<bool>(),
    ) {
        let outcome = BatchOutcome::decide(successful, 0, &config(threshold, partial));
        prop_assert_eq!(outcome, BatchOutcome::Success);
    }

    #[test]
    fn partial_success_requires_opt_in(
        successful in 0usize..500,
        failed in 0usize..500,
        threshold in 0.0f64..=100.0,
    ) {
        let outcome = BatchOutcome::decide(successful, failed, &config(threshold, false));
        prop_assert_ne!(outcome, BatchOutcome::PartialSuccess);

        let expected_failed = successful + failed > 0
            && success_rate(successful, successful + failed) < 100.0 - threshold;
        prop_assert_eq!(outcome == BatchOutcome::Failed, expected_failed);
    }

    #[test]
    fn mixed_batches_are_partial_when_enabled(
        successful in 1usize..500,
        failed in 1usize..500,
        threshold in 0.0f64..=100.0,
    ) {
        let outcome = BatchOutcome::decide(successful, failed, &config(threshold, true));
        prop_assert_eq!(outcome, BatchOutcome::PartialSuccess);
    }

    #[test]
    fn success_rate_is_a_percentage(successful in 0usize..1000, extra in 0usize..1000) {
        let rate = success_rate(successful, successful + extra);
        prop_assert!((0.0..=100.0).contains(&rate));
        if extra == 0 && successful > 0 {
            prop_assert_eq!(rate, 100.0);
        }
    }
}
