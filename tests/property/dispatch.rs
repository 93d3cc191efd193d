//! Property tests for recovery decisions.
//!
//! Invariants tested:
//! - Every (failure, category, attempt) gets a decision, the same one twice
//! - Rate limits, invalid input and permissions map to the same strategy in
//!   every category
//! - Result flags agree with the chosen strategy

use super::classification;
use proptest::prelude::*;
use recovery_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerRegistry};
use recovery_core::{ErrorContext, Failure, FailureClassification, FailureCounters};
use recovery_dispatch::{
    DispatcherConfig, OperationCategory, RecoveryDispatcher, RecoveryResult, RecoveryStrategy,
};
use std::sync::Arc;

fn dispatcher() -> RecoveryDispatcher {
    RecoveryDispatcher::new(
        DispatcherConfig::builder()
            .record_dependency_failures(false)
            .registry(Arc::new(CircuitBreakerRegistry::new(
                CircuitBreakerConfig::default(),
            )))
            .counters(Arc::new(FailureCounters::new()))
            .build(),
    )
}

fn category() -> impl Strategy<Value = OperationCategory> {
    prop::sample::select(OperationCategory::ALL.to_vec())
}

fn check_flags(result: &RecoveryResult) -> Result<(), TestCaseError> {
    if result.success() {
        prop_assert!(result.error_message().is_none());
    } else {
        prop_assert!(result.error_message().is_some());
    }
    prop_assert_eq!(
        result.user_action_required(),
        result.strategy_used() == RecoveryStrategy::PromptUserRetry
    );
    prop_assert_eq!(
        result.fallback_used(),
        matches!(
            result.strategy_used(),
            RecoveryStrategy::FallbackToDefault | RecoveryStrategy::GracefulDegradation
        )
    );
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn decisions_are_total_and_deterministic(
        class in classification(),
        message in "[a-z ]{0,40}",
        category in category(),
        retry_count in 0u32..10,
    ) {
        let dispatcher = dispatcher();
        let context = ErrorContext::new("op", "component").with_retry_count(retry_count);
        let failure = Failure::new(class, message);

        let first = dispatcher.handle(&failure, &context, category);
        let second = dispatcher.handle(&failure, &context, category);
        prop_assert_eq!(&first, &second);
        check_flags(&first)?;

        if first.strategy_used() == RecoveryStrategy::RetryWithBackoff {
            prop_assert_eq!(first.retry_count(), retry_count + 1);
        }
    }

    #[test]
    fn category_independent_rules(
        class in prop_oneof![
            Just(FailureClassification::RateLimit),
            Just(FailureClassification::Validation),
            Just(FailureClassification::Permission),
        ],
        category in category(),
    ) {
        let dispatcher = dispatcher();
        let context = ErrorContext::new("op", "component");
        let result = dispatcher.handle(&Failure::new(class, "failed"), &context, category);

        let expected = match class {
            FailureClassification::Permission => RecoveryStrategy::EscalateToAdmin,
            _ => RecoveryStrategy::PromptUserRetry,
        };
        prop_assert_eq!(result.strategy_used(), expected);
    }

    #[test]
    fn dependency_retries_stop_at_the_limit(
        category in prop::sample::select(vec![
            OperationCategory::DataExtraction,
            OperationCategory::ContentGeneration,
            OperationCategory::ConversationTurn,
        ]),
        retry_count in 0u32..10,
    ) {
        let dispatcher = dispatcher();
        let max = dispatcher.config().max_recovery_retries();
        let context = ErrorContext::new("op", "component").with_retry_count(retry_count);
        let result = dispatcher.handle(&Failure::timeout("timed out"), &context, category);

        prop_assert_eq!(
            result.strategy_used() == RecoveryStrategy::RetryWithBackoff,
            retry_count < max
        );
    }
}
