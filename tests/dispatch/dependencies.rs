use super::{context, isolated};
use recovery_circuitbreaker::CircuitState;
use recovery_core::Failure;
use recovery_dispatch::{OperationCategory, RecoveryDispatcher, RecoveryStrategy, DEPENDENCY_KEY};
use serde_json::json;

#[test]
fn recorded_dependency_failures_open_the_breaker() {
    let dispatcher = RecoveryDispatcher::new(isolated().record_dependency_failures(true).build());
    let error = Failure::timeout("model timed out");

    for _ in 0..2 {
        let result = dispatcher.handle(&error, &context(), OperationCategory::ConversationTurn);
        assert_eq!(result.strategy_used(), RecoveryStrategy::RetryWithBackoff);
    }

    let result = dispatcher.handle(&error, &context(), OperationCategory::ConversationTurn);
    assert_eq!(result.strategy_used(), RecoveryStrategy::FallbackToDefault);
    assert!(result.fallback_used());
    assert!(result.error_message().is_some());

    let stats = dispatcher.get_recovery_stats();
    assert_eq!(stats.circuit_breakers["conversation"].state, CircuitState::Open);
}

#[test]
fn dependency_name_comes_from_context_metadata() {
    let dispatcher = RecoveryDispatcher::new(isolated().build());
    let context = context().with_metadata(DEPENDENCY_KEY, "image-api");

    dispatcher.handle(
        &Failure::connection("refused"),
        &context,
        OperationCategory::ContentGeneration,
    );

    let breakers = dispatcher.get_recovery_stats().circuit_breakers;
    assert!(breakers.contains_key("image-api"));
    assert!(!breakers.contains_key("content_generation"));
}

#[test]
fn open_breaker_uses_configured_fallback() {
    let dispatcher = RecoveryDispatcher::new(
        isolated()
            .fallback_value(
                OperationCategory::ConversationTurn,
                json!("Sorry, could you say that again?"),
            )
            .build(),
    );
    let registry = dispatcher.config().registry();
    let breaker = registry.get_or_create("conversation");
    for _ in 0..3 {
        breaker.record_failure();
    }

    let result = dispatcher.handle(
        &Failure::timeout("slow"),
        &context(),
        OperationCategory::ConversationTurn,
    );
    assert!(result.success());
    assert!(result.fallback_used());
    assert_eq!(result.result_data(), Some(&json!("Sorry, could you say that again?")));
}

#[test]
fn resource_exhaustion_in_generation_degrades() {
    let dispatcher = RecoveryDispatcher::new(isolated().build());
    let result = dispatcher.handle(
        &Failure::resource("GPU quota exceeded"),
        &context(),
        OperationCategory::ContentGeneration,
    );
    assert_eq!(result.strategy_used(), RecoveryStrategy::GracefulDegradation);
    assert!(result.fallback_used());
}

#[test]
fn breakers_are_only_read_by_default() {
    let dispatcher = RecoveryDispatcher::new(isolated().build());
    for _ in 0..5 {
        dispatcher.handle(
            &Failure::timeout("slow"),
            &context(),
            OperationCategory::DataExtraction,
        );
    }

    let stats = dispatcher.get_recovery_stats();
    assert_eq!(stats.circuit_breakers["data_extraction"].state, CircuitState::Closed);
    assert_eq!(stats.circuit_breakers["data_extraction"].failure_count, 0);
    assert_eq!(
        stats.count(OperationCategory::DataExtraction, RecoveryStrategy::RetryWithBackoff),
        5
    );
}

#[test]
fn recording_skips_a_breaker_that_is_not_closed() {
    let dispatcher = RecoveryDispatcher::new(isolated().record_dependency_failures(true).build());
    let breaker = dispatcher.config().registry().get_or_create("conversation");
    for _ in 0..3 {
        breaker.record_failure();
    }
    assert_eq!(breaker.get_stats().total_failures, 3);

    for _ in 0..4 {
        let result = dispatcher.handle(
            &Failure::timeout("slow"),
            &context(),
            OperationCategory::ConversationTurn,
        );
        assert_eq!(result.strategy_used(), RecoveryStrategy::FallbackToDefault);
    }
    assert_eq!(breaker.get_stats().total_failures, 3);
}
