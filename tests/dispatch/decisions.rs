use super::{context, dispatcher, isolated};
use recovery_core::{Failure, FailureClassification, FailureClassifier};
use recovery_dispatch::{OperationCategory, RecoveryDispatcher, RecoveryStrategy};
use serde_json::json;
use std::io;
use std::sync::Arc;

#[test]
fn rate_limits_ask_the_user_to_wait() {
    let result = dispatcher().handle(
        &Failure::rate_limited("429"),
        &context(),
        OperationCategory::ConversationTurn,
    );
    assert_eq!(result.strategy_used(), RecoveryStrategy::PromptUserRetry);
    assert!(result.user_action_required());
    assert!(!result.recovery_suggestions().is_empty());
}

#[test]
fn validation_suggestions_depend_on_category() {
    let dispatcher = dispatcher();
    let identity = dispatcher.handle(
        &Failure::validation("bad identifier"),
        &context(),
        OperationCategory::IdentityCreation,
    );
    let survey = dispatcher.handle(
        &Failure::validation("bad answer"),
        &context(),
        OperationCategory::SurveyIo,
    );

    assert_eq!(identity.strategy_used(), RecoveryStrategy::PromptUserRetry);
    assert_eq!(survey.strategy_used(), RecoveryStrategy::PromptUserRetry);
    assert_ne!(identity.recovery_suggestions(), survey.recovery_suggestions());
}

#[test]
fn permission_failures_escalate_in_every_category() {
    let dispatcher = dispatcher();
    for category in OperationCategory::ALL {
        let result = dispatcher.handle(&Failure::permission("denied"), &context(), category);
        assert_eq!(
            result.strategy_used(),
            RecoveryStrategy::EscalateToAdmin,
            "category {category}"
        );
        assert!(!result.success());
    }
}

#[test]
fn missing_resource_falls_back() {
    let dispatcher = RecoveryDispatcher::new(
        isolated()
            .fallback_value(OperationCategory::SurveyIo, json!({ "questions": [] }))
            .build(),
    );
    let error = io::Error::new(io::ErrorKind::NotFound, "survey.yaml");

    let result = dispatcher.handle(&error, &context(), OperationCategory::SurveyIo);
    assert_eq!(result.strategy_used(), RecoveryStrategy::FallbackToDefault);
    assert!(result.fallback_used());
    assert!(result.success());
    assert_eq!(result.result_data(), Some(&json!({ "questions": [] })));
}

#[test]
fn storage_rules() {
    let dispatcher = dispatcher();

    let retried = dispatcher.handle(
        &Failure::connection("connection refused"),
        &context().with_retry_count(1),
        OperationCategory::ConsentCollection,
    );
    assert_eq!(retried.strategy_used(), RecoveryStrategy::RetryWithBackoff);
    assert_eq!(retried.retry_count(), 2);

    let constraint = dispatcher.handle(
        &Failure::message("check constraint failed on answers"),
        &context(),
        OperationCategory::Database,
    );
    assert_eq!(constraint.strategy_used(), RecoveryStrategy::PromptUserRetry);

    let unknown = dispatcher.handle(
        &Failure::message("segfault in driver"),
        &context(),
        OperationCategory::Database,
    );
    assert_eq!(unknown.strategy_used(), RecoveryStrategy::EscalateToAdmin);
}

#[test]
fn handle_database_error_matches_database_category() {
    let dispatcher = dispatcher();
    let error = Failure::timeout("statement timed out");
    let direct = dispatcher.handle_database_error(&error, &context());
    assert_eq!(direct.strategy_used(), RecoveryStrategy::RetryWithBackoff);
    assert_eq!(direct.retry_count(), 1);
}

#[test]
fn decisions_are_deterministic() {
    let dispatcher = dispatcher();
    let error = Failure::validation("bad consent");
    let first = dispatcher.handle(&error, &context(), OperationCategory::ConsentCollection);
    let second = dispatcher.handle(&error, &context(), OperationCategory::ConsentCollection);
    assert_eq!(first, second);
}

#[test]
fn panicking_classifier_escalates() {
    let classifier = FailureClassifier::new().with_type_rule(|_| panic!("rule bug"));
    let failures = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counted = Arc::clone(&failures);
    let dispatcher = RecoveryDispatcher::new(
        isolated()
            .classifier(Arc::new(classifier))
            .on_policy_failure(move |_| {
                counted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            })
            .build(),
    );

    let result = dispatcher.handle(&Failure::timeout("x"), &context(), OperationCategory::Database);
    assert_eq!(result.strategy_used(), RecoveryStrategy::EscalateToAdmin);
    assert_eq!(failures.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(
        dispatcher.get_recovery_stats().error_counts[&FailureClassification::Unknown],
        1
    );
}
