use super::{context, isolated};
use recovery_core::{Failure, FailureCounters};
use recovery_dispatch::{OperationCategory, RecoveryDispatcher, RecoveryStrategy};
use recovery_retry::{retry, RetryConfig};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn retry_exhausted_then_fallback() {
    let counters = Arc::new(FailureCounters::new());
    let config = RetryConfig::builder()
        .max_retries(3)
        .initial_backoff(Duration::from_millis(100))
        .counters(Arc::clone(&counters))
        .build();
    let calls = AtomicUsize::new(0);

    let error = retry(
        || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<String, _>(Failure::timeout("reply generation timed out")) }
        },
        &config,
    )
    .await
    .unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(counters.retry_exhaustions(), 1);

    let dispatcher = RecoveryDispatcher::new(
        isolated()
            .record_dependency_failures(false)
            .counters(Arc::clone(&counters))
            .build(),
    );
    let result = dispatcher.handle(
        &error,
        &context().with_retry_count(3),
        OperationCategory::ConversationTurn,
    );

    assert_eq!(result.strategy_used(), RecoveryStrategy::FallbackToDefault);
    assert_eq!(result.retry_count(), 3);
    assert!(result.fallback_used());
    assert!(!result.success());
    assert!(result.error_message().is_some());
}

#[tokio::test(start_paused = true)]
async fn retry_then_succeed_needs_no_recovery() {
    let counters = Arc::new(FailureCounters::new());
    let config = RetryConfig::network().counters(Arc::clone(&counters)).build();
    let calls = AtomicUsize::new(0);

    let reply = retry(
        || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(Failure::connection("reset by peer"))
                } else {
                    Ok("hello")
                }
            }
        },
        &config,
    )
    .await
    .unwrap();

    assert_eq!(reply, "hello");
    assert_eq!(counters.retry_exhaustions(), 0);
}

#[test]
fn extraction_exhausted_without_fallback_is_skipped() {
    let dispatcher = RecoveryDispatcher::new(isolated().build());
    let result =
        dispatcher.retry_or_fallback(&context().with_retry_count(3), OperationCategory::DataExtraction);

    assert_eq!(result.strategy_used(), RecoveryStrategy::SkipOptionalStep);
    assert!(result.success());
    assert_eq!(result.retry_count(), 3);
}

#[test]
fn extraction_exhausted_with_fallback_uses_it() {
    let dispatcher = RecoveryDispatcher::new(
        isolated()
            .fallback_value(OperationCategory::DataExtraction, json!({ "hobbies": [] }))
            .build(),
    );
    let result =
        dispatcher.retry_or_fallback(&context().with_retry_count(3), OperationCategory::DataExtraction);

    assert_eq!(result.strategy_used(), RecoveryStrategy::FallbackToDefault);
    assert!(result.success());
    assert_eq!(result.result_data(), Some(&json!({ "hobbies": [] })));
}

#[test]
fn retries_below_limit_carry_next_attempt_number() {
    let dispatcher = RecoveryDispatcher::new(isolated().max_recovery_retries(2).build());

    let first = dispatcher.retry_or_fallback(&context(), OperationCategory::ContentGeneration);
    assert_eq!(first.strategy_used(), RecoveryStrategy::RetryWithBackoff);
    assert_eq!(first.retry_count(), 1);

    let last = dispatcher.retry_or_fallback(
        &context().with_retry_count(2),
        OperationCategory::ContentGeneration,
    );
    assert_eq!(last.strategy_used(), RecoveryStrategy::FallbackToDefault);
}
