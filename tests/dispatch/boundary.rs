use super::{context, dispatcher, isolated};
use recovery_core::{Failure, FailureClassification};
use recovery_dispatch::{OperationCategory, RecoveryDispatcher, RecoveryStrategy};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn async_boundary_returns_error_and_decision() {
    let dispatcher = dispatcher();
    let outcome: Result<(), _> = dispatcher
        .boundary(OperationCategory::IdentityCreation, &context(), async {
            Err(Failure::conflict("identifier already taken"))
        })
        .await;

    let error = outcome.unwrap_err();
    assert_eq!(error.classification(), FailureClassification::Conflict);
    assert_eq!(error.category(), OperationCategory::IdentityCreation);
    assert_eq!(error.recovery().strategy_used(), RecoveryStrategy::PromptUserRetry);

    let (inner, recovery) = error.into_parts();
    assert_eq!(inner.to_string(), "identifier already taken");
    assert!(recovery.user_action_required());
}

#[tokio::test]
async fn successful_boundary_records_nothing() {
    let dispatcher = dispatcher();
    let value = dispatcher
        .boundary(OperationCategory::SurveyIo, &context(), async {
            Ok::<_, Failure>(7)
        })
        .await
        .unwrap();

    assert_eq!(value, 7);
    assert_eq!(dispatcher.get_recovery_stats().total_recoveries(), 0);
}

#[test]
fn blocking_boundary_updates_statistics_and_events() {
    let decisions = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&decisions);
    let dispatcher = RecoveryDispatcher::new(
        isolated()
            .on_decision(move |category, classification, strategy| {
                recorded.lock().unwrap().push((category, classification, strategy));
            })
            .build(),
    );

    for _ in 0..2 {
        let _ = dispatcher.boundary_blocking(OperationCategory::Database, &context(), || {
            Err::<(), _>(Failure::connection("refused"))
        });
    }

    let stats = dispatcher.get_recovery_stats();
    assert_eq!(
        stats.count(OperationCategory::Database, RecoveryStrategy::RetryWithBackoff),
        2
    );
    assert_eq!(stats.error_counts[&FailureClassification::Connection], 2);
    assert_eq!(decisions.lock().unwrap().len(), 2);
    assert!(serde_json::to_value(&stats).is_ok());

    assert!(dispatcher.clear_error_stats() > 0);
    assert_eq!(dispatcher.get_recovery_stats().total_recoveries(), 0);
    assert_eq!(dispatcher.clear_error_stats(), 0);
}
