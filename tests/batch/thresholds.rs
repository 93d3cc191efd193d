use super::{config, fail_below};
use recovery_batch::{BatchError, BatchProcessor};
use recovery_core::{FailureClassification, FailureCounters};
use std::sync::Arc;

fn processor(counters: &Arc<FailureCounters>, partial: bool) -> BatchProcessor {
    BatchProcessor::new(
        config(counters)
            .max_retries_per_item(1)
            .failure_threshold_percentage(50.0)
            .enable_partial_success(partial)
            .build(),
    )
}

#[tokio::test]
async fn forty_percent_success_fails_without_partial_handling() {
    let counters = Arc::new(FailureCounters::new());
    let operation = fail_below(6);

    let error = processor(&counters, false)
        .process((0..10).collect(), move |n| {
            let operation = operation.clone();
            async move { operation(n) }
        })
        .await
        .unwrap_err();

    match error {
        BatchError::Failed {
            total,
            failed_items,
            ..
        } => {
            assert_eq!(total, 10);
            assert_eq!(failed_items.len(), 6);
            assert!(failed_items
                .iter()
                .all(|failure| failure.classification == FailureClassification::Validation));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(counters.snapshot().processing_failures, 6);
}

#[tokio::test]
async fn sixty_percent_success_does_not_fail() {
    let counters = Arc::new(FailureCounters::new());
    let operation = fail_below(4);

    let result = processor(&counters, false)
        .process((0..10).collect(), move |n| {
            let operation = operation.clone();
            async move { operation(n) }
        })
        .await
        .unwrap();

    assert_eq!(result.successful_items, 6);
    assert_eq!(result.failed_items, 4);
    assert!((result.success_rate - 60.0).abs() < 1e-9);
    assert!(!result.partial_success);
    assert_eq!(result.error_summary[&FailureClassification::Validation], 4);
}

#[tokio::test]
async fn partial_success_accepts_low_success_rates() {
    let counters = Arc::new(FailureCounters::new());
    let operation = fail_below(8);
    let processor = processor(&counters, true);

    let result = processor
        .process((0..10).collect(), move |n| {
            let operation = operation.clone();
            async move { operation(n) }
        })
        .await
        .unwrap();

    assert!(result.partial_success);
    assert_eq!(result.successful_items, 2);
    let mut ids: Vec<_> = result.failed_results.iter().map(|f| f.item).collect();
    ids.sort();
    assert_eq!(ids, (0..8).collect::<Vec<u32>>());

    let stats = processor.stats();
    assert_eq!(stats.partial_success_batches, 1);
    assert_eq!(stats.total_items_failed, 8);
}

#[tokio::test]
async fn nothing_succeeding_fails_even_with_partial_handling() {
    let counters = Arc::new(FailureCounters::new());
    let operation = fail_below(100);

    let error = processor(&counters, true)
        .process(vec![1u32, 2, 3], move |n| {
            let operation = operation.clone();
            async move { operation(n) }
        })
        .await
        .unwrap_err();

    let mut ids = error.failed_item_ids();
    ids.sort();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn empty_batch_is_a_success() {
    let counters = Arc::new(FailureCounters::new());
    let result = processor(&counters, false)
        .process(Vec::<u32>::new(), |n| async move { Ok::<_, recovery_core::Failure>(n) })
        .await
        .unwrap();

    assert_eq!(result.total_items, 0);
    assert_eq!(result.success_rate, 0.0);
    assert!(!result.partial_success);
}
