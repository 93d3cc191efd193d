use super::{config, fail_below};
use recovery_batch::BatchProcessor;
use recovery_core::FailureCounters;
use std::sync::Arc;

#[test]
fn blocking_adapter_applies_the_same_policy() {
    let counters = Arc::new(FailureCounters::new());
    let processor = BatchProcessor::new(
        config(&counters)
            .max_concurrent_operations(3)
            .max_retries_per_item(1)
            .enable_partial_success(false)
            .build(),
    );

    let passing = processor
        .process_blocking((0u32..10).collect(), fail_below(4))
        .unwrap();
    assert_eq!(passing.successful_items, 6);

    let failing = processor
        .process_blocking((0u32..10).collect(), fail_below(6))
        .unwrap_err();
    assert_eq!(failing.failed_item_ids().len(), 6);

    let stats = processor.stats();
    assert_eq!(stats.total_batches, 2);
    assert_eq!(stats.failed_batches, 1);
    assert_eq!(stats.total_items_processed, 20);
}

#[test]
fn blocking_adapter_survives_panics() {
    let counters = Arc::new(FailureCounters::new());
    let processor = BatchProcessor::new(
        config(&counters)
            .max_retries_per_item(1)
            .enable_partial_success(true)
            .build(),
    );

    let result = processor
        .process_blocking(vec![1u32, 2], |n| {
            if n == 2 {
                panic!("codec bug");
            }
            Ok::<_, recovery_core::Failure>(n)
        })
        .unwrap();

    assert_eq!(result.successful_items, 1);
    assert_eq!(result.failed_items, 1);
}
