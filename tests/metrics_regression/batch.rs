//! Batch metrics regression tests

use super::helpers::*;
use recovery_batch::{BatchConfig, BatchProcessor};
use recovery_core::{Failure, FailureCounters};
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn batch_metrics_exist() {
    init_recorder();

    let processor = BatchProcessor::new(
        BatchConfig::builder()
            .name("test_batch")
            .max_retries_per_item(1)
            .initial_backoff(Duration::from_millis(1))
            .jitter(Duration::ZERO)
            .counters(Arc::new(FailureCounters::new()))
            .build(),
    );

    let result = processor
        .process(vec![1u32, 2, 3, 4], |n| async move {
            if n == 1 {
                Err(Failure::validation("rejected"))
            } else {
                Ok(n)
            }
        })
        .await;
    assert!(result.is_ok());

    assert_counter_exists("batch_runs_total");
    assert_metric_has_label("batch_runs_total", "batch", "test_batch");
    assert_metric_has_label("batch_runs_total", "outcome", "partial_success");

    assert_counter_exists("batch_items_total");
    assert_metric_has_label("batch_items_total", "outcome", "success");
    assert_metric_has_label("batch_items_total", "outcome", "failure");
}
