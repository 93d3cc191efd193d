use super::config;
use recovery_batch::BatchProcessor;
use recovery_core::{Failure, FailureClassification, FailureCounters};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn items_are_retried_until_they_succeed() {
    let counters = Arc::new(FailureCounters::new());
    let attempts: Arc<Mutex<HashMap<String, usize>>> = Arc::default();
    let seen = Arc::clone(&attempts);
    let retries = Arc::new(AtomicUsize::new(0));
    let retried = Arc::clone(&retries);

    let processor = BatchProcessor::new(
        config(&counters)
            .max_retries_per_item(3)
            .on_item_retry(move |_, _, _| {
                retried.fetch_add(1, Ordering::SeqCst);
            })
            .build(),
    );

    let result = processor
        .process(vec!["a".to_string(), "b".to_string()], move |id: String| {
            let seen = Arc::clone(&seen);
            async move {
                let attempt = {
                    let mut attempts = seen.lock().unwrap();
                    let attempt = attempts.entry(id.clone()).or_insert(0);
                    *attempt += 1;
                    *attempt
                };
                if id == "b" && attempt < 3 {
                    Err(Failure::timeout("thumbnailer busy"))
                } else {
                    Ok(id)
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(result.successful_items, 2);
    assert_eq!(attempts.lock().unwrap()["b"], 3);
    assert_eq!(retries.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn exhausted_item_reports_attempts() {
    let counters = Arc::new(FailureCounters::new());
    let processor = BatchProcessor::new(
        config(&counters)
            .max_retries_per_item(3)
            .enable_partial_success(true)
            .build(),
    );

    let result = processor
        .process(vec![1u32, 2], |n| async move {
            if n == 2 {
                Err(Failure::connection("storage unreachable"))
            } else {
                Ok(n)
            }
        })
        .await
        .unwrap();

    let failed = &result.failed_results[0];
    assert_eq!(failed.item, 2);
    assert_eq!(failed.item_id, "2");
    assert_eq!(failed.attempts, 3);
    assert_eq!(failed.classification, FailureClassification::Connection);
    assert_eq!(failed.error, "storage unreachable");
}

#[tokio::test(start_paused = true)]
async fn panicking_item_counts_as_unknown_failure() {
    let counters = Arc::new(FailureCounters::new());
    let processor = BatchProcessor::new(
        config(&counters)
            .max_retries_per_item(2)
            .enable_partial_success(true)
            .build(),
    );

    let result = processor
        .process(vec![1u32, 2, 3], |n| async move {
            if n == 3 {
                panic!("renderer crashed");
            }
            Ok::<_, Failure>(n)
        })
        .await
        .unwrap();

    assert_eq!(result.successful_items, 2);
    assert_eq!(result.failed_results[0].classification, FailureClassification::Unknown);
    assert_eq!(result.failed_results[0].attempts, 2);
}

#[tokio::test]
async fn concurrency_is_bounded() {
    let counters = Arc::new(FailureCounters::new());
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let processor = BatchProcessor::new(config(&counters).max_concurrent_operations(2).build());

    let (running_op, peak_op) = (Arc::clone(&running), Arc::clone(&peak));
    processor
        .process((0u32..8).collect(), move |n| {
            let running = Arc::clone(&running_op);
            let peak = Arc::clone(&peak_op);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, Failure>(n)
            }
        })
        .await
        .unwrap();

    assert!(peak.load(Ordering::SeqCst) <= 2);
}
