//! Retry metrics regression tests

use super::helpers::*;
use recovery_core::{Failure, FailureCounters};
use recovery_retry::{retry, RetryConfig};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn config(name: &str, max_retries: usize) -> RetryConfig {
    RetryConfig::builder()
        .name(name)
        .max_retries(max_retries)
        .initial_backoff(Duration::from_millis(1))
        .jitter(Duration::ZERO)
        .counters(Arc::new(FailureCounters::new()))
        .build()
}

#[tokio::test]
#[serial]
async fn retry_metrics_exist() {
    init_recorder();

    let config = config("test_retry", 3);
    let calls = Arc::new(AtomicUsize::new(0));
    let result = retry(
        || {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Failure::timeout("timed out"))
                } else {
                    Ok("done")
                }
            }
        },
        &config,
    )
    .await;
    assert!(result.is_ok());

    assert_counter_exists("retry_calls_total");
    assert_metric_has_label("retry_calls_total", "retry", "test_retry");
    assert_metric_has_label("retry_calls_total", "result", "success");

    assert_counter_exists("retry_attempts_total");
    assert_metric_has_label("retry_attempts_total", "retry", "test_retry");
}

#[tokio::test]
#[serial]
async fn retry_exhausted_and_ignored_metrics() {
    init_recorder();

    let exhausted = config("exhausted_retry", 1);
    let _ = retry(|| async { Err::<(), _>(Failure::connection("refused")) }, &exhausted).await;
    assert_metric_has_label("retry_calls_total", "result", "exhausted");

    let ignored = config("ignored_retry", 3);
    let _ = retry(|| async { Err::<(), _>(Failure::validation("bad")) }, &ignored).await;
    assert_metric_has_label("retry_calls_total", "result", "ignored");
}
