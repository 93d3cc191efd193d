use recovery_core::{Failure, FailureCounters};
use recovery_retry::{RetryConfig, RetryLayer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{Layer, Service, ServiceExt};

#[tokio::test(start_paused = true)]
async fn layer_retries_inner_service() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let inner = tower::service_fn(move |request: String| {
        let call = counted.fetch_add(1, Ordering::SeqCst);
        async move {
            if call == 0 {
                Err(Failure::timeout("first call times out"))
            } else {
                Ok(request.to_uppercase())
            }
        }
    });

    let layer = RetryLayer::new(
        RetryConfig::network()
            .initial_backoff(Duration::from_millis(10))
            .counters(Arc::new(FailureCounters::new()))
            .build(),
    );
    let mut service = layer.layer(inner);

    let response = service
        .ready()
        .await
        .unwrap()
        .call("hello".to_string())
        .await
        .unwrap();

    assert_eq!(response, "HELLO");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn layer_propagates_last_error() {
    let inner = tower::service_fn(|_: ()| async { Err::<(), _>(Failure::connection("refused")) });
    let counters = Arc::new(FailureCounters::new());
    let mut service = RetryConfig::builder()
        .max_retries(2)
        .initial_backoff(Duration::from_millis(5))
        .counters(Arc::clone(&counters))
        .build()
        .layer()
        .layer(inner);

    let error = service.ready().await.unwrap().call(()).await.unwrap_err();
    assert_eq!(error.to_string(), "refused");
    assert_eq!(counters.retry_exhaustions(), 1);
}
