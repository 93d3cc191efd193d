use recovery_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use std::time::Duration;

fn breaker(timeout: Duration) -> CircuitBreaker {
    CircuitBreaker::new(
        "slow",
        CircuitBreakerConfig::builder()
            .failure_threshold(1)
            .call_timeout(timeout)
            .build(),
    )
}

#[tokio::test(start_paused = true)]
async fn slow_call_times_out_and_counts_as_failure() {
    let breaker = breaker(Duration::from_millis(100));

    let error = breaker
        .call(|| async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<_, std::io::Error>(())
        })
        .await
        .unwrap_err();

    assert!(error.is_timeout());
    assert_eq!(error.to_string(), "call to 'slow' timed out after 100ms");
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[test]
fn blocking_call_is_checked_after_the_fact() {
    let breaker = breaker(Duration::from_millis(10));

    let error = breaker
        .call_blocking(|| {
            std::thread::sleep(Duration::from_millis(30));
            Ok::<_, std::io::Error>(())
        })
        .unwrap_err();

    assert!(error.is_timeout());
    assert_eq!(breaker.state(), CircuitState::Open);
}
