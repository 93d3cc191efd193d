use super::{breaker, fail};
use recovery_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test]
async fn closes_after_successful_trial() {
    let breaker = breaker(2, Duration::from_millis(50));
    fail(&breaker).await;
    fail(&breaker).await;
    assert_eq!(breaker.state(), CircuitState::Open);

    tokio::time::sleep(Duration::from_millis(80)).await;

    let value = breaker
        .call(|| async { Ok::<_, std::io::Error>("recovered") })
        .await
        .unwrap();
    assert_eq!(value, "recovered");
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[tokio::test]
async fn failed_trial_reopens() {
    let breaker = breaker(1, Duration::from_millis(50));
    fail(&breaker).await;

    tokio::time::sleep(Duration::from_millis(80)).await;
    fail(&breaker).await;
    assert_eq!(breaker.state(), CircuitState::Open);

    let rejected = breaker
        .call(|| async { Ok::<_, std::io::Error>(()) })
        .await;
    assert!(rejected.unwrap_err().is_circuit_open());
}

#[tokio::test]
async fn stays_open_before_recovery_timeout() {
    let breaker = breaker(1, Duration::from_secs(60));
    fail(&breaker).await;

    let rejected = breaker
        .call(|| async { Ok::<_, std::io::Error>(()) })
        .await;
    assert!(rejected.unwrap_err().is_circuit_open());
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[tokio::test]
async fn success_threshold_requires_consecutive_trials() {
    let transitions = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&transitions);
    let breaker = CircuitBreaker::new(
        "trials",
        CircuitBreakerConfig::builder()
            .failure_threshold(1)
            .success_threshold(2)
            .recovery_timeout(Duration::from_millis(50))
            .on_state_transition(move |from, to| recorded.lock().unwrap().push((from, to)))
            .build(),
    );

    fail(&breaker).await;
    tokio::time::sleep(Duration::from_millis(80)).await;

    breaker.call(|| async { Ok::<_, std::io::Error>(()) }).await.unwrap();
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    breaker.call(|| async { Ok::<_, std::io::Error>(()) }).await.unwrap();
    assert_eq!(breaker.state(), CircuitState::Closed);

    assert_eq!(
        *transitions.lock().unwrap(),
        vec![
            (CircuitState::Closed, CircuitState::Open),
            (CircuitState::Open, CircuitState::HalfOpen),
            (CircuitState::HalfOpen, CircuitState::Closed),
        ]
    );
}

#[tokio::test]
async fn dropped_trial_permit_frees_the_slot() {
    let breaker = breaker(1, Duration::from_millis(50));
    fail(&breaker).await;
    tokio::time::sleep(Duration::from_millis(80)).await;

    let permit = breaker.acquire::<std::io::Error>().unwrap();
    assert!(breaker.acquire::<std::io::Error>().is_err());
    drop(permit);

    let permit = breaker.acquire::<std::io::Error>().unwrap();
    permit.success();
    assert_eq!(breaker.state(), CircuitState::Closed);
}
