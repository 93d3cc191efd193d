use recovery_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerLayer, CircuitBreakerRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::{Layer, Service, ServiceExt};

#[tokio::test]
async fn layer_rejects_once_open() {
    let registry = CircuitBreakerRegistry::new(
        CircuitBreakerConfig::builder().failure_threshold(2).build(),
    );
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let inner = tower::service_fn(move |_: ()| {
        counted.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(std::io::Error::other("503")) }
    });

    let mut service = CircuitBreakerLayer::new(registry.get_or_create("geo")).layer(inner);

    for _ in 0..2 {
        let error = service.ready().await.unwrap().call(()).await.unwrap_err();
        assert!(!error.is_circuit_open());
    }

    let error = service.ready().await.unwrap().call(()).await.unwrap_err();
    assert!(error.is_circuit_open());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(registry.unhealthy(), vec!["geo".to_string()]);
}
