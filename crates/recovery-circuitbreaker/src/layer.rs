use crate::error::CircuitBreakerError;
use crate::CircuitBreaker;
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// A tower layer guarding an inner service with a circuit breaker.
///
/// The layer holds a [`CircuitBreaker`] handle, so every service it produces
/// shares one breaker; take the handle from a registry to make the
/// dependency visible to health checks.
///
/// # Example
///
/// ```rust
/// use recovery_circuitbreaker::{CircuitBreakerLayer, CircuitBreakerRegistry};
/// use tower::{service_fn, ServiceBuilder};
///
/// let registry = CircuitBreakerRegistry::default();
/// let layer = CircuitBreakerLayer::new(registry.get_or_create("chat-model"));
///
/// let service = ServiceBuilder::new()
///     .layer(layer)
///     .service(service_fn(|req: String| async move { Ok::<_, std::io::Error>(req) }));
/// ```
#[derive(Clone, Debug)]
pub struct CircuitBreakerLayer {
    breaker: CircuitBreaker,
}

impl CircuitBreakerLayer {
    pub fn new(breaker: CircuitBreaker) -> Self {
        Self { breaker }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

impl<S> Layer<S> for CircuitBreakerLayer {
    type Service = CircuitBreakerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CircuitBreakerService {
            inner,
            breaker: self.breaker.clone(),
        }
    }
}

/// Service produced by [`CircuitBreakerLayer`].
#[derive(Clone, Debug)]
pub struct CircuitBreakerService<S> {
    inner: S,
    breaker: CircuitBreaker,
}

impl<S> CircuitBreakerService<S> {
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

impl<S, Req> Service<Req> for CircuitBreakerService<S>
where
    S: Service<Req>,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = S::Response;
    type Error = CircuitBreakerError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(CircuitBreakerError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let permit = match self.breaker.acquire() {
            Ok(permit) => permit,
            Err(err) => return Box::pin(async move { Err(err) }),
        };

        let name = self.breaker.name().to_string();
        let timeout = permit.call_timeout();
        let future = self.inner.call(req);

        Box::pin(async move {
            match tokio::time::timeout(timeout, future).await {
                Ok(Ok(response)) => {
                    permit.success();
                    Ok(response)
                }
                Ok(Err(err)) => {
                    permit.failure();
                    Err(CircuitBreakerError::Inner(err))
                }
                Err(_) => {
                    permit.timed_out();
                    Err(CircuitBreakerError::Timeout { name, timeout })
                }
            }
        })
    }
}
