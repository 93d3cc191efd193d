//! Retry engine with bounded exponential backoff and jitter.
//!
//! An operation is attempted; on failure the error is classified, and the
//! operation is retried only if the classification is in the policy's
//! retryable set and fewer than `max_retries` retries have happened. The
//! delay before retry `n` (0-based) is `min(initial × 2^n, max) + U(0, jitter)`.
//! Failures are always propagated unmodified.
//!
//! Two execution models share the exact same decision and backoff logic:
//! [`retry`] suspends the task with `tokio::time::sleep`, [`retry_blocking`]
//! parks the thread with `std::thread::sleep`.
//!
//! When a retryable failure exhausts the budget, the policy's
//! [`FailureCounters`](recovery_core::FailureCounters) retry-exhaustion
//! counter is incremented once.
//!
//! # Basic Example
//!
//! ```rust
//! use recovery_core::Failure;
//! use recovery_retry::{retry, RetryConfig};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let config = RetryConfig::builder()
//!     .name("profile-store")
//!     .max_retries(2)
//!     .initial_backoff(Duration::from_millis(10))
//!     .build();
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let value = retry(
//!     || {
//!         let calls = Arc::clone(&calls);
//!         async move {
//!             if calls.fetch_add(1, Ordering::SeqCst) == 0 {
//!                 Err(Failure::timeout("first call timed out"))
//!             } else {
//!                 Ok(42)
//!             }
//!         }
//!     },
//!     &config,
//! )
//! .await;
//!
//! assert_eq!(value.unwrap(), 42);
//! # }
//! ```
//!
//! # Tower
//!
//! [`RetryLayer`] applies the same policy to any service whose request is
//! `Clone` and whose error implements `std::error::Error`.

mod backoff;
mod config;
mod events;
mod layer;

pub use backoff::ExponentialJitterBackoff;
pub use config::{RetryConfig, RetryConfigBuilder, RetryPredicate};
pub use events::RetryEvent;
pub use layer::RetryLayer;

use config::Decision;
use futures::future::BoxFuture;
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;

/// Runs `operation` under `config`, suspending the task between attempts.
///
/// `operation` is called at most `config.max_retries() + 1` times.
pub async fn retry<T, E, F, Fut>(mut operation: F, config: &RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + 'static,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                config.on_success(attempt);
                return Ok(value);
            }
            Err(error) => match config.on_failure(&error, attempt) {
                Decision::RetryAfter(delay) => {
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Decision::Stop => return Err(error),
            },
        }
    }
}

/// Runs `operation` under `config`, blocking the thread between attempts.
///
/// Behaves exactly like [`retry`] apart from how it sleeps.
pub fn retry_blocking<T, E, F>(mut operation: F, config: &RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Error + 'static,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(value) => {
                config.on_success(attempt);
                return Ok(value);
            }
            Err(error) => match config.on_failure(&error, attempt) {
                Decision::RetryAfter(delay) => {
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Decision::Stop => return Err(error),
            },
        }
    }
}

/// A tower service that retries failed calls of its inner service.
pub struct Retry<S> {
    inner: S,
    config: Arc<RetryConfig>,
}

impl<S> Retry<S> {
    pub fn new(inner: S, config: Arc<RetryConfig>) -> Self {
        Self { inner, config }
    }
}

impl<S> Clone for Retry<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, Req> Service<Req> for Retry<S>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Error + Send + 'static,
    Req: Clone + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        // the clone is driven to readiness inside the loop; keep the one
        // poll_ready was called on for the first attempt
        let clone = self.inner.clone();
        let mut service = std::mem::replace(&mut self.inner, clone);
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let mut attempt = 0;
            let mut first = true;
            loop {
                if !first {
                    futures::future::poll_fn(|cx| service.poll_ready(cx)).await?;
                }
                first = false;

                match service.call(req.clone()).await {
                    Ok(response) => {
                        config.on_success(attempt);
                        return Ok(response);
                    }
                    Err(error) => match config.on_failure(&error, attempt) {
                        Decision::RetryAfter(delay) => {
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                        }
                        Decision::Stop => return Err(error),
                    },
                }
            }
        })
    }
}
