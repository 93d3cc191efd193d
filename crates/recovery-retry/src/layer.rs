use crate::{Retry, RetryConfig};
use std::sync::Arc;
use tower::Layer;

/// A tower layer that retries failed calls according to a [`RetryConfig`].
///
/// # Example
///
/// ```rust
/// use recovery_retry::{RetryConfig, RetryLayer};
/// use std::time::Duration;
/// use tower::{service_fn, ServiceBuilder};
///
/// let layer = RetryLayer::new(
///     RetryConfig::network()
///         .name("geocoder")
///         .initial_backoff(Duration::from_millis(50))
///         .build(),
/// );
///
/// let service = ServiceBuilder::new()
///     .layer(layer)
///     .service(service_fn(|req: String| async move { Ok::<_, std::io::Error>(req) }));
/// ```
#[derive(Clone, Debug)]
pub struct RetryLayer {
    config: Arc<RetryConfig>,
}

impl RetryLayer {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = Retry<S>;

    fn layer(&self, service: S) -> Self::Service {
        Retry::new(service, Arc::clone(&self.config))
    }
}
