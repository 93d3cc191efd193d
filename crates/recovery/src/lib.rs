//! Retry, circuit breaking, recovery dispatch, batch processing and health
//! alerting behind one service object.
//!
//! Each component is usable on its own from its crate, re-exported here as a
//! module. [`Resilience`] wires them to one [`CircuitBreakerRegistry`] and one
//! [`FailureCounters`] sink, so that a failure recorded by the dispatcher or
//! the batch processor shows up in the health score.
//!
//! # Example
//!
//! ```rust
//! use recovery::core::{ErrorContext, Failure};
//! use recovery::dispatch::{OperationCategory, RecoveryStrategy};
//! use recovery::Resilience;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let resilience = Resilience::new();
//! let context = ErrorContext::new("extract_answers", "chat");
//!
//! let outcome: Result<String, _> = resilience
//!     .boundary(OperationCategory::DataExtraction, &context, async {
//!         Err(Failure::timeout("extraction model timed out"))
//!     })
//!     .await;
//!
//! let error = outcome.unwrap_err();
//! assert_eq!(error.recovery().strategy_used(), RecoveryStrategy::RetryWithBackoff);
//! assert_eq!(resilience.get_recovery_stats().total_recoveries(), 1);
//! # }
//! ```

pub use recovery_batch as batch;
pub use recovery_circuitbreaker as circuitbreaker;
pub use recovery_core as core;
pub use recovery_dispatch as dispatch;
pub use recovery_health as health;
pub use recovery_retry as retry;

use recovery_batch::{BatchConfigBuilder, BatchError, BatchItem, BatchProcessor, BatchResult};
use recovery_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry};
use recovery_core::{ErrorContext, FailureCounters};
use recovery_dispatch::{
    BoundaryError, DispatcherConfigBuilder, OperationCategory, RecoveryDispatcher,
    RecoveryResult, RecoveryStats,
};
use recovery_health::{HealthConfigBuilder, HealthMetrics, HealthMonitor, MonitoringSummary};
use recovery_retry::{RetryConfig, RetryConfigBuilder};
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

type Customize<B> = Box<dyn FnOnce(B) -> B>;

/// The composed resilience subsystem.
///
/// Clones share every component.
#[derive(Clone)]
pub struct Resilience {
    registry: Arc<CircuitBreakerRegistry>,
    counters: Arc<FailureCounters>,
    dispatcher: Arc<RecoveryDispatcher>,
    batch: BatchProcessor,
    health: HealthMonitor,
}

impl Resilience {
    /// A subsystem with its own registry and counters and default settings.
    pub fn new() -> Self {
        ResilienceBuilder::new().build()
    }

    pub fn builder() -> ResilienceBuilder {
        ResilienceBuilder::new()
    }

    /// The process-wide instance, built on [`CircuitBreakerRegistry::global`]
    /// and [`FailureCounters::global`].
    pub fn global() -> &'static Resilience {
        static GLOBAL: OnceLock<Resilience> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            ResilienceBuilder::new()
                .name("global")
                .registry(CircuitBreakerRegistry::global())
                .counters(FailureCounters::global())
                .build()
        })
    }

    pub fn registry(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.registry
    }

    pub fn counters(&self) -> &Arc<FailureCounters> {
        &self.counters
    }

    pub fn dispatcher(&self) -> &RecoveryDispatcher {
        &self.dispatcher
    }

    pub fn batch_processor(&self) -> &BatchProcessor {
        &self.batch
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    /// A retry builder that reports exhaustion into the shared counters.
    pub fn retry_config(&self) -> RetryConfigBuilder {
        RetryConfig::builder().counters(Arc::clone(&self.counters))
    }

    /// The registry breaker guarding `dependency`.
    pub fn breaker(&self, dependency: &str) -> CircuitBreaker {
        self.registry.get_or_create(dependency)
    }

    /// See [`RecoveryDispatcher::boundary`].
    pub async fn boundary<T, E, Fut>(
        &self,
        category: OperationCategory,
        context: &ErrorContext,
        future: Fut,
    ) -> Result<T, BoundaryError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        self.dispatcher.boundary(category, context, future).await
    }

    /// See [`RecoveryDispatcher::boundary_blocking`].
    pub fn boundary_blocking<T, E, F>(
        &self,
        category: OperationCategory,
        context: &ErrorContext,
        operation: F,
    ) -> Result<T, BoundaryError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: Error + 'static,
    {
        self.dispatcher.boundary_blocking(category, context, operation)
    }

    pub fn handle(
        &self,
        error: &(dyn Error + 'static),
        context: &ErrorContext,
        category: OperationCategory,
    ) -> RecoveryResult {
        self.dispatcher.handle(error, context, category)
    }

    /// See [`BatchProcessor::process`].
    pub async fn process_batch<I, R, E, F, Fut>(
        &self,
        items: Vec<I>,
        operation: F,
    ) -> Result<BatchResult<I, R>, BatchError>
    where
        I: BatchItem + Clone + Send + 'static,
        R: Send + 'static,
        E: Error + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        self.batch.process(items, operation).await
    }

    pub fn check_system_health(&self) -> HealthMetrics {
        self.health.check_system_health()
    }

    pub fn get_recovery_stats(&self) -> RecoveryStats {
        self.dispatcher.get_recovery_stats()
    }

    pub fn get_monitoring_summary(&self) -> MonitoringSummary {
        self.health.get_monitoring_summary()
    }

    /// Returns false if no breaker has that name.
    pub fn reset_circuit_breaker(&self, name: &str) -> bool {
        self.registry.reset(name)
    }

    /// Returns how many breakers were reset.
    pub fn reset_all_circuit_breakers(&self) -> usize {
        self.registry.reset_all()
    }

    pub fn resolve_alert(&self, id: Uuid) -> bool {
        self.health.resolve_alert(id)
    }

    /// Clears the recovery histogram and the shared failure counters.
    pub fn clear_error_stats(&self) -> usize {
        self.dispatcher.clear_error_stats()
    }
}

impl Default for Resilience {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Resilience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resilience")
            .field("registry", &self.registry)
            .field("dispatcher", &self.dispatcher)
            .field("health", &self.health)
            .finish()
    }
}

/// Builder for [`Resilience`].
///
/// The registry and counters set here are injected into every component
/// after its customizer runs.
pub struct ResilienceBuilder {
    name: String,
    registry: Option<Arc<CircuitBreakerRegistry>>,
    counters: Option<Arc<FailureCounters>>,
    dispatcher: Customize<DispatcherConfigBuilder>,
    batch: Customize<BatchConfigBuilder>,
    health: Customize<HealthConfigBuilder>,
}

impl Default for ResilienceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResilienceBuilder {
    pub fn new() -> Self {
        Self {
            name: "resilience".to_string(),
            registry: None,
            counters: None,
            dispatcher: Box::new(|builder| builder),
            batch: Box::new(|builder| builder),
            health: Box::new(|builder| builder),
        }
    }

    /// Name given to every component. Default: `resilience`
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Default: a new registry with [`CircuitBreakerConfig::default`]
    pub fn registry(mut self, registry: Arc<CircuitBreakerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Shorthand for a new registry whose breakers use `config`.
    pub fn breaker_defaults(self, config: CircuitBreakerConfig) -> Self {
        self.registry(Arc::new(CircuitBreakerRegistry::new(config)))
    }

    /// Default: new counters
    pub fn counters(mut self, counters: Arc<FailureCounters>) -> Self {
        self.counters = Some(counters);
        self
    }

    pub fn dispatcher<F>(mut self, f: F) -> Self
    where
        F: FnOnce(DispatcherConfigBuilder) -> DispatcherConfigBuilder + 'static,
    {
        self.dispatcher = Box::new(f);
        self
    }

    pub fn batch<F>(mut self, f: F) -> Self
    where
        F: FnOnce(BatchConfigBuilder) -> BatchConfigBuilder + 'static,
    {
        self.batch = Box::new(f);
        self
    }

    pub fn health<F>(mut self, f: F) -> Self
    where
        F: FnOnce(HealthConfigBuilder) -> HealthConfigBuilder + 'static,
    {
        self.health = Box::new(f);
        self
    }

    pub fn build(self) -> Resilience {
        let registry = self.registry.unwrap_or_default();
        let counters = self
            .counters
            .unwrap_or_else(|| Arc::new(FailureCounters::new()));

        let dispatcher = (self.dispatcher)(DispatcherConfigBuilder::new().name(self.name.clone()))
            .registry(Arc::clone(&registry))
            .counters(Arc::clone(&counters))
            .build();
        let batch = (self.batch)(BatchConfigBuilder::new().name(self.name.clone()))
            .counters(Arc::clone(&counters))
            .build();
        let health = (self.health)(HealthConfigBuilder::new().name(self.name))
            .registry(Arc::clone(&registry))
            .counters(Arc::clone(&counters))
            .build();

        Resilience {
            registry,
            counters,
            dispatcher: Arc::new(RecoveryDispatcher::new(dispatcher)),
            batch: BatchProcessor::new(batch),
            health: HealthMonitor::new(health),
        }
    }
}
