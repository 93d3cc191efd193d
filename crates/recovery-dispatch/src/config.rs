use crate::category::OperationCategory;
use crate::events::RecoveryEvent;
use crate::result::RecoveryStrategy;
use recovery_circuitbreaker::CircuitBreakerRegistry;
use recovery_core::events::{EventListeners, FnListener};
use recovery_core::{FailureClassification, FailureClassifier, FailureCounters};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Configuration for a [`RecoveryDispatcher`](crate::RecoveryDispatcher).
#[derive(Clone)]
pub struct DispatcherConfig {
    pub(crate) name: String,
    pub(crate) max_recovery_retries: u32,
    pub(crate) record_dependency_failures: bool,
    pub(crate) fallback_values: BTreeMap<OperationCategory, Value>,
    pub(crate) classifier: Arc<FailureClassifier>,
    pub(crate) counters: Arc<FailureCounters>,
    pub(crate) registry: Arc<CircuitBreakerRegistry>,
    pub(crate) event_listeners: EventListeners<RecoveryEvent>,
}

impl DispatcherConfig {
    pub fn builder() -> DispatcherConfigBuilder {
        DispatcherConfigBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_recovery_retries(&self) -> u32 {
        self.max_recovery_retries
    }

    pub fn record_dependency_failures(&self) -> bool {
        self.record_dependency_failures
    }

    pub fn fallback_value(&self, category: OperationCategory) -> Option<&Value> {
        self.fallback_values.get(&category)
    }

    pub fn registry(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.registry
    }

    pub fn counters(&self) -> &Arc<FailureCounters> {
        &self.counters
    }

    pub fn classifier(&self) -> &Arc<FailureClassifier> {
        &self.classifier
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfigBuilder::new().build()
    }
}

impl fmt::Debug for DispatcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherConfig")
            .field("name", &self.name)
            .field("max_recovery_retries", &self.max_recovery_retries)
            .field("record_dependency_failures", &self.record_dependency_failures)
            .field("fallback_values", &self.fallback_values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`DispatcherConfig`].
pub struct DispatcherConfigBuilder {
    name: String,
    max_recovery_retries: u32,
    record_dependency_failures: bool,
    fallback_values: BTreeMap<OperationCategory, Value>,
    classifier: Option<Arc<FailureClassifier>>,
    counters: Option<Arc<FailureCounters>>,
    registry: Option<Arc<CircuitBreakerRegistry>>,
    event_listeners: EventListeners<RecoveryEvent>,
}

impl Default for DispatcherConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherConfigBuilder {
    pub fn new() -> Self {
        Self {
            name: "<unnamed>".to_string(),
            max_recovery_retries: 3,
            record_dependency_failures: false,
            fallback_values: BTreeMap::new(),
            classifier: None,
            counters: None,
            registry: None,
            event_listeners: EventListeners::new(),
        }
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Retry recommendations stop once the context's retry count reaches this
    /// value; the category's fallback is used instead.
    ///
    /// Default: 3
    pub fn max_recovery_retries(mut self, max: u32) -> Self {
        self.max_recovery_retries = max;
        self
    }

    /// Whether a failure in a dependency-backed category is recorded into
    /// that dependency's circuit breaker before deciding.
    ///
    /// Only a closed breaker is recorded into. Leave this off when the
    /// guarded operation already runs through the breaker with
    /// [`CircuitBreaker::call`](recovery_circuitbreaker::CircuitBreaker::call),
    /// which records its own outcome.
    ///
    /// Default: false
    pub fn record_dependency_failures(mut self, record: bool) -> Self {
        self.record_dependency_failures = record;
        self
    }

    /// Substitute value returned in `result_data` when `category` falls back.
    /// Without one, a fallback result reports what would have been used.
    pub fn fallback_value(mut self, category: OperationCategory, value: impl Into<Value>) -> Self {
        self.fallback_values.insert(category, value.into());
        self
    }

    /// Default: [`FailureClassifier::new`]
    pub fn classifier(mut self, classifier: Arc<FailureClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Default: [`FailureCounters::global`]
    pub fn counters(mut self, counters: Arc<FailureCounters>) -> Self {
        self.counters = Some(counters);
        self
    }

    /// Default: [`CircuitBreakerRegistry::global`]
    pub fn registry(mut self, registry: Arc<CircuitBreakerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn on_decision<F>(mut self, f: F) -> Self
    where
        F: Fn(OperationCategory, FailureClassification, RecoveryStrategy) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RecoveryEvent::Decision {
                category,
                classification,
                strategy,
                ..
            } = event
            {
                f(*category, *classification, *strategy);
            }
        }));
        self
    }

    pub fn on_policy_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(OperationCategory) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RecoveryEvent::PolicyFailure { category, .. } = event {
                f(*category);
            }
        }));
        self
    }

    pub fn build(self) -> DispatcherConfig {
        DispatcherConfig {
            name: self.name,
            max_recovery_retries: self.max_recovery_retries,
            record_dependency_failures: self.record_dependency_failures,
            fallback_values: self.fallback_values,
            classifier: self
                .classifier
                .unwrap_or_else(|| Arc::new(FailureClassifier::new())),
            counters: self.counters.unwrap_or_else(FailureCounters::global),
            registry: self.registry.unwrap_or_else(CircuitBreakerRegistry::global),
            event_listeners: self.event_listeners,
        }
    }
}
