use crate::events::BatchEvent;
use crate::outcome::BatchOutcome;
use recovery_core::events::{EventListeners, FnListener};
use recovery_core::{FailureClassification, FailureClassifier, FailureCounters};
use recovery_retry::ExponentialJitterBackoff;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const MAX_ITEM_BACKOFF: Duration = Duration::from_secs(10);

/// Configuration for a [`BatchProcessor`](crate::BatchProcessor).
#[derive(Clone)]
pub struct BatchConfig {
    pub(crate) name: String,
    pub(crate) max_concurrent_operations: usize,
    pub(crate) max_retries_per_item: usize,
    pub(crate) failure_threshold_percentage: f64,
    pub(crate) enable_partial_success: bool,
    pub(crate) backoff: ExponentialJitterBackoff,
    pub(crate) classifier: Arc<FailureClassifier>,
    pub(crate) counters: Arc<FailureCounters>,
    pub(crate) event_listeners: EventListeners<BatchEvent>,
}

impl BatchConfig {
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_concurrent_operations(&self) -> usize {
        self.max_concurrent_operations
    }

    pub fn max_retries_per_item(&self) -> usize {
        self.max_retries_per_item
    }

    pub fn failure_threshold_percentage(&self) -> f64 {
        self.failure_threshold_percentage
    }

    pub fn enable_partial_success(&self) -> bool {
        self.enable_partial_success
    }

    pub fn backoff(&self) -> &ExponentialJitterBackoff {
        &self.backoff
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfigBuilder::new().build()
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("name", &self.name)
            .field("max_concurrent_operations", &self.max_concurrent_operations)
            .field("max_retries_per_item", &self.max_retries_per_item)
            .field("failure_threshold_percentage", &self.failure_threshold_percentage)
            .field("enable_partial_success", &self.enable_partial_success)
            .field("backoff", &self.backoff)
            .finish()
    }
}

/// Builder for [`BatchConfig`].
pub struct BatchConfigBuilder {
    name: String,
    max_concurrent_operations: usize,
    max_retries_per_item: usize,
    failure_threshold_percentage: f64,
    enable_partial_success: bool,
    initial_backoff: Duration,
    jitter: Duration,
    classifier: Option<Arc<FailureClassifier>>,
    counters: Option<Arc<FailureCounters>>,
    event_listeners: EventListeners<BatchEvent>,
}

impl Default for BatchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchConfigBuilder {
    pub fn new() -> Self {
        Self {
            name: "<unnamed>".to_string(),
            max_concurrent_operations: 5,
            max_retries_per_item: 3,
            failure_threshold_percentage: 50.0,
            enable_partial_success: true,
            initial_backoff: Duration::from_secs(1),
            jitter: Duration::from_millis(100),
            classifier: None,
            counters: None,
            event_listeners: EventListeners::new(),
        }
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Size of the worker pool, or number of semaphore permits.
    ///
    /// Default: 5
    pub fn max_concurrent_operations(mut self, max: usize) -> Self {
        self.max_concurrent_operations = max.max(1);
        self
    }

    /// Attempts made per item before it is recorded as failed.
    ///
    /// Default: 3
    pub fn max_retries_per_item(mut self, max: usize) -> Self {
        self.max_retries_per_item = max.max(1);
        self
    }

    /// The batch fails when its success rate drops below
    /// `100 - percentage` and partial success is not accepted.
    ///
    /// Default: 50.0
    pub fn failure_threshold_percentage(mut self, percentage: f64) -> Self {
        self.failure_threshold_percentage = percentage.clamp(0.0, 100.0);
        self
    }

    /// Accept a batch where some items failed as a partial success.
    ///
    /// Default: true
    pub fn enable_partial_success(mut self, enable: bool) -> Self {
        self.enable_partial_success = enable;
        self
    }

    /// First per-item backoff; later ones double, capped at 10s.
    ///
    /// Default: 1s
    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Default: 100ms
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn classifier(mut self, classifier: Arc<FailureClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Default: [`FailureCounters::global`]
    pub fn counters(mut self, counters: Arc<FailureCounters>) -> Self {
        self.counters = Some(counters);
        self
    }

    pub fn on_item_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, usize, FailureClassification) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BatchEvent::ItemFailed {
                item_id,
                attempts,
                classification,
                ..
            } = event
            {
                f(item_id, *attempts, *classification);
            }
        }));
        self
    }

    pub fn on_item_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BatchEvent::ItemRetry {
                item_id,
                attempt,
                delay,
                ..
            } = event
            {
                f(item_id, *attempt, *delay);
            }
        }));
        self
    }

    pub fn on_completed<F>(mut self, f: F) -> Self
    where
        F: Fn(BatchOutcome, usize, usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BatchEvent::Completed {
                outcome,
                total,
                successful,
                ..
            } = event
            {
                f(*outcome, *total, *successful);
            }
        }));
        self
    }

    pub fn build(self) -> BatchConfig {
        BatchConfig {
            name: self.name,
            max_concurrent_operations: self.max_concurrent_operations,
            max_retries_per_item: self.max_retries_per_item,
            failure_threshold_percentage: self.failure_threshold_percentage,
            enable_partial_success: self.enable_partial_success,
            backoff: ExponentialJitterBackoff::new(self.initial_backoff, MAX_ITEM_BACKOFF)
                .with_jitter(self.jitter),
            classifier: self
                .classifier
                .unwrap_or_else(|| Arc::new(FailureClassifier::new())),
            counters: self.counters.unwrap_or_else(FailureCounters::global),
            event_listeners: self.event_listeners,
        }
    }
}
