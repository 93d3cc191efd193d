use crate::backoff::ExponentialJitterBackoff;
use crate::events::RetryEvent;
#[cfg(feature = "metrics")]
use metrics::counter;
use recovery_core::events::{EventListeners, FnListener};
use recovery_core::{FailureClassification, FailureClassifier, FailureCounters};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Custom retry predicate. Overrides the retryable classification set.
pub type RetryPredicate = Arc<dyn Fn(&(dyn Error + 'static), FailureClassification) -> bool + Send + Sync>;

/// Immutable retry policy.
///
/// Built with [`RetryConfig::builder`]. `RetryConfig::default()` is the
/// process-wide default used by call sites that do not supply their own.
#[derive(Clone)]
pub struct RetryConfig {
    pub(crate) max_retries: usize,
    pub(crate) backoff: ExponentialJitterBackoff,
    pub(crate) retryable: BTreeSet<FailureClassification>,
    pub(crate) retry_predicate: Option<RetryPredicate>,
    pub(crate) classifier: Arc<FailureClassifier>,
    pub(crate) counters: Arc<FailureCounters>,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) name: String,
}

/// What the retry loop does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    RetryAfter(Duration),
    Stop,
}

impl RetryConfig {
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Preset for calls to remote services.
    ///
    /// Configuration:
    /// - 5 retries
    /// - 200ms initial backoff, 10s max
    /// - 200ms jitter
    /// - retries timeouts, connection failures and rate limiting
    pub fn network() -> RetryConfigBuilder {
        Self::builder()
            .max_retries(5)
            .initial_backoff(Duration::from_millis(200))
            .max_backoff(Duration::from_secs(10))
            .jitter(Duration::from_millis(200))
    }

    /// Preset for database access.
    ///
    /// Configuration:
    /// - 3 retries
    /// - 50ms initial backoff, 2s max
    /// - 10ms jitter
    /// - retries timeouts and connection failures only
    pub fn database() -> RetryConfigBuilder {
        Self::builder()
            .max_retries(3)
            .initial_backoff(Duration::from_millis(50))
            .max_backoff(Duration::from_secs(2))
            .jitter(Duration::from_millis(10))
            .retryable([
                FailureClassification::Timeout,
                FailureClassification::Connection,
            ])
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn initial_backoff(&self) -> Duration {
        self.backoff.initial()
    }

    pub fn max_backoff(&self) -> Duration {
        self.backoff.max()
    }

    pub fn jitter(&self) -> Duration {
        self.backoff.jitter()
    }

    pub fn backoff(&self) -> &ExponentialJitterBackoff {
        &self.backoff
    }

    pub fn retryable(&self) -> &BTreeSet<FailureClassification> {
        &self.retryable
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn counters(&self) -> &Arc<FailureCounters> {
        &self.counters
    }

    /// Returns a tower layer applying this policy.
    pub fn layer(self) -> crate::RetryLayer {
        crate::RetryLayer::new(self)
    }

    /// Classifies `error` and reports whether this policy would retry it.
    pub fn is_retryable(&self, error: &(dyn Error + 'static)) -> bool {
        let classification = self.classifier.classify(error);
        self.accepts(error, classification)
    }

    fn accepts(&self, error: &(dyn Error + 'static), classification: FailureClassification) -> bool {
        match &self.retry_predicate {
            Some(predicate) => predicate(error, classification),
            None => self.retryable.contains(&classification),
        }
    }

    /// Decides what follows failed attempt number `attempt` (0-based),
    /// emitting events and updating counters on the way.
    pub(crate) fn on_failure(&self, error: &(dyn Error + 'static), attempt: usize) -> Decision {
        let classification = self.classifier.classify(error);

        if !self.accepts(error, classification) {
            self.event_listeners.emit(&RetryEvent::IgnoredError {
                name: self.name.clone(),
                timestamp: Instant::now(),
                classification,
            });

            #[cfg(feature = "metrics")]
            counter!("retry_calls_total", "retry" => self.name.clone(), "result" => "ignored")
                .increment(1);

            return Decision::Stop;
        }

        if attempt >= self.max_retries {
            self.counters.record_retry_exhausted();
            self.event_listeners.emit(&RetryEvent::Exhausted {
                name: self.name.clone(),
                timestamp: Instant::now(),
                attempts: attempt + 1,
                classification,
            });

            #[cfg(feature = "tracing")]
            tracing::warn!(
                retry = %self.name,
                attempts = attempt + 1,
                %classification,
                "retries exhausted"
            );

            #[cfg(feature = "metrics")]
            counter!("retry_calls_total", "retry" => self.name.clone(), "result" => "exhausted")
                .increment(1);

            return Decision::Stop;
        }

        let delay = self.backoff.next_interval(attempt);
        self.event_listeners.emit(&RetryEvent::Retry {
            name: self.name.clone(),
            timestamp: Instant::now(),
            attempt,
            delay,
            classification,
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(
            retry = %self.name,
            attempt,
            delay_ms = delay.as_millis() as u64,
            %classification,
            "retrying after failure"
        );

        #[cfg(feature = "metrics")]
        counter!("retry_attempts_total", "retry" => self.name.clone()).increment(1);

        Decision::RetryAfter(delay)
    }

    pub(crate) fn on_success(&self, attempt: usize) {
        self.event_listeners.emit(&RetryEvent::Success {
            name: self.name.clone(),
            timestamp: Instant::now(),
            attempts: attempt + 1,
        });

        #[cfg(feature = "metrics")]
        counter!("retry_calls_total", "retry" => self.name.clone(), "result" => "success")
            .increment(1);
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfigBuilder::new().build()
    }
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("name", &self.name)
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .field("retryable", &self.retryable)
            .field("custom_predicate", &self.retry_predicate.is_some())
            .finish()
    }
}

/// Builder for [`RetryConfig`].
pub struct RetryConfigBuilder {
    max_retries: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
    jitter: Duration,
    retryable: BTreeSet<FailureClassification>,
    retry_predicate: Option<RetryPredicate>,
    classifier: Option<Arc<FailureClassifier>>,
    counters: Option<Arc<FailureCounters>>,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            jitter: Duration::from_millis(100),
            retryable: [
                FailureClassification::Timeout,
                FailureClassification::Connection,
                FailureClassification::RateLimit,
            ]
            .into_iter()
            .collect(),
            retry_predicate: None,
            classifier: None,
            counters: None,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Maximum number of retries after the first attempt.
    ///
    /// Default: 3
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before the first retry.
    ///
    /// Default: 1s
    pub fn initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Cap on the exponential part of the delay.
    ///
    /// Default: 60s
    pub fn max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Upper bound of the random delay added to every backoff.
    ///
    /// Default: 100ms
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replaces the set of classifications that are retried.
    ///
    /// Default: timeout, connection, rate_limit
    pub fn retryable<I>(mut self, classifications: I) -> Self
    where
        I: IntoIterator<Item = FailureClassification>,
    {
        self.retryable = classifications.into_iter().collect();
        self
    }

    /// Retries only when `predicate` returns true, ignoring the retryable set.
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&(dyn Error + 'static), FailureClassification) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    /// Classifier used to tag failures.
    ///
    /// Default: `FailureClassifier::new()`
    pub fn classifier(mut self, classifier: Arc<FailureClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Counters receiving retry exhaustion reports.
    ///
    /// Default: `FailureCounters::global()`
    pub fn counters(mut self, counters: Arc<FailureCounters>) -> Self {
        self.counters = Some(counters);
        self
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, FailureClassification) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Exhausted {
                attempts,
                classification,
                ..
            } = event
            {
                f(*attempts, *classification);
            }
        }));
        self
    }

    pub fn on_ignored_error<F>(mut self, f: F) -> Self
    where
        F: Fn(FailureClassification) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::IgnoredError { classification, .. } = event {
                f(*classification);
            }
        }));
        self
    }

    pub fn build(self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            backoff: ExponentialJitterBackoff::new(self.initial_backoff, self.max_backoff)
                .with_jitter(self.jitter),
            retryable: self.retryable,
            retry_predicate: self.retry_predicate,
            classifier: self
                .classifier
                .unwrap_or_else(|| Arc::new(FailureClassifier::new())),
            counters: self.counters.unwrap_or_else(FailureCounters::global),
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}
