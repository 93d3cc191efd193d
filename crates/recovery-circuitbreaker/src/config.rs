use crate::circuit::CircuitState;
use crate::events::CircuitBreakerEvent;
use recovery_core::events::{EventListeners, FnListener};
use std::fmt;
use std::time::Duration;

/// Thresholds and timeouts for one breaker.
#[derive(Clone)]
pub struct CircuitBreakerConfig {
    pub(crate) failure_threshold: usize,
    pub(crate) recovery_timeout: Duration,
    pub(crate) success_threshold: usize,
    pub(crate) call_timeout: Duration,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfig {
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Preset: balanced breaker for most dependencies.
    ///
    /// Configuration:
    /// - opens after 5 consecutive failures
    /// - waits 30 seconds before a trial call
    /// - closes after 2 successful trial calls
    /// - 30 second call timeout
    pub fn standard() -> CircuitBreakerConfigBuilder {
        Self::builder()
            .failure_threshold(5)
            .recovery_timeout(Duration::from_secs(30))
            .success_threshold(2)
            .call_timeout(Duration::from_secs(30))
    }

    /// Preset: fail fast for latency-sensitive calls.
    ///
    /// Configuration:
    /// - opens after 2 consecutive failures
    /// - waits 10 seconds before a trial call
    /// - closes after 1 successful trial call
    /// - 5 second call timeout
    pub fn fast_fail() -> CircuitBreakerConfigBuilder {
        Self::builder()
            .failure_threshold(2)
            .recovery_timeout(Duration::from_secs(10))
            .success_threshold(1)
            .call_timeout(Duration::from_secs(5))
    }

    pub fn failure_threshold(&self) -> usize {
        self.failure_threshold
    }

    pub fn recovery_timeout(&self) -> Duration {
        self.recovery_timeout
    }

    pub fn success_threshold(&self) -> usize {
        self.success_threshold
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        CircuitBreakerConfigBuilder::new().build()
    }
}

impl fmt::Debug for CircuitBreakerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreakerConfig")
            .field("failure_threshold", &self.failure_threshold)
            .field("recovery_timeout", &self.recovery_timeout)
            .field("success_threshold", &self.success_threshold)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

/// Builder for [`CircuitBreakerConfig`].
pub struct CircuitBreakerConfigBuilder {
    failure_threshold: usize,
    recovery_timeout: Duration,
    success_threshold: usize,
    call_timeout: Duration,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
            success_threshold: 1,
            call_timeout: Duration::from_secs(30),
            event_listeners: EventListeners::new(),
        }
    }

    /// Consecutive failures that open the circuit.
    ///
    /// Default: 5
    pub fn failure_threshold(mut self, threshold: usize) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Time after the last failure before an open circuit admits a trial call.
    ///
    /// Default: 60s
    pub fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }

    /// Consecutive half-open successes that close the circuit.
    ///
    /// Default: 1
    pub fn success_threshold(mut self, threshold: usize) -> Self {
        self.success_threshold = threshold.max(1);
        self
    }

    /// Upper bound on a single call; exceeding it counts as a failure.
    ///
    /// Default: 30s
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::StateTransition {
                from_state,
                to_state,
                ..
            } = event
            {
                f(*from_state, *to_state);
            }
        }));
        self
    }

    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CircuitBreakerEvent::CallRejected { .. }) {
                f();
            }
        }));
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::SuccessRecorded { state, .. } = event {
                f(*state);
            }
        }));
        self
    }

    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::FailureRecorded { state, .. } = event {
                f(*state);
            }
        }));
        self
    }

    pub fn on_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::CallTimedOut { timeout, .. } = event {
                f(*timeout);
            }
        }));
        self
    }

    pub fn build(self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            recovery_timeout: self.recovery_timeout,
            success_threshold: self.success_threshold,
            call_timeout: self.call_timeout,
            event_listeners: self.event_listeners,
        }
    }
}
