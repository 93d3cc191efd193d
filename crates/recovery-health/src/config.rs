use crate::alert::Alert;
use crate::events::HealthEvent;
use crate::probe::{ResourceProbe, SystemProbe};
use recovery_circuitbreaker::CircuitBreakerRegistry;
use recovery_core::events::{EventListeners, FnListener};
use recovery_core::FailureCounters;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Warning and critical levels for one resource, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceThresholds {
    pub warning: f64,
    pub critical: f64,
}

impl ResourceThresholds {
    pub const fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }
}

/// Configuration for a [`HealthMonitor`](crate::HealthMonitor).
#[derive(Clone)]
pub struct HealthConfig {
    pub(crate) name: String,
    pub(crate) memory: ResourceThresholds,
    pub(crate) disk: ResourceThresholds,
    pub(crate) cpu: ResourceThresholds,
    pub(crate) error_rate_threshold: f64,
    pub(crate) alert_cooldown: Duration,
    pub(crate) alert_history_size: usize,
    pub(crate) metrics_history_size: usize,
    pub(crate) registry: Arc<CircuitBreakerRegistry>,
    pub(crate) counters: Arc<FailureCounters>,
    pub(crate) probe: Arc<dyn ResourceProbe>,
    pub(crate) event_listeners: EventListeners<HealthEvent>,
}

impl HealthConfig {
    pub fn builder() -> HealthConfigBuilder {
        HealthConfigBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn memory_thresholds(&self) -> ResourceThresholds {
        self.memory
    }

    pub fn disk_thresholds(&self) -> ResourceThresholds {
        self.disk
    }

    pub fn cpu_thresholds(&self) -> ResourceThresholds {
        self.cpu
    }

    pub fn error_rate_threshold(&self) -> f64 {
        self.error_rate_threshold
    }

    pub fn alert_cooldown(&self) -> Duration {
        self.alert_cooldown
    }

    pub fn alert_history_size(&self) -> usize {
        self.alert_history_size
    }

    pub fn metrics_history_size(&self) -> usize {
        self.metrics_history_size
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        HealthConfigBuilder::new().build()
    }
}

impl fmt::Debug for HealthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthConfig")
            .field("name", &self.name)
            .field("memory", &self.memory)
            .field("disk", &self.disk)
            .field("cpu", &self.cpu)
            .field("error_rate_threshold", &self.error_rate_threshold)
            .field("alert_cooldown", &self.alert_cooldown)
            .field("alert_history_size", &self.alert_history_size)
            .field("metrics_history_size", &self.metrics_history_size)
            .finish()
    }
}

/// Builder for [`HealthConfig`].
pub struct HealthConfigBuilder {
    name: String,
    memory: ResourceThresholds,
    disk: ResourceThresholds,
    cpu: ResourceThresholds,
    error_rate_threshold: f64,
    alert_cooldown: Duration,
    alert_history_size: usize,
    metrics_history_size: usize,
    registry: Option<Arc<CircuitBreakerRegistry>>,
    counters: Option<Arc<FailureCounters>>,
    probe: Option<Arc<dyn ResourceProbe>>,
    event_listeners: EventListeners<HealthEvent>,
}

impl Default for HealthConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthConfigBuilder {
    pub fn new() -> Self {
        Self {
            name: "<unnamed>".to_string(),
            memory: ResourceThresholds::new(80.0, 90.0),
            disk: ResourceThresholds::new(85.0, 95.0),
            cpu: ResourceThresholds::new(80.0, 95.0),
            error_rate_threshold: 0.1,
            alert_cooldown: Duration::from_secs(300),
            alert_history_size: 1000,
            metrics_history_size: 100,
            registry: None,
            counters: None,
            probe: None,
            event_listeners: EventListeners::new(),
        }
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Default: 80% warning, 90% critical
    pub fn memory_thresholds(mut self, warning: f64, critical: f64) -> Self {
        self.memory = ResourceThresholds::new(warning, critical);
        self
    }

    /// Default: 85% warning, 95% critical
    pub fn disk_thresholds(mut self, warning: f64, critical: f64) -> Self {
        self.disk = ResourceThresholds::new(warning, critical);
        self
    }

    /// Default: 80% warning, 95% critical
    pub fn cpu_thresholds(mut self, warning: f64, critical: f64) -> Self {
        self.cpu = ResourceThresholds::new(warning, critical);
        self
    }

    /// An error alert is raised when the error rate exceeds this value.
    ///
    /// Default: 0.1
    pub fn error_rate_threshold(mut self, threshold: f64) -> Self {
        self.error_rate_threshold = threshold;
        self
    }

    /// Minimum time between two raises of the same (component, title) alert.
    ///
    /// Default: 5 minutes
    pub fn alert_cooldown(mut self, cooldown: Duration) -> Self {
        self.alert_cooldown = cooldown;
        self
    }

    /// Default: 1000
    pub fn alert_history_size(mut self, size: usize) -> Self {
        self.alert_history_size = size.max(1);
        self
    }

    /// Default: 100
    pub fn metrics_history_size(mut self, size: usize) -> Self {
        self.metrics_history_size = size.max(1);
        self
    }

    /// Default: [`CircuitBreakerRegistry::global`]
    pub fn registry(mut self, registry: Arc<CircuitBreakerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Default: [`FailureCounters::global`]
    pub fn counters(mut self, counters: Arc<FailureCounters>) -> Self {
        self.counters = Some(counters);
        self
    }

    /// Default: [`SystemProbe`]
    pub fn probe<P>(mut self, probe: P) -> Self
    where
        P: ResourceProbe + 'static,
    {
        self.probe = Some(Arc::new(probe));
        self
    }

    pub fn on_alert<F>(mut self, f: F) -> Self
    where
        F: Fn(&Alert) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let HealthEvent::AlertRaised { alert, .. } = event {
                f(alert);
            }
        }));
        self
    }

    pub fn on_alert_resolved<F>(mut self, f: F) -> Self
    where
        F: Fn(Uuid) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let HealthEvent::AlertResolved { id, .. } = event {
                f(*id);
            }
        }));
        self
    }

    pub fn on_health_checked<F>(mut self, f: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let HealthEvent::HealthChecked { overall_health, .. } = event {
                f(*overall_health);
            }
        }));
        self
    }

    pub fn build(self) -> HealthConfig {
        HealthConfig {
            name: self.name,
            memory: self.memory,
            disk: self.disk,
            cpu: self.cpu,
            error_rate_threshold: self.error_rate_threshold,
            alert_cooldown: self.alert_cooldown,
            alert_history_size: self.alert_history_size,
            metrics_history_size: self.metrics_history_size,
            registry: self.registry.unwrap_or_else(CircuitBreakerRegistry::global),
            counters: self.counters.unwrap_or_else(FailureCounters::global),
            probe: self
                .probe
                .unwrap_or_else(|| Arc::new(SystemProbe::new()) as Arc<dyn ResourceProbe>),
            event_listeners: self.event_listeners,
        }
    }
}
