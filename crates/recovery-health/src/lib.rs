//! System health scoring and alerting.
//!
//! [`HealthMonitor::check_system_health`] combines three signals into one
//! score in `[0.0, 1.0]`:
//!
//! | Signal           | Weight | Source                                      |
//! |------------------|--------|---------------------------------------------|
//! | circuit breakers | 0.3    | share of registry breakers that are not open |
//! | resources        | 0.3    | memory, disk and CPU through a [`ResourceProbe`] |
//! | processing       | 0.4    | processing, prerequisite and retry-exhaustion counters |
//!
//! Crossing a threshold raises an [`Alert`]. Alerts with the same component
//! and title are suppressed for the cooldown window, so a monitor running on
//! an interval does not flood its listeners.
//!
//! # Example
//!
//! ```rust
//! use recovery_circuitbreaker::CircuitBreakerRegistry;
//! use recovery_core::FailureCounters;
//! use recovery_health::{HealthConfig, HealthMonitor, StaticProbe};
//! use std::sync::Arc;
//!
//! let monitor = HealthMonitor::new(
//!     HealthConfig::builder()
//!         .registry(Arc::new(CircuitBreakerRegistry::default()))
//!         .counters(Arc::new(FailureCounters::new()))
//!         .probe(StaticProbe::new(40.0, 50.0, 10.0))
//!         .build(),
//! );
//!
//! let metrics = monitor.check_system_health();
//! assert_eq!(metrics.overall_health, 1.0);
//! assert_eq!(metrics.active_alerts, 0);
//! ```

mod alert;
mod config;
mod events;
mod probe;
mod report;
pub mod scoring;

pub use alert::{Alert, AlertManager, AlertSeverity};
pub use config::{HealthConfig, HealthConfigBuilder, ResourceThresholds};
pub use events::HealthEvent;
pub use probe::{ResourceProbe, ResourceUsage, StaticProbe, SystemProbe};
pub use report::{ErrorCount, HealthMetrics, HealthTrend, MonitoringSummary, TrendDirection};

use chrono::Utc;
#[cfg(feature = "metrics")]
use metrics::gauge;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use uuid::Uuid;

const ALERT_PREVIEW: usize = 10;
const TOP_ERRORS: usize = 5;
const MIN_MONITORING_INTERVAL: Duration = Duration::from_millis(1);

struct Inner {
    config: HealthConfig,
    alerts: AlertManager,
    history: Mutex<VecDeque<HealthMetrics>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Computes health scores, keeps their history and raises alerts.
///
/// Clones share state.
#[derive(Clone)]
pub struct HealthMonitor {
    inner: Arc<Inner>,
}

impl HealthMonitor {
    pub fn new(config: HealthConfig) -> Self {
        let alerts = AlertManager::new(
            config.name.clone(),
            config.alert_cooldown,
            config.alert_history_size,
            config.event_listeners.clone(),
        );
        Self {
            inner: Arc::new(Inner {
                config,
                alerts,
                history: Mutex::new(VecDeque::new()),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &HealthConfig {
        &self.inner.config
    }

    pub fn alerts(&self) -> &AlertManager {
        &self.inner.alerts
    }

    /// Runs one health check, raising alerts for crossed thresholds, and
    /// appends the result to the history.
    pub fn check_system_health(&self) -> HealthMetrics {
        let config = &self.inner.config;

        let circuit_breaker_health = self.check_circuit_breakers();
        let resource_health = self.check_resources();

        let counters = config.counters.snapshot();
        let processing_health = scoring::processing_health(&counters);
        let error_rate = scoring::error_rate(counters.recent_errors);
        let overall_health =
            scoring::overall_health(circuit_breaker_health, resource_health, processing_health);

        self.check_thresholds(overall_health, error_rate);

        let metrics = HealthMetrics {
            overall_health,
            error_rate,
            circuit_breaker_health,
            resource_health,
            processing_health,
            timestamp: Utc::now(),
            active_alerts: self.inner.alerts.active_count(),
            critical_alerts: self.inner.alerts.active_count_with(AlertSeverity::Critical),
        };

        {
            let mut history = self.inner.history.lock();
            if history.len() >= config.metrics_history_size {
                history.pop_front();
            }
            history.push_back(metrics.clone());
        }

        config.event_listeners.emit(&HealthEvent::HealthChecked {
            name: config.name.clone(),
            timestamp: Instant::now(),
            overall_health,
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(
            monitor = %config.name,
            overall_health,
            circuit_breaker_health,
            resource_health,
            processing_health,
            error_rate,
            "health checked"
        );

        #[cfg(feature = "metrics")]
        gauge!("health_overall").set(overall_health);

        metrics
    }

    fn check_circuit_breakers(&self) -> f64 {
        let registry = &self.inner.config.registry;
        let open = registry.unhealthy();
        let health = scoring::circuit_breaker_health(open.len(), registry.len());

        if !open.is_empty() {
            let mut metadata = Map::new();
            metadata.insert("open".to_string(), json!(open));
            self.inner.alerts.raise(
                AlertSeverity::Warning,
                "Circuit breakers open",
                format!("Dependencies unavailable: {}", open.join(", ")),
                "circuit_breakers",
                metadata,
            );
        }

        health
    }

    fn check_resources(&self) -> f64 {
        let config = &self.inner.config;
        let usage = config.probe.sample();
        let resources = [
            ("memory", usage.memory_percent, config.memory),
            ("disk", usage.disk_percent, config.disk),
            ("cpu", usage.cpu_percent, config.cpu),
        ];

        let mut total = 0.0;
        for (resource, percent, thresholds) in resources {
            total += scoring::resource_score(percent, thresholds.warning, thresholds.critical);

            if percent >= thresholds.critical {
                let mut metadata = Map::new();
                metadata.insert("usage_percent".to_string(), json!(percent));
                metadata.insert("critical_percent".to_string(), json!(thresholds.critical));
                self.inner.alerts.raise(
                    AlertSeverity::Critical,
                    format!("High {resource} usage"),
                    format!("{resource} usage at {percent:.1}%"),
                    "resources",
                    metadata,
                );
            }
        }

        total / resources.len() as f64
    }

    fn check_thresholds(&self, overall_health: f64, error_rate: f64) {
        let alerts = &self.inner.alerts;
        let score = |value: f64| {
            let mut metadata = Map::new();
            metadata.insert("overall_health".to_string(), json!(value));
            metadata
        };

        if overall_health < 0.5 {
            alerts.raise(
                AlertSeverity::Critical,
                "System health critical",
                format!("Overall health is {overall_health:.2}"),
                "system",
                score(overall_health),
            );
        } else if overall_health < 0.7 {
            alerts.raise(
                AlertSeverity::Warning,
                "System health degraded",
                format!("Overall health is {overall_health:.2}"),
                "system",
                score(overall_health),
            );
        }

        let threshold = self.inner.config.error_rate_threshold;
        if error_rate > threshold {
            let mut metadata = Map::new();
            metadata.insert("error_rate".to_string(), Value::from(error_rate));
            metadata.insert("threshold".to_string(), Value::from(threshold));
            alerts.raise(
                AlertSeverity::Error,
                "High error rate",
                format!("Error rate {error_rate:.2} exceeds {threshold:.2}"),
                "errors",
                metadata,
            );
        }
    }

    /// The most recent `limit` checks, oldest first.
    pub fn health_history(&self, limit: usize) -> Vec<HealthMetrics> {
        let history = self.inner.history.lock();
        let skip = history.len().saturating_sub(limit);
        history.iter().skip(skip).cloned().collect()
    }

    /// Trend over the most recent `window` checks.
    pub fn health_trend(&self, window: usize) -> Option<HealthTrend> {
        HealthTrend::from_history(&self.health_history(window))
    }

    pub fn resolve_alert(&self, id: Uuid) -> bool {
        self.inner.alerts.resolve(id)
    }

    pub fn active_alerts(&self) -> Vec<Alert> {
        self.inner.alerts.active_alerts()
    }

    pub fn alert_history(&self, limit: usize) -> Vec<Alert> {
        self.inner.alerts.alert_history(limit)
    }

    pub fn get_monitoring_summary(&self) -> MonitoringSummary {
        let config = &self.inner.config;
        let active = self.inner.alerts.active_alerts();

        MonitoringSummary {
            current: self.inner.history.lock().back().cloned(),
            active_alert_count: active.len(),
            active_alerts: active.into_iter().take(ALERT_PREVIEW).collect(),
            top_errors: config
                .counters
                .top_errors(TOP_ERRORS)
                .into_iter()
                .map(|(classification, count)| ErrorCount {
                    classification,
                    count,
                })
                .collect(),
            open_circuit_breakers: config.registry.unhealthy(),
            trend: self.health_trend(config.metrics_history_size),
        }
    }

    /// Runs [`check_system_health`](Self::check_system_health) every
    /// `interval` on a background task, replacing any task already running.
    ///
    /// Must be called within a tokio runtime. The task stops when
    /// [`stop_monitoring`](Self::stop_monitoring) is called or every monitor
    /// handle is dropped. Intervals shorter than one millisecond are raised
    /// to one millisecond.
    pub fn start_monitoring(&self, interval: Duration) {
        let interval = interval.max(MIN_MONITORING_INTERVAL);
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(inner) => {
                        HealthMonitor { inner }.check_system_health();
                    }
                    None => break,
                }
            }
        });

        #[cfg(feature = "tracing")]
        tracing::info!(
            monitor = %self.inner.config.name,
            interval_ms = interval.as_millis() as u64,
            "health monitoring started"
        );

        if let Some(previous) = self.inner.task.lock().replace(task) {
            previous.abort();
        }
    }

    /// Stops the background task. Returns false if none was running.
    pub fn stop_monitoring(&self) -> bool {
        match self.inner.task.lock().take() {
            Some(task) => {
                task.abort();

                #[cfg(feature = "tracing")]
                tracing::info!(monitor = %self.inner.config.name, "health monitoring stopped");

                true
            }
            None => false,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.inner
            .task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}

impl fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("config", &self.inner.config)
            .field("alerts", &self.inner.alerts)
            .finish()
    }
}
