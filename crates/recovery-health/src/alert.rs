use crate::events::HealthEvent;
use chrono::{DateTime, Utc};
#[cfg(feature = "metrics")]
use metrics::counter;
use parking_lot::Mutex;
use recovery_core::EventListeners;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Error => "error",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raise of an alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub component: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
    pub resolution_time: Option<DateTime<Utc>>,
    pub metadata: Map<String, Value>,
}

#[derive(Default)]
struct AlertState {
    history: VecDeque<Alert>,
    active: Vec<Alert>,
    last_raised: HashMap<(String, String), Instant>,
}

/// Raises, deduplicates and resolves alerts.
pub struct AlertManager {
    name: String,
    cooldown: Duration,
    history_size: usize,
    state: Mutex<AlertState>,
    event_listeners: EventListeners<HealthEvent>,
}

impl AlertManager {
    pub fn new(
        name: impl Into<String>,
        cooldown: Duration,
        history_size: usize,
        event_listeners: EventListeners<HealthEvent>,
    ) -> Self {
        Self {
            name: name.into(),
            cooldown,
            history_size: history_size.max(1),
            state: Mutex::new(AlertState::default()),
            event_listeners,
        }
    }

    /// Raises an alert unless the same (component, title) was raised within
    /// the cooldown. Returns the new alert, or `None` when suppressed.
    pub fn raise(
        &self,
        severity: AlertSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
        component: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Option<Alert> {
        let title = title.into();
        let component = component.into();
        let alert = {
            let mut state = self.state.lock();
            let key = (component.clone(), title.clone());
            let now = Instant::now();
            if let Some(last) = state.last_raised.get(&key) {
                if now.duration_since(*last) < self.cooldown {
                    return None;
                }
            }
            state.last_raised.insert(key, now);

            let alert = Alert {
                id: Uuid::new_v4(),
                severity,
                title,
                message: message.into(),
                component,
                timestamp: Utc::now(),
                resolved: false,
                resolution_time: None,
                metadata,
            };

            if state.history.len() >= self.history_size {
                state.history.pop_front();
            }
            state.history.push_back(alert.clone());
            state.active.push(alert.clone());
            alert
        };

        self.event_listeners.emit(&HealthEvent::AlertRaised {
            name: self.name.clone(),
            timestamp: Instant::now(),
            alert: alert.clone(),
        });

        #[cfg(feature = "tracing")]
        tracing::info!(
            monitor = %self.name,
            id = %alert.id,
            severity = %alert.severity,
            component = %alert.component,
            title = %alert.title,
            "alert raised"
        );

        #[cfg(feature = "metrics")]
        counter!("health_alerts_total", "severity" => alert.severity.as_str()).increment(1);

        Some(alert)
    }

    /// Marks an alert resolved and removes it from the active set.
    ///
    /// Returns true if the alert is known, whether it was resolved now or
    /// earlier; resolving twice changes nothing.
    pub fn resolve(&self, id: Uuid) -> bool {
        let newly_resolved = {
            let mut state = self.state.lock();
            let now = Utc::now();
            let position = state.active.iter().position(|alert| alert.id == id);
            match position {
                Some(index) => {
                    state.active.remove(index);
                    if let Some(alert) = state.history.iter_mut().find(|alert| alert.id == id) {
                        alert.resolved = true;
                        alert.resolution_time = Some(now);
                    }
                    true
                }
                None if state.history.iter().any(|alert| alert.id == id) => false,
                None => return false,
            }
        };

        if newly_resolved {
            self.event_listeners.emit(&HealthEvent::AlertResolved {
                name: self.name.clone(),
                timestamp: Instant::now(),
                id,
            });

            #[cfg(feature = "tracing")]
            tracing::info!(monitor = %self.name, %id, "alert resolved");
        }

        true
    }

    /// Unresolved alerts, oldest first.
    pub fn active_alerts(&self) -> Vec<Alert> {
        self.state.lock().active.clone()
    }

    pub fn active_count(&self) -> usize {
        self.state.lock().active.len()
    }

    pub fn active_count_with(&self, severity: AlertSeverity) -> usize {
        self.state
            .lock()
            .active
            .iter()
            .filter(|alert| alert.severity == severity)
            .count()
    }

    /// The most recent `limit` alerts from history, oldest first.
    pub fn alert_history(&self, limit: usize) -> Vec<Alert> {
        let state = self.state.lock();
        let skip = state.history.len().saturating_sub(limit);
        state.history.iter().skip(skip).cloned().collect()
    }
}

impl fmt::Debug for AlertManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertManager")
            .field("name", &self.name)
            .field("cooldown", &self.cooldown)
            .field("active", &self.active_count())
            .finish()
    }
}
