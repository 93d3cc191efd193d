use crate::alert::Alert;
use recovery_core::events::ResilienceEvent;
use std::time::Instant;
use uuid::Uuid;

/// Events emitted by the health monitor.
#[derive(Debug, Clone)]
pub enum HealthEvent {
    AlertRaised {
        name: String,
        timestamp: Instant,
        alert: Alert,
    },
    AlertResolved {
        name: String,
        timestamp: Instant,
        id: Uuid,
    },
    /// A health check finished with this overall score.
    HealthChecked {
        name: String,
        timestamp: Instant,
        overall_health: f64,
    },
}

impl ResilienceEvent for HealthEvent {
    fn event_type(&self) -> &'static str {
        match self {
            HealthEvent::AlertRaised { .. } => "alert_raised",
            HealthEvent::AlertResolved { .. } => "alert_resolved",
            HealthEvent::HealthChecked { .. } => "health_checked",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            HealthEvent::AlertRaised { timestamp, .. }
            | HealthEvent::AlertResolved { timestamp, .. }
            | HealthEvent::HealthChecked { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            HealthEvent::AlertRaised { name, .. }
            | HealthEvent::AlertResolved { name, .. }
            | HealthEvent::HealthChecked { name, .. } => name,
        }
    }
}
