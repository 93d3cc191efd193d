use crate::alert::Alert;
use chrono::{DateTime, Utc};
use recovery_core::FailureClassification;
use serde::Serialize;

/// Result of one health check. Every score is in `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthMetrics {
    pub overall_health: f64,
    pub error_rate: f64,
    pub circuit_breaker_health: f64,
    pub resource_health: f64,
    pub processing_health: f64,
    pub timestamp: DateTime<Utc>,
    pub active_alerts: usize,
    pub critical_alerts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Degrading,
}

/// Overall health over the most recent checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthTrend {
    pub samples: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub direction: TrendDirection,
}

// Half-to-half change in mean overall health below this is "stable".
const TREND_TOLERANCE: f64 = 0.05;

impl HealthTrend {
    /// Summarises `history`, oldest first. `None` when it is empty.
    pub fn from_history(history: &[HealthMetrics]) -> Option<HealthTrend> {
        if history.is_empty() {
            return None;
        }

        let scores: Vec<f64> = history.iter().map(|metrics| metrics.overall_health).collect();
        let average = mean(&scores);
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let direction = if scores.len() < 2 {
            TrendDirection::Stable
        } else {
            let (older, newer) = scores.split_at(scores.len() / 2);
            let change = mean(newer) - mean(older);
            if change > TREND_TOLERANCE {
                TrendDirection::Improving
            } else if change < -TREND_TOLERANCE {
                TrendDirection::Degrading
            } else {
                TrendDirection::Stable
            }
        };

        Some(HealthTrend {
            samples: scores.len(),
            average,
            min,
            max,
            direction,
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorCount {
    pub classification: FailureClassification,
    pub count: u64,
}

/// Snapshot for operators; building it runs no health check.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringSummary {
    /// The most recent check, if any has run.
    pub current: Option<HealthMetrics>,
    pub active_alert_count: usize,
    /// At most 10 active alerts, oldest first.
    pub active_alerts: Vec<Alert>,
    /// The five most frequent failure classifications.
    pub top_errors: Vec<ErrorCount>,
    pub open_circuit_breakers: Vec<String>,
    pub trend: Option<HealthTrend>,
}
