//! Pure scoring functions behind [`HealthMonitor::check_system_health`].
//!
//! Every score is in `[0.0, 1.0]`, where 1.0 is fully healthy.
//!
//! [`HealthMonitor::check_system_health`]: crate::HealthMonitor::check_system_health

use recovery_core::CounterSnapshot;

/// Fraction of breakers that are not open; 1.0 with no breakers.
pub fn circuit_breaker_health(open: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    let closed = total.saturating_sub(open);
    closed as f64 / total as f64
}

/// 1.0 below `warning`, 0.7 below `critical`, 0.3 otherwise.
pub fn resource_score(percent: f64, warning: f64, critical: f64) -> f64 {
    if percent < warning {
        1.0
    } else if percent < critical {
        0.7
    } else {
        0.3
    }
}

/// Decays with a weighted failure count
/// `u = 0.4·processing + 0.3·prerequisite + 0.3·retry_exhaustion`:
/// linearly by 0.1 per unit up to 5, then by 0.2 per unit, floored at 0.
pub fn processing_health(counters: &CounterSnapshot) -> f64 {
    let weighted = 0.4 * counters.processing_failures as f64
        + 0.3 * counters.prerequisite_failures as f64
        + 0.3 * counters.retry_exhaustions as f64;

    let score = if weighted <= 5.0 {
        1.0 - 0.1 * weighted
    } else {
        0.5 - 0.2 * (weighted - 5.0)
    };
    score.clamp(0.0, 1.0)
}

/// Step function of the number of errors in the recent window.
pub fn error_rate(recent_errors: usize) -> f64 {
    match recent_errors {
        0 => 0.0,
        1..=2 => 0.05,
        3..=5 => 0.15,
        n => (n as f64 * 0.05).min(0.5),
    }
}

/// Weighted mean of the three sub-scores.
pub fn overall_health(circuit_breaker: f64, resource: f64, processing: f64) -> f64 {
    (0.3 * circuit_breaker + 0.3 * resource + 0.4 * processing).clamp(0.0, 1.0)
}
