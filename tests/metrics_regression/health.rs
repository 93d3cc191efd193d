//! Health metrics regression tests

use super::helpers::*;
use recovery_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerRegistry};
use recovery_core::FailureCounters;
use recovery_health::{HealthConfig, HealthMonitor, StaticProbe};
use serial_test::serial;
use std::sync::Arc;

#[test]
#[serial]
fn health_metrics_exist() {
    init_recorder();

    let monitor = HealthMonitor::new(
        HealthConfig::builder()
            .registry(Arc::new(CircuitBreakerRegistry::new(
                CircuitBreakerConfig::default(),
            )))
            .counters(Arc::new(FailureCounters::new()))
            .probe(StaticProbe::new(95.0, 10.0, 10.0))
            .build(),
    );
    monitor.check_system_health();

    assert_gauge_exists("health_overall");
    assert_counter_exists("health_alerts_total");
    assert_metric_has_label("health_alerts_total", "severity", "critical");
}
