//! Health aggregator tests.
//!
//! Test organization:
//! - alerts.rs: cooldown, resolution and callbacks
//! - monitor.rs: scoring against registry, counters and resource probe


use recovery_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerRegistry};
use recovery_core::FailureCounters;
use recovery_health::{HealthConfig, HealthConfigBuilder, StaticProbe};
use std::sync::Arc;

pub(crate) struct Deps {
    pub(crate) registry: Arc<CircuitBreakerRegistry>,
    pub(crate) counters: Arc<FailureCounters>,
}

impl Deps {
    pub(crate) fn new() -> Self {
        Self {
            registry: Arc::new(CircuitBreakerRegistry::new(
                CircuitBreakerConfig::builder().failure_threshold(1).build(),
            )),
            counters: Arc::new(FailureCounters::new()),
        }
    }

    pub(crate) fn config(&self, probe: StaticProbe) -> HealthConfigBuilder {
        HealthConfig::builder()
            .name("test")
            .registry(Arc::clone(&self.registry))
            .counters(Arc::clone(&self.counters))
            .probe(probe)
    }
}

pub(crate) fn idle() -> StaticProbe {
    StaticProbe::new(20.0, 30.0, 10.0)
}
