//! Recovery decision metrics regression tests

use super::helpers::*;
use recovery_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerRegistry};
use recovery_core::{ErrorContext, Failure, FailureCounters};
use recovery_dispatch::{DispatcherConfig, OperationCategory, RecoveryDispatcher};
use serial_test::serial;
use std::sync::Arc;

#[test]
#[serial]
fn recovery_decision_metrics_exist() {
    init_recorder();

    let dispatcher = RecoveryDispatcher::new(
        DispatcherConfig::builder()
            .registry(Arc::new(CircuitBreakerRegistry::new(
                CircuitBreakerConfig::default(),
            )))
            .counters(Arc::new(FailureCounters::new()))
            .build(),
    );
    let context = ErrorContext::new("extract", "extractor");
    dispatcher.handle(
        &Failure::timeout("timed out"),
        &context,
        OperationCategory::DataExtraction,
    );

    assert_counter_exists("recovery_decisions_total");
    assert_metric_has_label("recovery_decisions_total", "category", "data_extraction");
    assert_metric_has_label("recovery_decisions_total", "strategy", "retry_with_backoff");
}
