use crate::category::OperationCategory;
use crate::result::RecoveryStrategy;
use recovery_core::events::ResilienceEvent;
use recovery_core::FailureClassification;
use std::time::Instant;

/// Events emitted by the recovery dispatcher.
#[derive(Debug, Clone)]
pub enum RecoveryEvent {
    /// A failure was mapped to a strategy.
    Decision {
        name: String,
        timestamp: Instant,
        category: OperationCategory,
        classification: FailureClassification,
        strategy: RecoveryStrategy,
    },
    /// The policy itself failed; the generic escalation was returned.
    PolicyFailure {
        name: String,
        timestamp: Instant,
        category: OperationCategory,
    },
}

impl ResilienceEvent for RecoveryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RecoveryEvent::Decision { .. } => "decision",
            RecoveryEvent::PolicyFailure { .. } => "policy_failure",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RecoveryEvent::Decision { timestamp, .. }
            | RecoveryEvent::PolicyFailure { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            RecoveryEvent::Decision { name, .. } | RecoveryEvent::PolicyFailure { name, .. } => name,
        }
    }
}
