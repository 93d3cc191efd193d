use crate::circuit::CircuitState;
use recovery_core::events::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by a circuit breaker.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The circuit moved between states.
    StateTransition {
        name: String,
        timestamp: Instant,
        from_state: CircuitState,
        to_state: CircuitState,
    },
    /// A call was let through.
    CallPermitted {
        name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A call was rejected without invoking the operation.
    CallRejected { name: String, timestamp: Instant },
    /// A call completed successfully.
    SuccessRecorded {
        name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A call failed or timed out.
    FailureRecorded {
        name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A call exceeded the call timeout.
    CallTimedOut {
        name: String,
        timestamp: Instant,
        timeout: Duration,
    },
    /// The breaker was reset administratively.
    Reset { name: String, timestamp: Instant },
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "failure_recorded",
            CircuitBreakerEvent::CallTimedOut { .. } => "call_timed_out",
            CircuitBreakerEvent::Reset { .. } => "reset",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::SuccessRecorded { timestamp, .. }
            | CircuitBreakerEvent::FailureRecorded { timestamp, .. }
            | CircuitBreakerEvent::CallTimedOut { timestamp, .. }
            | CircuitBreakerEvent::Reset { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { name, .. }
            | CircuitBreakerEvent::CallPermitted { name, .. }
            | CircuitBreakerEvent::CallRejected { name, .. }
            | CircuitBreakerEvent::SuccessRecorded { name, .. }
            | CircuitBreakerEvent::FailureRecorded { name, .. }
            | CircuitBreakerEvent::CallTimedOut { name, .. }
            | CircuitBreakerEvent::Reset { name, .. } => name,
        }
    }
}
