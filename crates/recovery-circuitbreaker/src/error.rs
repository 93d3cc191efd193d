use std::time::Duration;
use thiserror::Error;

/// Errors returned by a circuit breaker call.
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// The circuit is open; the operation was not invoked.
    #[error("circuit breaker '{name}' is open; dependency unavailable")]
    OpenCircuit { name: String },

    /// The operation ran past the breaker's call timeout.
    #[error("call to '{name}' timed out after {}ms", .timeout.as_millis())]
    Timeout { name: String, timeout: Duration },

    /// The operation itself failed.
    #[error(transparent)]
    Inner(E),
}

impl<E> CircuitBreakerError<E> {
    /// Returns true if the call was rejected by an open circuit.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CircuitBreakerError::OpenCircuit { .. })
    }

    /// Returns true if the call exceeded the call timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CircuitBreakerError::Timeout { .. })
    }

    /// Returns the operation's own error, if that is what failed.
    pub fn into_inner(self) -> Option<E> {
        match self {
            CircuitBreakerError::Inner(e) => Some(e),
            _ => None,
        }
    }
}
