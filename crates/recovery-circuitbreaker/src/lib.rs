//! Per-dependency circuit breakers.
//!
//! A breaker guards one named dependency:
//!
//! - **Closed**: calls pass through; consecutive failures are counted and the
//!   circuit opens when they reach `failure_threshold`. A success resets the
//!   count.
//! - **Open**: calls are rejected with [`CircuitBreakerError::OpenCircuit`]
//!   without invoking the operation. Once `recovery_timeout` has elapsed since
//!   the last failure, the next call attempt moves the circuit to half-open.
//!   There is no background timer.
//! - **Half-open**: one trial call at a time is let through. Any failure
//!   reopens the circuit; `success_threshold` consecutive successes close it.
//!
//! Every call runs under the breaker's call timeout. A call that exceeds it
//! counts as a failure and returns [`CircuitBreakerError::Timeout`].
//!
//! Breakers are usually obtained from a [`CircuitBreakerRegistry`], which
//! creates them on first use of a name and answers cross-cutting questions
//! such as which dependencies are currently unhealthy.
//!
//! # Example
//!
//! ```rust
//! use recovery_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let registry = CircuitBreakerRegistry::new(
//!     CircuitBreakerConfig::builder()
//!         .failure_threshold(2)
//!         .recovery_timeout(Duration::from_secs(30))
//!         .build(),
//! );
//!
//! let breaker = registry.get_or_create("image-service");
//! for _ in 0..2 {
//!     let _ = breaker
//!         .call(|| async { Err::<(), _>(std::io::Error::other("503")) })
//!         .await;
//! }
//!
//! assert_eq!(breaker.state(), CircuitState::Open);
//! assert_eq!(registry.unhealthy(), vec!["image-service".to_string()]);
//! # }
//! ```

mod circuit;
mod config;
mod error;
mod events;
mod layer;
mod registry;

pub use circuit::{CircuitBreakerStats, CircuitState, ConfigSnapshot};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;
pub use layer::{CircuitBreakerLayer, CircuitBreakerService};
pub use registry::CircuitBreakerRegistry;

use circuit::{Admission, Circuit};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Shared {
    name: String,
    config: CircuitBreakerConfig,
    circuit: Mutex<Circuit>,
    state_atomic: Arc<AtomicU8>,
}

/// A handle to one named circuit breaker. Clones share state.
#[derive(Clone)]
pub struct CircuitBreaker {
    shared: Arc<Shared>,
}

impl CircuitBreaker {
    /// Creates a standalone breaker. Prefer
    /// [`CircuitBreakerRegistry::get_or_create`] so the breaker is visible to
    /// health checks.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        let circuit = Circuit::new(name.clone(), Arc::clone(&state_atomic));
        Self {
            shared: Arc::new(Shared {
                name,
                config,
                circuit: Mutex::new(circuit),
                state_atomic,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.shared.config
    }

    /// Current state, read without taking the lock.
    ///
    /// An open circuit whose recovery timeout has elapsed still reports
    /// `Open` until the next call attempt.
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.shared.state_atomic.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    /// Runs `operation` through the breaker, bounded by the call timeout.
    pub async fn call<T, E, F, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = self.acquire()?;
        let timeout = self.shared.config.call_timeout;

        match tokio::time::timeout(timeout, operation()).await {
            Ok(Ok(value)) => {
                permit.success();
                Ok(value)
            }
            Ok(Err(error)) => {
                permit.failure();
                Err(CircuitBreakerError::Inner(error))
            }
            Err(_) => {
                permit.timed_out();
                Err(CircuitBreakerError::Timeout {
                    name: self.shared.name.clone(),
                    timeout,
                })
            }
        }
    }

    /// Runs a blocking `operation` through the breaker.
    ///
    /// A blocking call cannot be interrupted, so the timeout is checked after
    /// the fact: a call that ran longer than the call timeout is recorded as
    /// a failure and its result is discarded in favour of
    /// [`CircuitBreakerError::Timeout`].
    pub fn call_blocking<T, E, F>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let permit = self.acquire()?;
        let timeout = self.shared.config.call_timeout;
        let start = Instant::now();
        let result = operation();

        if start.elapsed() > timeout {
            permit.timed_out();
            return Err(CircuitBreakerError::Timeout {
                name: self.shared.name.clone(),
                timeout,
            });
        }

        match result {
            Ok(value) => {
                permit.success();
                Ok(value)
            }
            Err(error) => {
                permit.failure();
                Err(CircuitBreakerError::Inner(error))
            }
        }
    }

    /// Asks for permission to make one call.
    ///
    /// The returned permit must be completed with
    /// [`success`](CallPermit::success) or [`failure`](CallPermit::failure);
    /// dropping it unfinished gives back a half-open trial slot without
    /// recording an outcome.
    pub fn acquire<E>(&self) -> Result<CallPermit, CircuitBreakerError<E>> {
        let (admission, generation) = {
            let mut circuit = self.shared.circuit.lock();
            let admission = circuit.try_acquire(&self.shared.config);
            (admission, circuit.generation())
        };
        match admission {
            Admission::Rejected => Err(CircuitBreakerError::OpenCircuit {
                name: self.shared.name.clone(),
            }),
            Admission::Permitted | Admission::Trial => Ok(CallPermit {
                shared: Arc::clone(&self.shared),
                admission,
                generation,
                finished: false,
            }),
        }
    }

    /// Records a failure observed outside [`call`](Self::call), e.g. by a
    /// caller that only reports outcomes.
    pub fn record_failure(&self) {
        self.shared.circuit.lock().record_failure(&self.shared.config);
    }

    /// Records a success observed outside [`call`](Self::call).
    pub fn record_success(&self) {
        self.shared.circuit.lock().record_success(&self.shared.config);
    }

    pub fn get_stats(&self) -> CircuitBreakerStats {
        self.shared.circuit.lock().stats(&self.shared.config)
    }

    /// Forces the breaker closed and zeroes its counters.
    pub fn reset(&self) {
        self.shared.circuit.lock().reset(&self.shared.config);
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .finish()
    }
}

/// Permission to make one call through a breaker.
///
/// A permit remembers the circuit generation it was issued in. If the circuit
/// has changed state since, its outcome only counts towards the totals and
/// cannot settle or free another call's half-open trial.
#[must_use = "a permit should be completed with success() or failure()"]
pub struct CallPermit {
    shared: Arc<Shared>,
    admission: Admission,
    generation: u64,
    finished: bool,
}

impl CallPermit {
    pub fn success(mut self) {
        self.finished = true;
        self.shared
            .circuit
            .lock()
            .finish_success(self.generation, &self.shared.config);
    }

    pub fn failure(mut self) {
        self.finished = true;
        self.shared
            .circuit
            .lock()
            .finish_failure(self.generation, &self.shared.config);
    }

    /// True when this permit holds the half-open trial slot.
    pub fn is_trial(&self) -> bool {
        self.admission == Admission::Trial
    }

    pub(crate) fn timed_out(mut self) {
        self.finished = true;
        let timeout = self.shared.config.call_timeout;
        self.shared
            .config
            .event_listeners
            .emit(&CircuitBreakerEvent::CallTimedOut {
                name: self.shared.name.clone(),
                timestamp: Instant::now(),
                timeout,
            });

        #[cfg(feature = "tracing")]
        tracing::debug!(breaker = %self.shared.name, timeout_ms = timeout.as_millis() as u64, "call timed out");

        self.shared
            .circuit
            .lock()
            .finish_failure(self.generation, &self.shared.config);
    }

    pub fn call_timeout(&self) -> Duration {
        self.shared.config.call_timeout
    }
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        if !self.finished && self.admission == Admission::Trial {
            self.shared.circuit.lock().release_trial(self.generation);
        }
    }
}
