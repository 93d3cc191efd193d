use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
use chrono::{DateTime, Utc};
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum CircuitState {
    /// Calls pass through and failures are counted.
    Closed = 0,
    /// Calls are rejected without invoking the operation.
    Open = 1,
    /// A single trial call at a time is let through.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The thresholds a breaker was configured with.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConfigSnapshot {
    pub failure_threshold: usize,
    pub recovery_timeout: Duration,
    pub success_threshold: usize,
    pub call_timeout: Duration,
}

/// Point-in-time statistics of one breaker.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CircuitBreakerStats {
    pub name: String,
    pub state: CircuitState,
    /// Consecutive failures while closed.
    pub failure_count: usize,
    /// Consecutive successes while half-open.
    pub success_count: usize,
    /// Every call attempt, rejected ones included.
    pub total_requests: u64,
    pub total_failures: u64,
    pub total_successes: u64,
    pub rejected_requests: u64,
    /// Successful calls as a percentage of all requests; 0 before the first
    /// request.
    pub success_rate: f64,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub last_success_time: Option<DateTime<Utc>>,
    pub time_in_state: Duration,
    pub config: ConfigSnapshot,
}

/// Outcome of asking the circuit for permission to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Permitted,
    Trial,
    Rejected,
}

pub(crate) struct Circuit {
    name: String,
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    last_state_change: Instant,
    failure_count: usize,
    success_count: usize,
    trial_in_flight: bool,
    /// Bumped on every transition; permits from an older generation are stale.
    generation: u64,
    total_requests: u64,
    total_failures: u64,
    total_successes: u64,
    rejected_requests: u64,
    last_failure: Option<(Instant, DateTime<Utc>)>,
    last_success: Option<DateTime<Utc>>,
}

impl Circuit {
    pub(crate) fn new(name: String, state_atomic: Arc<AtomicU8>) -> Self {
        state_atomic.store(CircuitState::Closed as u8, Ordering::Release);
        Self {
            name,
            state: CircuitState::Closed,
            state_atomic,
            last_state_change: Instant::now(),
            failure_count: 0,
            success_count: 0,
            trial_in_flight: false,
            generation: 0,
            total_requests: 0,
            total_failures: 0,
            total_successes: 0,
            rejected_requests: 0,
            last_failure: None,
            last_success: None,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn try_acquire(&mut self, config: &CircuitBreakerConfig) -> Admission {
        self.total_requests += 1;

        let admission = match self.state {
            CircuitState::Closed => Admission::Permitted,
            CircuitState::Open => {
                let since = self
                    .last_failure
                    .map(|(at, _)| at)
                    .unwrap_or(self.last_state_change);
                if since.elapsed() >= config.recovery_timeout {
                    self.transition_to(CircuitState::HalfOpen, config);
                    self.trial_in_flight = true;
                    Admission::Trial
                } else {
                    Admission::Rejected
                }
            }
            CircuitState::HalfOpen => {
                if self.trial_in_flight {
                    Admission::Rejected
                } else {
                    self.trial_in_flight = true;
                    Admission::Trial
                }
            }
        };

        if admission == Admission::Rejected {
            self.rejected_requests += 1;
            config.event_listeners.emit(&CircuitBreakerEvent::CallRejected {
                name: self.name.clone(),
                timestamp: Instant::now(),
            });

            #[cfg(feature = "metrics")]
            counter!("circuitbreaker_calls_total", "circuitbreaker" => self.name.clone(), "outcome" => "rejected").increment(1);
        } else {
            config.event_listeners.emit(&CircuitBreakerEvent::CallPermitted {
                name: self.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            });
        }

        admission
    }

    /// Gives back a trial slot whose call never completed. Only the trial of
    /// the current generation holds the slot.
    pub fn release_trial(&mut self, generation: u64) {
        if self.state == CircuitState::HalfOpen && generation == self.generation {
            self.trial_in_flight = false;
        }
    }

    /// Records the success of a call admitted in `generation`. A call from an
    /// earlier generation only counts towards the totals.
    pub fn finish_success(&mut self, generation: u64, config: &CircuitBreakerConfig) {
        if generation == self.generation {
            self.record_success(config);
        } else {
            self.note_success(config);
        }
    }

    /// Records the failure of a call admitted in `generation`. A call from an
    /// earlier generation only counts towards the totals.
    pub fn finish_failure(&mut self, generation: u64, config: &CircuitBreakerConfig) {
        if generation == self.generation {
            self.record_failure(config);
        } else {
            self.note_failure(config);
        }
    }

    pub fn record_success(&mut self, config: &CircuitBreakerConfig) {
        self.note_success(config);

        match self.state {
            CircuitState::Closed => self.failure_count = 0,
            CircuitState::HalfOpen => {
                self.trial_in_flight = false;
                self.success_count += 1;
                if self.success_count >= config.success_threshold {
                    self.transition_to(CircuitState::Closed, config);
                }
            }
            // a call admitted before the circuit opened finished late
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&mut self, config: &CircuitBreakerConfig) {
        self.note_failure(config);

        match self.state {
            CircuitState::Closed => {
                self.failure_count += 1;
                if self.failure_count >= config.failure_threshold {
                    self.transition_to(CircuitState::Open, config);
                }
            }
            CircuitState::HalfOpen => {
                self.trial_in_flight = false;
                self.transition_to(CircuitState::Open, config);
            }
            CircuitState::Open => {}
        }
    }

    fn note_success(&mut self, config: &CircuitBreakerConfig) {
        self.total_successes += 1;
        self.last_success = Some(Utc::now());

        config.event_listeners.emit(&CircuitBreakerEvent::SuccessRecorded {
            name: self.name.clone(),
            timestamp: Instant::now(),
            state: self.state,
        });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => self.name.clone(), "outcome" => "success").increment(1);
    }

    fn note_failure(&mut self, config: &CircuitBreakerConfig) {
        self.total_failures += 1;
        // failures reported while open do not push back the recovery window
        let at = match (self.state, self.last_failure) {
            (CircuitState::Open, Some((at, _))) => at,
            _ => Instant::now(),
        };
        self.last_failure = Some((at, Utc::now()));

        config.event_listeners.emit(&CircuitBreakerEvent::FailureRecorded {
            name: self.name.clone(),
            timestamp: Instant::now(),
            state: self.state,
        });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => self.name.clone(), "outcome" => "failure").increment(1);
    }

    /// Forces the circuit closed and zeroes every counter.
    pub fn reset(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
        self.total_requests = 0;
        self.total_failures = 0;
        self.total_successes = 0;
        self.rejected_requests = 0;
        self.last_failure = None;
        self.last_success = None;

        config.event_listeners.emit(&CircuitBreakerEvent::Reset {
            name: self.name.clone(),
            timestamp: Instant::now(),
        });
    }

    pub fn stats(&self, config: &CircuitBreakerConfig) -> CircuitBreakerStats {
        let success_rate = if self.total_requests > 0 {
            self.total_successes as f64 / self.total_requests as f64 * 100.0
        } else {
            0.0
        };

        CircuitBreakerStats {
            name: self.name.clone(),
            state: self.state,
            failure_count: self.failure_count,
            success_count: self.success_count,
            total_requests: self.total_requests,
            total_failures: self.total_failures,
            total_successes: self.total_successes,
            rejected_requests: self.rejected_requests,
            success_rate,
            last_failure_time: self.last_failure.map(|(_, at)| at),
            last_success_time: self.last_success,
            time_in_state: self.last_state_change.elapsed(),
            config: ConfigSnapshot {
                failure_threshold: config.failure_threshold,
                recovery_timeout: config.recovery_timeout,
                success_threshold: config.success_threshold,
                call_timeout: config.call_timeout,
            },
        }
    }

    fn transition_to(&mut self, state: CircuitState, config: &CircuitBreakerConfig) {
        let from_state = self.state;

        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        self.last_state_change = Instant::now();
        self.failure_count = 0;
        self.success_count = 0;
        self.trial_in_flight = false;
        self.generation = self.generation.wrapping_add(1);

        if from_state == state {
            return;
        }

        config.event_listeners.emit(&CircuitBreakerEvent::StateTransition {
            name: self.name.clone(),
            timestamp: Instant::now(),
            from_state,
            to_state: state,
        });

        #[cfg(feature = "tracing")]
        tracing::info!(breaker = %self.name, from = %from_state, to = %state, "circuit state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "circuitbreaker_transitions_total",
                "circuitbreaker" => self.name.clone(),
                "from" => from_state.as_str(),
                "to" => state.as_str()
            )
            .increment(1);

            gauge!("circuitbreaker_state", "circuitbreaker" => self.name.clone())
                .set(state as u8 as f64);
        }
    }
}
