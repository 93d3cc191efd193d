//! Shared failure counters.
//!
//! Retry, circuit breaking, dispatch and batching all report into a
//! [`FailureCounters`]; the health monitor reads from it. One lock guards the
//! whole structure, and no method holds it longer than a few map updates.
//!
//! Per-classification totals are kept until cleared. Everything else is
//! windowed: an event stops counting once it is older than the window, so
//! health recovers after a burst of failures ends.

use crate::classify::FailureClassification;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

const DEFAULT_ERROR_WINDOW: Duration = Duration::from_secs(300);
const MAX_RECENT_ERRORS: usize = 10_000;

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CounterSnapshot {
    /// Total errors per classification since the last clear.
    pub error_counts: BTreeMap<FailureClassification, u64>,
    /// Errors recorded inside the recent-error window.
    pub recent_errors: usize,
    /// Failed generative or bulk processing items inside the window.
    pub processing_failures: u64,
    /// Failed prerequisite checks inside the window.
    pub prerequisite_failures: u64,
    /// Retry loops that gave up on a retryable failure, inside the window.
    pub retry_exhaustions: u64,
}

impl CounterSnapshot {
    pub fn total_errors(&self) -> u64 {
        self.error_counts.values().sum()
    }
}

/// Timestamps of one kind of event, oldest first.
#[derive(Debug, Default)]
struct Window(VecDeque<Instant>);

impl Window {
    fn push(&mut self) {
        self.0.push_back(Instant::now());
        if self.0.len() > MAX_RECENT_ERRORS {
            self.0.pop_front();
        }
    }

    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(at) = self.0.front() {
            if now.duration_since(*at) > window {
                self.0.pop_front();
            } else {
                break;
            }
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn count(&self) -> u64 {
        self.0.len() as u64
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Default)]
struct CounterState {
    error_counts: BTreeMap<FailureClassification, u64>,
    recent: Window,
    processing: Window,
    prerequisite: Window,
    exhausted: Window,
}

impl CounterState {
    fn prune(&mut self, window: Duration) {
        let now = Instant::now();
        self.recent.prune(now, window);
        self.processing.prune(now, window);
        self.prerequisite.prune(now, window);
        self.exhausted.prune(now, window);
    }
}

/// Concurrency-safe failure counters.
#[derive(Debug)]
pub struct FailureCounters {
    state: Mutex<CounterState>,
    window: Duration,
}

impl FailureCounters {
    /// Creates counters with a five minute recent-error window.
    pub fn new() -> Self {
        Self::with_window(DEFAULT_ERROR_WINDOW)
    }

    /// Creates counters whose windowed counts only include events recorded
    /// within `window`.
    pub fn with_window(window: Duration) -> Self {
        Self {
            state: Mutex::new(CounterState::default()),
            window,
        }
    }

    /// The process-wide default instance.
    pub fn global() -> Arc<FailureCounters> {
        static GLOBAL: OnceLock<Arc<FailureCounters>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(FailureCounters::new())))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn record_error(&self, classification: FailureClassification) {
        let mut state = self.state.lock();
        *state.error_counts.entry(classification).or_insert(0) += 1;
        state.recent.push();
    }

    pub fn record_processing_failure(&self) {
        self.state.lock().processing.push();
    }

    pub fn record_prerequisite_failure(&self) {
        self.state.lock().prerequisite.push();
    }

    pub fn record_retry_exhausted(&self) {
        self.state.lock().exhausted.push();
    }

    /// Retry exhaustions within the window.
    pub fn retry_exhaustions(&self) -> u64 {
        let mut state = self.state.lock();
        state.prune(self.window);
        state.exhausted.count()
    }

    /// Errors recorded within the recent-error window.
    pub fn recent_error_count(&self) -> usize {
        let mut state = self.state.lock();
        state.prune(self.window);
        state.recent.len()
    }

    pub fn error_counts(&self) -> BTreeMap<FailureClassification, u64> {
        self.state.lock().error_counts.clone()
    }

    /// Returns the `n` most frequent classifications, most frequent first.
    /// Ties are broken by classification order.
    pub fn top_errors(&self, n: usize) -> Vec<(FailureClassification, u64)> {
        let mut counts: Vec<_> = self.error_counts().into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        counts.truncate(n);
        counts
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        let mut state = self.state.lock();
        state.prune(self.window);
        CounterSnapshot {
            error_counts: state.error_counts.clone(),
            recent_errors: state.recent.len(),
            processing_failures: state.processing.count(),
            prerequisite_failures: state.prerequisite.count(),
            retry_exhaustions: state.exhausted.count(),
        }
    }

    /// Zeroes every counter.
    ///
    /// Returns how many non-empty entries were cleared: one per
    /// classification bucket plus one per non-empty failure window.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        state.prune(self.window);
        let cleared = state.error_counts.len()
            + [&state.processing, &state.prerequisite, &state.exhausted]
                .iter()
                .filter(|window| !window.is_empty())
                .count();
        *state = CounterState::default();
        cleared
    }
}

impl Default for FailureCounters {
    fn default() -> Self {
        Self::new()
    }
}
