use crate::category::OperationCategory;
use crate::result::RecoveryStrategy;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use recovery_circuitbreaker::CircuitState;
use recovery_core::FailureClassification;
use serde::Serialize;
use std::collections::BTreeMap;

/// Strategy counts per category.
pub type StrategyHistogram = BTreeMap<OperationCategory, BTreeMap<RecoveryStrategy, u64>>;

#[derive(Debug, Default)]
pub(crate) struct Histogram {
    counts: Mutex<StrategyHistogram>,
}

impl Histogram {
    pub(crate) fn record(&self, category: OperationCategory, strategy: RecoveryStrategy) {
        *self
            .counts
            .lock()
            .entry(category)
            .or_default()
            .entry(strategy)
            .or_insert(0) += 1;
    }

    pub(crate) fn snapshot(&self) -> StrategyHistogram {
        self.counts.lock().clone()
    }

    /// Empties the histogram and returns how many (category, strategy)
    /// entries it held.
    pub(crate) fn clear(&self) -> usize {
        let mut counts = self.counts.lock();
        let cleared = counts.values().map(BTreeMap::len).sum();
        counts.clear();
        cleared
    }
}

/// A short view of one breaker for the recovery report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerSummary {
    pub state: CircuitState,
    pub failure_count: usize,
    pub last_failure: Option<DateTime<Utc>>,
}

/// Aggregate recovery statistics.
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryStats {
    pub recovery_stats: StrategyHistogram,
    pub circuit_breakers: BTreeMap<String, BreakerSummary>,
    pub error_counts: BTreeMap<FailureClassification, u64>,
}

impl RecoveryStats {
    pub fn total_recoveries(&self) -> u64 {
        self.recovery_stats
            .values()
            .flat_map(BTreeMap::values)
            .sum()
    }

    pub fn count(&self, category: OperationCategory, strategy: RecoveryStrategy) -> u64 {
        self.recovery_stats
            .get(&category)
            .and_then(|strategies| strategies.get(&strategy))
            .copied()
            .unwrap_or(0)
    }
}
