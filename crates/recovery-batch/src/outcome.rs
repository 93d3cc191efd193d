use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::events::BatchEvent;
use crate::item::{FailedItem, ItemFailure};
use crate::stats::BatchStats;
#[cfg(feature = "metrics")]
use metrics::counter;
use recovery_core::FailureClassification;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    Success,
    PartialSuccess,
    Failed,
}

impl BatchOutcome {
    /// The batch-level policy shared by every execution strategy.
    ///
    /// An empty batch is a success. Otherwise the batch fails when its success
    /// rate is below `100 - failure_threshold_percentage` and partial success
    /// is disabled or nothing succeeded. A batch with both successes and
    /// failures is a partial success when partial success is enabled.
    pub fn decide(successful: usize, failed: usize, config: &BatchConfig) -> BatchOutcome {
        let total = successful + failed;
        if total == 0 {
            return BatchOutcome::Success;
        }

        let rate = success_rate(successful, total);
        let below_threshold = rate < 100.0 - config.failure_threshold_percentage;
        if below_threshold && (!config.enable_partial_success || successful == 0) {
            return BatchOutcome::Failed;
        }

        if config.enable_partial_success && successful > 0 && failed > 0 {
            BatchOutcome::PartialSuccess
        } else {
            BatchOutcome::Success
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchOutcome::Success => "success",
            BatchOutcome::PartialSuccess => "partial_success",
            BatchOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentage of successful items, 0 for an empty batch.
pub fn success_rate(successful: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        successful as f64 / total as f64 * 100.0
    }
}

/// Output of a batch that did not fail.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult<I, R> {
    pub total_items: usize,
    pub successful_items: usize,
    pub failed_items: usize,
    pub success_rate: f64,
    pub processing_time: Duration,
    /// In completion order, which is unspecified.
    pub successful_results: Vec<R>,
    pub failed_results: Vec<FailedItem<I>>,
    pub partial_success: bool,
    pub error_summary: BTreeMap<FailureClassification, usize>,
}

/// Folds per-item outcomes into the batch result and applies the batch
/// policy, updating stats, counters and listeners on the way.
pub(crate) fn finish<I, R>(
    config: &BatchConfig,
    stats: &BatchStats,
    outcomes: Vec<Result<R, FailedItem<I>>>,
    started: Instant,
) -> Result<BatchResult<I, R>, BatchError> {
    let total = outcomes.len();
    let mut successful_results = Vec::with_capacity(total);
    let mut failed_results = Vec::new();
    let mut error_summary: BTreeMap<FailureClassification, usize> = BTreeMap::new();

    for outcome in outcomes {
        match outcome {
            Ok(value) => successful_results.push(value),
            Err(failed) => {
                *error_summary.entry(failed.classification).or_insert(0) += 1;
                config.counters.record_processing_failure();
                failed_results.push(failed);
            }
        }
    }

    let successful = successful_results.len();
    let failed = failed_results.len();
    let outcome = BatchOutcome::decide(successful, failed, config);
    stats.record(outcome, total, failed);

    config.event_listeners.emit(&BatchEvent::Completed {
        name: config.name.clone(),
        timestamp: Instant::now(),
        total,
        successful,
        outcome,
    });

    #[cfg(feature = "metrics")]
    {
        counter!("batch_runs_total", "batch" => config.name.clone(), "outcome" => outcome.as_str())
            .increment(1);
        counter!("batch_items_total", "batch" => config.name.clone(), "outcome" => "success")
            .increment(successful as u64);
        counter!("batch_items_total", "batch" => config.name.clone(), "outcome" => "failure")
            .increment(failed as u64);
    }

    if outcome == BatchOutcome::Failed {
        #[cfg(feature = "tracing")]
        tracing::warn!(batch = %config.name, total, failed, ?error_summary, "batch failed");

        return Err(BatchError::Failed {
            name: config.name.clone(),
            total,
            failed_items: failed_results.iter().map(ItemFailure::from).collect(),
        });
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(batch = %config.name, total, successful, failed, %outcome, "batch finished");

    Ok(BatchResult {
        total_items: total,
        successful_items: successful,
        failed_items: failed,
        success_rate: success_rate(successful, total),
        processing_time: started.elapsed(),
        successful_results,
        failed_results,
        partial_success: outcome == BatchOutcome::PartialSuccess,
        error_summary,
    })
}
