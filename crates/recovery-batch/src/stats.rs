use crate::outcome::BatchOutcome;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals across every batch a processor has run.
#[derive(Debug, Default)]
pub(crate) struct BatchStats {
    total_batches: AtomicU64,
    successful_batches: AtomicU64,
    failed_batches: AtomicU64,
    partial_success_batches: AtomicU64,
    total_items_processed: AtomicU64,
    total_items_failed: AtomicU64,
}

impl BatchStats {
    pub(crate) fn record(&self, outcome: BatchOutcome, items: usize, failed: usize) {
        self.total_batches.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            BatchOutcome::Success => &self.successful_batches,
            BatchOutcome::PartialSuccess => &self.partial_success_batches,
            BatchOutcome::Failed => &self.failed_batches,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.total_items_processed
            .fetch_add(items as u64, Ordering::Relaxed);
        self.total_items_failed
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> BatchStatsSnapshot {
        BatchStatsSnapshot {
            total_batches: self.total_batches.load(Ordering::Relaxed),
            successful_batches: self.successful_batches.load(Ordering::Relaxed),
            failed_batches: self.failed_batches.load(Ordering::Relaxed),
            partial_success_batches: self.partial_success_batches.load(Ordering::Relaxed),
            total_items_processed: self.total_items_processed.load(Ordering::Relaxed),
            total_items_failed: self.total_items_failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a processor's running totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStatsSnapshot {
    pub total_batches: u64,
    pub successful_batches: u64,
    pub failed_batches: u64,
    pub partial_success_batches: u64,
    pub total_items_processed: u64,
    pub total_items_failed: u64,
}
