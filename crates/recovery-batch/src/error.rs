use crate::item::ItemFailure;
use thiserror::Error;

/// Errors returned by the batch processor.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Too many items failed and partial success was not accepted.
    #[error("batch '{name}' failed: {} of {total} items failed", .failed_items.len())]
    Failed {
        name: String,
        total: usize,
        failed_items: Vec<ItemFailure>,
    },

    /// The worker pool for a blocking batch could not be started.
    #[error("could not start batch worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl BatchError {
    pub fn is_failed(&self) -> bool {
        matches!(self, BatchError::Failed { .. })
    }

    /// Identifiers of the failed items; empty for worker pool errors.
    pub fn failed_item_ids(&self) -> Vec<&str> {
        match self {
            BatchError::Failed { failed_items, .. } => {
                failed_items.iter().map(|failed| failed.item_id.as_str()).collect()
            }
            BatchError::WorkerPool(_) => Vec::new(),
        }
    }
}
