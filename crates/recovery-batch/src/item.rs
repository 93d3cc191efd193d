use crate::config::BatchConfig;
use recovery_core::FailureClassification;
use serde::Serialize;
use std::error::Error;

/// Anything that can be submitted to a batch.
///
/// `item_id` names the item in failure reports.
pub trait BatchItem {
    fn item_id(&self) -> String;
}

macro_rules! display_item_id {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BatchItem for $ty {
                fn item_id(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_item_id!(String, &str, u32, u64, usize, i32, i64);

/// An item that used up its attempts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedItem<I> {
    pub item: I,
    pub item_id: String,
    /// Display text of the last error.
    pub error: String,
    pub attempts: usize,
    pub classification: FailureClassification,
}

/// A failed item in a batch failure report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub item_id: String,
    pub error: String,
    pub attempts: usize,
    pub classification: FailureClassification,
}

impl<I> From<&FailedItem<I>> for ItemFailure {
    fn from(failed: &FailedItem<I>) -> Self {
        Self {
            item_id: failed.item_id.clone(),
            error: failed.error.clone(),
            attempts: failed.attempts,
            classification: failed.classification,
        }
    }
}

/// Why one attempt at an item did not succeed.
#[derive(Debug, Clone)]
pub(crate) struct AttemptFailure {
    pub(crate) message: String,
    pub(crate) classification: FailureClassification,
}

impl AttemptFailure {
    pub(crate) fn from_error<E: Error + 'static>(error: &E, config: &BatchConfig) -> Self {
        Self {
            message: error.to_string(),
            classification: config.classifier.classify(error),
        }
    }

    pub(crate) fn cancelled() -> Self {
        Self {
            message: "unit operation did not complete".to_string(),
            classification: FailureClassification::Unknown,
        }
    }

    pub(crate) fn panicked() -> Self {
        Self {
            message: "unit operation panicked".to_string(),
            classification: FailureClassification::Unknown,
        }
    }

    pub(crate) fn into_failed<I: BatchItem>(self, item: I, attempts: usize) -> FailedItem<I> {
        FailedItem {
            item_id: item.item_id(),
            item,
            error: self.message,
            attempts,
            classification: self.classification,
        }
    }
}
