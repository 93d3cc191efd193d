use crate::category::OperationCategory;
use crate::result::RecoveryResult;
use recovery_core::FailureClassification;
use std::error::Error;
use std::fmt;

/// A failure that crossed an error boundary, together with the recovery
/// decision made for it.
///
/// Displays as the original error and exposes the original error's source,
/// so callers matching on messages or walking the chain see what they would
/// have seen without the boundary.
#[derive(Debug)]
pub struct BoundaryError<E> {
    error: E,
    recovery: RecoveryResult,
    classification: FailureClassification,
    category: OperationCategory,
}

impl<E> BoundaryError<E> {
    pub(crate) fn new(
        error: E,
        recovery: RecoveryResult,
        classification: FailureClassification,
        category: OperationCategory,
    ) -> Self {
        Self {
            error,
            recovery,
            classification,
            category,
        }
    }

    pub fn error(&self) -> &E {
        &self.error
    }

    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    pub fn classification(&self) -> FailureClassification {
        self.classification
    }

    pub fn category(&self) -> OperationCategory {
        self.category
    }

    pub fn into_inner(self) -> E {
        self.error
    }

    pub fn into_parts(self) -> (E, RecoveryResult) {
        (self.error, self.recovery)
    }
}

impl<E: fmt::Display> fmt::Display for BoundaryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl<E: Error + 'static> Error for BoundaryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.error.source()
    }
}
