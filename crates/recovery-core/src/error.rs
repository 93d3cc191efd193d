//! A self-classifying error type for domain code.

use crate::classify::FailureClassification;
use std::error::Error;

type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// An error that carries its own [`FailureClassification`].
///
/// Domain operations that know why they failed can return a `Failure` and
/// skip message matching entirely. A `Failure` without a classification is
/// classified from its message like any other error.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct Failure {
    classification: Option<FailureClassification>,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl Failure {
    /// Creates a classified failure.
    pub fn new(classification: FailureClassification, message: impl Into<String>) -> Self {
        Self {
            classification: Some(classification),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a failure that will be classified from its message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            classification: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureClassification::Timeout, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(FailureClassification::Connection, message)
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Self::new(FailureClassification::Resource, message)
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(FailureClassification::Permission, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureClassification::Validation, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(FailureClassification::Conflict, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(FailureClassification::RateLimit, message)
    }

    /// Attaches an underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the explicit classification, if one was given.
    pub fn classification(&self) -> Option<FailureClassification> {
        self.classification
    }

    pub fn message_text(&self) -> &str {
        &self.message
    }
}
