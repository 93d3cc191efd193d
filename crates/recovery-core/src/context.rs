//! Immutable context passed to every recovery decision.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata key carrying how many times the same logical operation has
/// already been retried.
pub const RETRY_COUNT_KEY: &str = "retry_count";

/// Who was doing what when a failure happened.
///
/// Contexts are values: every `with_*` method consumes the context and
/// returns a new one. Callers retrying a logical operation build the next
/// context with [`next_attempt`](Self::next_attempt), which copies all
/// fields forward and bumps `retry_count`.
///
/// # Example
///
/// ```rust
/// use recovery_core::ErrorContext;
///
/// let ctx = ErrorContext::new("create_pseudonym", "onboarding")
///     .with_user_id("u-42")
///     .with_metadata("dependency", "identity-store");
///
/// assert_eq!(ctx.retry_count(), 0);
/// let next = ctx.next_attempt();
/// assert_eq!(next.retry_count(), 1);
/// assert_eq!(next.user_id(), Some("u-42"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    user_id: Option<String>,
    pseudonym_id: Option<String>,
    session_id: Option<String>,
    operation: String,
    component: String,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            component: component.into(),
            ..Self::default()
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_pseudonym_id(mut self, pseudonym_id: impl Into<String>) -> Self {
        self.pseudonym_id = Some(pseudonym_id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_retry_count(self, retry_count: u32) -> Self {
        self.with_metadata(RETRY_COUNT_KEY, retry_count)
    }

    /// Returns a copy of this context for the next attempt of the same
    /// operation.
    pub fn next_attempt(&self) -> Self {
        self.clone()
            .with_retry_count(self.retry_count().saturating_add(1))
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn pseudonym_id(&self) -> Option<&str> {
        self.pseudonym_id.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Returns a string metadata value.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Number of earlier attempts of this operation.
    ///
    /// Accepts an integer or a numeric string; anything else reads as 0.
    pub fn retry_count(&self) -> u32 {
        match self.metadata.get(RETRY_COUNT_KEY) {
            Some(Value::Number(n)) => n
                .as_u64()
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}
