use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The reaction chosen for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy {
    RetryWithBackoff,
    FallbackToDefault,
    SkipOptionalStep,
    PromptUserRetry,
    EscalateToAdmin,
    GracefulDegradation,
}

impl RecoveryStrategy {
    pub const ALL: [RecoveryStrategy; 6] = [
        RecoveryStrategy::RetryWithBackoff,
        RecoveryStrategy::FallbackToDefault,
        RecoveryStrategy::SkipOptionalStep,
        RecoveryStrategy::PromptUserRetry,
        RecoveryStrategy::EscalateToAdmin,
        RecoveryStrategy::GracefulDegradation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStrategy::RetryWithBackoff => "retry_with_backoff",
            RecoveryStrategy::FallbackToDefault => "fallback_to_default",
            RecoveryStrategy::SkipOptionalStep => "skip_optional_step",
            RecoveryStrategy::PromptUserRetry => "prompt_user_retry",
            RecoveryStrategy::EscalateToAdmin => "escalate_to_admin",
            RecoveryStrategy::GracefulDegradation => "graceful_degradation",
        }
    }
}

impl fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured, user-presentable recovery decision.
///
/// Results are only built through the constructors below, which keep three
/// guarantees:
/// - a successful result has no error message
/// - a result requiring user action has at least one suggestion
/// - a result that used a fallback says what was substituted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryResult {
    success: bool,
    strategy_used: RecoveryStrategy,
    result_data: Option<Value>,
    error_message: Option<String>,
    retry_count: u32,
    fallback_used: bool,
    user_action_required: bool,
    recovery_suggestions: Vec<String>,
}

impl RecoveryResult {
    /// The system will retry the operation; `retry_count` is the attempt
    /// number the retry will carry.
    pub fn retry(retry_count: u32, message: impl Into<String>) -> Self {
        Self {
            success: false,
            strategy_used: RecoveryStrategy::RetryWithBackoff,
            result_data: None,
            error_message: Some(message.into()),
            retry_count,
            fallback_used: false,
            user_action_required: false,
            recovery_suggestions: vec!["The operation will be retried automatically".to_string()],
        }
    }

    /// The user has to correct something and try again.
    pub fn prompt_user(message: impl Into<String>, suggestions: Vec<String>) -> Self {
        let mut suggestions = suggestions;
        if suggestions.is_empty() {
            suggestions.push("Please review your input and try again".to_string());
        }
        Self {
            success: false,
            strategy_used: RecoveryStrategy::PromptUserRetry,
            result_data: None,
            error_message: Some(message.into()),
            retry_count: 0,
            fallback_used: false,
            user_action_required: true,
            recovery_suggestions: suggestions,
        }
    }

    /// A safe default is substituted.
    ///
    /// With `data`, the substitute value is returned and the result counts as
    /// a success, with `explanation` as the first suggestion. Without it, the
    /// explanation becomes the error message.
    pub fn fallback(explanation: impl Into<String>, data: Option<Value>) -> Self {
        Self::substitute(RecoveryStrategy::FallbackToDefault, explanation.into(), data)
    }

    /// Reduced functionality; the same mechanism as [`fallback`](Self::fallback).
    pub fn degraded(explanation: impl Into<String>, data: Option<Value>) -> Self {
        Self::substitute(RecoveryStrategy::GracefulDegradation, explanation.into(), data)
    }

    fn substitute(strategy: RecoveryStrategy, explanation: String, data: Option<Value>) -> Self {
        let success = data.is_some();
        let (error_message, recovery_suggestions) = if success {
            (None, vec![explanation])
        } else {
            (Some(explanation), Vec::new())
        };
        Self {
            success,
            strategy_used: strategy,
            result_data: data,
            error_message,
            retry_count: 0,
            fallback_used: true,
            user_action_required: false,
            recovery_suggestions,
        }
    }

    /// An optional step is skipped and the flow continues without it.
    pub fn skip(explanation: impl Into<String>) -> Self {
        Self {
            success: true,
            strategy_used: RecoveryStrategy::SkipOptionalStep,
            result_data: None,
            error_message: None,
            retry_count: 0,
            fallback_used: false,
            user_action_required: false,
            recovery_suggestions: vec![explanation.into()],
        }
    }

    /// Nothing automatic helps; an administrator has to look at it.
    pub fn escalate(message: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            success: false,
            strategy_used: RecoveryStrategy::EscalateToAdmin,
            result_data: None,
            error_message: Some(message.into()),
            retry_count: 0,
            fallback_used: false,
            user_action_required: false,
            recovery_suggestions: suggestions,
        }
    }

    /// The generic result used for anything unrecognized.
    pub fn generic_escalation() -> Self {
        Self::escalate(
            "We're sorry, something went wrong on our side",
            vec![
                "Please try again later".to_string(),
                "Contact support if the problem persists".to_string(),
            ],
        )
    }

    pub(crate) fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn strategy_used(&self) -> RecoveryStrategy {
        self.strategy_used
    }

    pub fn result_data(&self) -> Option<&Value> {
        self.result_data.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn fallback_used(&self) -> bool {
        self.fallback_used
    }

    pub fn user_action_required(&self) -> bool {
        self.user_action_required
    }

    pub fn recovery_suggestions(&self) -> &[String] {
        &self.recovery_suggestions
    }
}
