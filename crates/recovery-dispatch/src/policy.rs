//! The rules mapping a classified failure to a recovery decision.
//!
//! Rules are tried in order; the first that applies decides:
//!
//! 1. rate limiting asks the user to wait and retry
//! 2. invalid input asks the user to correct it, with category-specific hints
//! 3. conflicts ask the user to change the conflicting value
//! 4. permission failures are escalated
//! 5. a missing optional resource falls back to the category default
//! 6. storage-backed categories use the database rules
//! 7. dependency-backed categories read the dependency's circuit breaker,
//!    then retry until `max_recovery_retries` and fall back after that
//! 8. anything else is escalated with a generic message

use crate::category::OperationCategory;
use crate::config::DispatcherConfig;
use crate::result::RecoveryResult;
use recovery_circuitbreaker::CircuitState;
use recovery_core::{is_missing_resource, ErrorContext, FailureClassification};
use std::error::Error;

/// Metadata key naming the dependency behind a failed operation.
pub const DEPENDENCY_KEY: &str = "dependency";

pub(crate) struct Policy<'a> {
    config: &'a DispatcherConfig,
}

impl<'a> Policy<'a> {
    pub(crate) fn new(config: &'a DispatcherConfig) -> Self {
        Self { config }
    }

    pub(crate) fn decide(
        &self,
        error: &(dyn Error + 'static),
        context: &ErrorContext,
        category: OperationCategory,
        classification: FailureClassification,
    ) -> RecoveryResult {
        match classification {
            FailureClassification::RateLimit => return rate_limited(),
            FailureClassification::Validation => return invalid_input(category),
            FailureClassification::Conflict => return conflict(category),
            FailureClassification::Permission => return permission_denied(),
            _ => {}
        }

        if is_missing_resource(error) {
            return self.fallback(category, "The requested resource was not found");
        }

        if category.is_storage_backed() {
            return self.database(error, context, category, classification);
        }

        if let Some(default_dependency) = category.default_dependency() {
            let dependency = context
                .metadata_str(DEPENDENCY_KEY)
                .unwrap_or(default_dependency);
            return self.dependency(context, category, classification, dependency);
        }

        RecoveryResult::generic_escalation()
    }

    pub(crate) fn database(
        &self,
        error: &(dyn Error + 'static),
        context: &ErrorContext,
        category: OperationCategory,
        classification: FailureClassification,
    ) -> RecoveryResult {
        match classification {
            FailureClassification::Connection | FailureClassification::Timeout => {
                RecoveryResult::retry(
                    context.retry_count().saturating_add(1),
                    "The database is temporarily unavailable",
                )
            }
            FailureClassification::Conflict => conflict(category),
            _ if error.to_string().to_lowercase().contains("constraint") => conflict(category),
            _ => RecoveryResult::generic_escalation(),
        }
    }

    fn dependency(
        &self,
        context: &ErrorContext,
        category: OperationCategory,
        classification: FailureClassification,
        dependency: &str,
    ) -> RecoveryResult {
        let breaker = self.config.registry.get_or_create(dependency);
        if self.config.record_dependency_failures && breaker.state() == CircuitState::Closed {
            breaker.record_failure();
        }

        if breaker.is_open() {
            return self.fallback(category, "The service is temporarily unavailable");
        }

        if category == OperationCategory::ContentGeneration
            && classification == FailureClassification::Resource
        {
            return RecoveryResult::degraded(
                format!(
                    "The service is running with reduced capacity; {}",
                    category.fallback_description()
                ),
                self.config.fallback_value(category).cloned(),
            );
        }

        self.retry_or_fallback(context, category)
    }

    /// Recommends another attempt while the context's retry count is below
    /// the limit, then the category's final fallback.
    pub(crate) fn retry_or_fallback(
        &self,
        context: &ErrorContext,
        category: OperationCategory,
    ) -> RecoveryResult {
        let retry_count = context.retry_count();
        let max = self.config.max_recovery_retries;

        if retry_count < max {
            let attempt = retry_count.saturating_add(1);
            return RecoveryResult::retry(
                attempt,
                format!("The operation failed temporarily (attempt {attempt} of {max})"),
            );
        }

        let exhausted = "The operation kept failing after several attempts";
        let result = match (category, self.config.fallback_value(category)) {
            (OperationCategory::DataExtraction, None) => {
                RecoveryResult::skip(format!("{exhausted}; continuing without extracted data"))
            }
            _ => self.fallback(category, exhausted),
        };
        result.with_retry_count(retry_count)
    }

    fn fallback(&self, category: OperationCategory, reason: &str) -> RecoveryResult {
        RecoveryResult::fallback(
            format!("{reason}; {}", category.fallback_description()),
            self.config.fallback_value(category).cloned(),
        )
    }
}

fn rate_limited() -> RecoveryResult {
    RecoveryResult::prompt_user(
        "Too many requests right now",
        vec!["Please wait a minute before trying again".to_string()],
    )
}

fn invalid_input(category: OperationCategory) -> RecoveryResult {
    RecoveryResult::prompt_user(
        "Some of the information provided is not valid",
        category.format_suggestions(),
    )
}

fn conflict(category: OperationCategory) -> RecoveryResult {
    RecoveryResult::prompt_user(
        "This conflicts with existing data",
        vec![category.conflict_suggestion().to_string()],
    )
}

fn permission_denied() -> RecoveryResult {
    RecoveryResult::escalate(
        "You do not have permission to perform this action",
        vec!["Contact an administrator to request access".to_string()],
    )
}
