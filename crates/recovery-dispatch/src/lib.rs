//! Recovery strategy dispatch.
//!
//! [`RecoveryDispatcher::handle`] turns a failure, its [`ErrorContext`] and
//! the [`OperationCategory`] it happened in into a [`RecoveryResult`]: a
//! structured decision the presentation layer can show to the user. The
//! dispatcher never fails; if the policy itself breaks, a generic escalation
//! is returned.
//!
//! [`RecoveryDispatcher::boundary`] wraps a unit of work. Failures inside it
//! are classified, logged and recorded in the recovery statistics, then
//! returned as a [`BoundaryError`] carrying both the original error and the
//! decision.
//!
//! # Example
//!
//! ```rust
//! use recovery_core::{ErrorContext, Failure};
//! use recovery_dispatch::{DispatcherConfig, OperationCategory, RecoveryDispatcher, RecoveryStrategy};
//!
//! let dispatcher = RecoveryDispatcher::new(DispatcherConfig::builder().name("survey").build());
//! let context = ErrorContext::new("save_answers", "survey").with_pseudonym_id("p-17");
//!
//! let result = dispatcher.handle(
//!     &Failure::validation("age must be a number"),
//!     &context,
//!     OperationCategory::SurveyIo,
//! );
//!
//! assert_eq!(result.strategy_used(), RecoveryStrategy::PromptUserRetry);
//! assert!(result.user_action_required());
//! ```

mod boundary;
mod category;
mod config;
mod events;
mod policy;
mod result;
mod stats;

pub use boundary::BoundaryError;
pub use category::OperationCategory;
pub use config::{DispatcherConfig, DispatcherConfigBuilder};
pub use events::RecoveryEvent;
pub use policy::DEPENDENCY_KEY;
pub use result::{RecoveryResult, RecoveryStrategy};
pub use stats::{BreakerSummary, RecoveryStats, StrategyHistogram};

#[cfg(feature = "metrics")]
use metrics::counter;
use policy::Policy;
use recovery_core::{ErrorContext, FailureClassification};
use stats::Histogram;
use std::error::Error;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Maps failures to recovery decisions and keeps statistics about them.
#[derive(Debug)]
pub struct RecoveryDispatcher {
    config: DispatcherConfig,
    histogram: Histogram,
}

impl RecoveryDispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            histogram: Histogram::default(),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Decides how to recover from `error`.
    pub fn handle(
        &self,
        error: &(dyn Error + 'static),
        context: &ErrorContext,
        category: OperationCategory,
    ) -> RecoveryResult {
        self.dispatch(error, context, category).0
    }

    /// The shared rules for storage failures: retry on connection or timeout,
    /// ask the user on conflicts and constraint violations, escalate
    /// otherwise.
    pub fn handle_database_error(
        &self,
        error: &(dyn Error + 'static),
        context: &ErrorContext,
    ) -> RecoveryResult {
        let category = OperationCategory::Database;
        self.guarded(category, context, || {
            let classification = self.config.classifier.classify(error);
            let result = Policy::new(&self.config).database(error, context, category, classification);
            (result, classification)
        })
        .0
    }

    /// Retry while `context.retry_count()` is below the configured limit,
    /// then the category's fallback.
    pub fn retry_or_fallback(
        &self,
        context: &ErrorContext,
        category: OperationCategory,
    ) -> RecoveryResult {
        self.guarded(category, context, || {
            let result = Policy::new(&self.config).retry_or_fallback(context, category);
            (result, FailureClassification::Unknown)
        })
        .0
    }

    /// Runs `future` inside an error boundary for `category`.
    pub async fn boundary<T, E, Fut>(
        &self,
        category: OperationCategory,
        context: &ErrorContext,
        future: Fut,
    ) -> Result<T, BoundaryError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        match future.await {
            Ok(value) => Ok(value),
            Err(error) => Err(self.capture(error, context, category)),
        }
    }

    /// Runs `operation` inside an error boundary for `category`.
    pub fn boundary_blocking<T, E, F>(
        &self,
        category: OperationCategory,
        context: &ErrorContext,
        operation: F,
    ) -> Result<T, BoundaryError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: Error + 'static,
    {
        operation().map_err(|error| self.capture(error, context, category))
    }

    fn capture<E: Error + 'static>(
        &self,
        error: E,
        context: &ErrorContext,
        category: OperationCategory,
    ) -> BoundaryError<E> {
        let (recovery, classification) = self.dispatch(&error, context, category);
        BoundaryError::new(error, recovery, classification, category)
    }

    fn dispatch(
        &self,
        error: &(dyn Error + 'static),
        context: &ErrorContext,
        category: OperationCategory,
    ) -> (RecoveryResult, FailureClassification) {
        let (result, classification) = self.guarded(category, context, || {
            let classification = self.config.classifier.classify(error);
            let result = Policy::new(&self.config).decide(error, context, category, classification);
            (result, classification)
        });

        let strategy = result.strategy_used();
        self.histogram.record(category, strategy);
        self.config.counters.record_error(classification);

        self.config.event_listeners.emit(&RecoveryEvent::Decision {
            name: self.config.name.clone(),
            timestamp: Instant::now(),
            category,
            classification,
            strategy,
        });

        #[cfg(feature = "tracing")]
        tracing::warn!(
            dispatcher = %self.config.name,
            operation = context.operation(),
            component = context.component(),
            pseudonym_id = context.pseudonym_id().unwrap_or("-"),
            retry_count = context.retry_count(),
            %category,
            %classification,
            %strategy,
            error = %error,
            "recovering from failure"
        );

        #[cfg(feature = "metrics")]
        counter!(
            "recovery_decisions_total",
            "category" => category.as_str(),
            "strategy" => strategy.as_str()
        )
        .increment(1);

        (result, classification)
    }

    /// Runs one policy evaluation; a panic becomes the generic escalation.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn guarded<F>(
        &self,
        category: OperationCategory,
        context: &ErrorContext,
        decide: F,
    ) -> (RecoveryResult, FailureClassification)
    where
        F: FnOnce() -> (RecoveryResult, FailureClassification),
    {
        match panic::catch_unwind(AssertUnwindSafe(decide)) {
            Ok(decision) => decision,
            Err(_) => {
                self.config.event_listeners.emit(&RecoveryEvent::PolicyFailure {
                    name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    category,
                });

                #[cfg(feature = "tracing")]
                tracing::error!(
                    dispatcher = %self.config.name,
                    operation = context.operation(),
                    %category,
                    "recovery policy panicked; escalating"
                );

                (RecoveryResult::generic_escalation(), FailureClassification::Unknown)
            }
        }
    }

    /// Strategy histogram, breaker summaries from the registry and failure
    /// counts by classification.
    pub fn get_recovery_stats(&self) -> RecoveryStats {
        let circuit_breakers = self
            .config
            .registry
            .all_stats()
            .into_iter()
            .map(|(name, stats)| {
                let summary = BreakerSummary {
                    state: stats.state,
                    failure_count: stats.failure_count,
                    last_failure: stats.last_failure_time,
                };
                (name, summary)
            })
            .collect();

        RecoveryStats {
            recovery_stats: self.histogram.snapshot(),
            circuit_breakers,
            error_counts: self.config.counters.error_counts(),
        }
    }

    /// Clears the strategy histogram and the failure counters. Returns the
    /// number of entries removed.
    pub fn clear_error_stats(&self) -> usize {
        let cleared = self.histogram.clear() + self.config.counters.clear();

        #[cfg(feature = "tracing")]
        tracing::info!(dispatcher = %self.config.name, cleared, "recovery statistics cleared");

        cleared
    }
}

impl Default for RecoveryDispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}
