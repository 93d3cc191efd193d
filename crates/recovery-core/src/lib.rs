//! Shared failure vocabulary for the recovery crates.
//!
//! Every other crate in the workspace builds on the types defined here:
//! - [`FailureClassification`] and the pluggable [`FailureClassifier`] that
//!   computes it once per failure
//! - [`ErrorContext`], the immutable input to every recovery decision
//! - [`FailureCounters`], the shared sink that retry, circuit breaking,
//!   dispatch and batching report into and that health monitoring reads from
//! - the event system used for observability hooks
//! - [`Failure`], a self-classifying error type for domain code
//!
//! # Example
//!
//! ```rust
//! use recovery_core::{Failure, FailureClassification, FailureClassifier};
//!
//! let classifier = FailureClassifier::new();
//!
//! let err = Failure::timeout("database did not answer");
//! assert_eq!(classifier.classify(&err), FailureClassification::Timeout);
//!
//! let err = std::io::Error::other("429 Too Many Requests: rate limit hit");
//! assert_eq!(classifier.classify(&err), FailureClassification::RateLimit);
//! ```

pub mod classify;
pub mod context;
pub mod counters;
pub mod error;
pub mod events;

pub use classify::{is_missing_resource, FailureClassification, FailureClassifier};
pub use context::{ErrorContext, RETRY_COUNT_KEY};
pub use counters::{CounterSnapshot, FailureCounters};
pub use error::Failure;
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
