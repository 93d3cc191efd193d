//! Failure classification.
//!
//! A failure is classified exactly once, by running an ordered list of rules:
//! type rules first (downcasting the error and its `source()` chain), then
//! message rules (lowercase substring matches on each error's `Display`
//! output), and finally the `Unknown` fallback.

use crate::error::Failure;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::io;
use std::sync::Arc;

/// The computed tag that drives recovery decisions and statistics buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClassification {
    /// The operation did not complete in time.
    Timeout,
    /// A connection could not be established or was lost.
    Connection,
    /// A resource (memory, disk, quota) is exhausted.
    Resource,
    /// The caller is not allowed to perform the operation.
    Permission,
    /// Input was malformed or failed validation.
    Validation,
    /// A uniqueness constraint or concurrent update conflict.
    Conflict,
    /// A dependency is throttling the caller.
    RateLimit,
    /// Nothing more specific matched.
    Unknown,
}

impl FailureClassification {
    /// Every classification, in declaration order.
    pub const ALL: [FailureClassification; 8] = [
        FailureClassification::Timeout,
        FailureClassification::Connection,
        FailureClassification::Resource,
        FailureClassification::Permission,
        FailureClassification::Validation,
        FailureClassification::Conflict,
        FailureClassification::RateLimit,
        FailureClassification::Unknown,
    ];

    /// Stable snake_case name, used for metric labels and serialized maps.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClassification::Timeout => "timeout",
            FailureClassification::Connection => "connection",
            FailureClassification::Resource => "resource",
            FailureClassification::Permission => "permission",
            FailureClassification::Validation => "validation",
            FailureClassification::Conflict => "conflict",
            FailureClassification::RateLimit => "rate_limit",
            FailureClassification::Unknown => "unknown",
        }
    }

    /// Returns true for connection and timeout failures.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FailureClassification::Timeout | FailureClassification::Connection
        )
    }
}

impl fmt::Display for FailureClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type TypeRule = Arc<dyn Fn(&(dyn Error + 'static)) -> Option<FailureClassification> + Send + Sync>;

/// Ordered rule list mapping errors to a [`FailureClassification`].
///
/// Rules added through [`with_type_rule`](Self::with_type_rule) and
/// [`with_message_rule`](Self::with_message_rule) run before the built-in
/// rules of the same kind, in the order they were added.
///
/// # Example
///
/// ```rust
/// use recovery_core::{FailureClassification, FailureClassifier};
///
/// #[derive(Debug)]
/// struct QuotaExceeded;
///
/// impl std::fmt::Display for QuotaExceeded {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "monthly budget used up")
///     }
/// }
///
/// impl std::error::Error for QuotaExceeded {}
///
/// let classifier = FailureClassifier::new().with_type_rule(|err| {
///     err.downcast_ref::<QuotaExceeded>()
///         .map(|_| FailureClassification::RateLimit)
/// });
///
/// assert_eq!(classifier.classify(&QuotaExceeded), FailureClassification::RateLimit);
/// ```
#[derive(Clone)]
pub struct FailureClassifier {
    type_rules: Vec<TypeRule>,
    custom_type_rules: usize,
    message_rules: Vec<(String, FailureClassification)>,
    custom_message_rules: usize,
}

impl FailureClassifier {
    /// Creates a classifier with the built-in rules.
    pub fn new() -> Self {
        let type_rules: Vec<TypeRule> = vec![
            Arc::new(|err| err.downcast_ref::<Failure>().and_then(Failure::classification)),
            Arc::new(|err| err.downcast_ref::<io::Error>().and_then(classify_io_kind)),
            Arc::new(|err| {
                err.downcast_ref::<tokio::time::error::Elapsed>()
                    .map(|_| FailureClassification::Timeout)
            }),
        ];

        let message_rules = DEFAULT_MESSAGE_RULES
            .iter()
            .map(|(pattern, class)| (pattern.to_string(), *class))
            .collect();

        Self {
            type_rules,
            custom_type_rules: 0,
            message_rules,
            custom_message_rules: 0,
        }
    }

    /// Creates a classifier without any rules; everything is `Unknown` until
    /// rules are added.
    pub fn empty() -> Self {
        Self {
            type_rules: Vec::new(),
            custom_type_rules: 0,
            message_rules: Vec::new(),
            custom_message_rules: 0,
        }
    }

    /// Adds a rule that inspects the error value itself, typically by
    /// downcasting. Returning `None` defers to the next rule.
    pub fn with_type_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&(dyn Error + 'static)) -> Option<FailureClassification> + Send + Sync + 'static,
    {
        self.type_rules.insert(self.custom_type_rules, Arc::new(rule));
        self.custom_type_rules += 1;
        self
    }

    /// Adds a case-insensitive substring rule on the error message.
    pub fn with_message_rule(
        mut self,
        pattern: impl Into<String>,
        classification: FailureClassification,
    ) -> Self {
        let pattern = pattern.into().to_lowercase();
        self.message_rules
            .insert(self.custom_message_rules, (pattern, classification));
        self.custom_message_rules += 1;
        self
    }

    /// Classifies an error.
    ///
    /// Type rules are tried against the error and every error in its source
    /// chain before any message rule runs.
    pub fn classify(&self, error: &(dyn Error + 'static)) -> FailureClassification {
        for err in chain(error) {
            for rule in &self.type_rules {
                if let Some(class) = rule(err) {
                    return class;
                }
            }
        }

        for err in chain(error) {
            let message = err.to_string().to_lowercase();
            if let Some((_, class)) = self
                .message_rules
                .iter()
                .find(|(pattern, _)| message.contains(pattern.as_str()))
            {
                return *class;
            }
        }

        FailureClassification::Unknown
    }
}

impl Default for FailureClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FailureClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureClassifier")
            .field("type_rules", &self.type_rules.len())
            .field("message_rules", &self.message_rules)
            .finish()
    }
}

/// Returns true when the failure means an optional resource is absent, such
/// as a configuration file that was never written.
pub fn is_missing_resource(error: &(dyn Error + 'static)) -> bool {
    chain(error).any(|err| {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::NotFound {
                return true;
            }
        }
        let message = err.to_string().to_lowercase();
        message.contains("not found") || message.contains("no such file")
    })
}

// Order matters: rate limiting messages often also mention a timeout or
// connection, and the more specific rule has to win.
const DEFAULT_MESSAGE_RULES: &[(&str, FailureClassification)] = &[
    ("rate limit", FailureClassification::RateLimit),
    ("too many requests", FailureClassification::RateLimit),
    ("timed out", FailureClassification::Timeout),
    ("timeout", FailureClassification::Timeout),
    ("connection", FailureClassification::Connection),
    ("connect", FailureClassification::Connection),
    ("unreachable", FailureClassification::Connection),
    ("broken pipe", FailureClassification::Connection),
    ("permission", FailureClassification::Permission),
    ("forbidden", FailureClassification::Permission),
    ("unauthorized", FailureClassification::Permission),
    ("access denied", FailureClassification::Permission),
    ("duplicate", FailureClassification::Conflict),
    ("already exists", FailureClassification::Conflict),
    ("unique", FailureClassification::Conflict),
    ("conflict", FailureClassification::Conflict),
    ("invalid", FailureClassification::Validation),
    ("validation", FailureClassification::Validation),
    ("malformed", FailureClassification::Validation),
    ("format", FailureClassification::Validation),
    ("out of memory", FailureClassification::Resource),
    ("disk full", FailureClassification::Resource),
    ("quota", FailureClassification::Resource),
    ("exhausted", FailureClassification::Resource),
    ("resource", FailureClassification::Resource),
];

fn classify_io_kind(err: &io::Error) -> Option<FailureClassification> {
    use io::ErrorKind::*;
    match err.kind() {
        TimedOut => Some(FailureClassification::Timeout),
        ConnectionRefused | ConnectionReset | ConnectionAborted | NotConnected | BrokenPipe
        | AddrNotAvailable => Some(FailureClassification::Connection),
        PermissionDenied => Some(FailureClassification::Permission),
        AlreadyExists => Some(FailureClassification::Conflict),
        InvalidInput | InvalidData => Some(FailureClassification::Validation),
        OutOfMemory => Some(FailureClassification::Resource),
        _ => None,
    }
}

fn chain<'a>(error: &'a (dyn Error + 'static)) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(error), |&err| err.source())
}
