//! Error types for the execution engine
//!
//! Every failure an action can raise is an [`Error`]. Each variant carries a
//! kind tag (see [`Error::kind`]) that the `Catch` container matches against.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum Error {
    // === Execution Errors ===
    #[error(transparent)]
    Action(#[from] ActionFailure),

    #[error("Failed to evaluate condition '{expression}': {reason}")]
    Condition { expression: String, reason: String },

    #[error(transparent)]
    Aggregate(#[from] AggregateFailure),

    // === Context Errors ===
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("Invalid variable expression in '{input}': {reason}")]
    Placeholder { input: String, reason: String },

    // === Assembly Errors ===
    #[error("Template '{0}' not found")]
    TemplateNotFound(String),

    #[error("Cannot {action} while test case is {state}")]
    InvalidState { action: String, state: String },

    #[error("Unknown demo '{0}'. Use --list to see available demos.")]
    UnknownDemo(String),

    #[error("{failed} of {total} test cases failed")]
    RunFailed { failed: usize, total: usize },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Kind tag used for failure matching and reporting
    pub fn kind(&self) -> &str {
        match self {
            Error::Action(failure) => &failure.kind,
            Error::Condition { .. } => "Condition",
            Error::Aggregate(_) => "Aggregate",
            Error::UnknownVariable(_) => "UnknownVariable",
            Error::Placeholder { .. } => "Placeholder",
            Error::TemplateNotFound(_) => "TemplateNotFound",
            Error::InvalidState { .. } => "InvalidState",
            Error::UnknownDemo(_) => "UnknownDemo",
            Error::RunFailed { .. } => "RunFailed",
            Error::Config(_) | Error::ConfigParse(_) => "Config",
            Error::Io(_) | Error::FileRead { .. } => "IO",
            Error::Internal(_) => "Internal",
        }
    }

    /// Whether this is a condition evaluation failure
    pub fn is_condition(&self) -> bool {
        matches!(self, Error::Condition { .. })
    }

    /// Create a condition evaluation error
    pub fn condition(expression: &str, reason: impl Into<String>) -> Self {
        Self::Condition {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an invalid placeholder error
    pub fn placeholder(input: &str, reason: &str) -> Self {
        Self::Placeholder {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(action: &str, state: &str) -> Self {
        Self::InvalidState {
            action: action.to_string(),
            state: state.to_string(),
        }
    }
}

/// A leaf or container could not complete its contract
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct ActionFailure {
    /// Kind tag, e.g. "Assertion" or "IO"
    pub kind: String,
    pub message: String,
    #[source]
    pub cause: Option<Box<Error>>,
}

impl ActionFailure {
    /// Kind raised by the `Fail` action
    pub const FAIL: &'static str = "Fail";
    /// Kind raised when an expectation does not hold
    pub const ASSERTION: &'static str = "Assertion";
    /// Kind raised when a parallel branch panics
    pub const PANIC: &'static str = "Panic";

    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying error
    pub fn with_cause(mut self, cause: Error) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

/// One failed branch of a parallel container
#[derive(Debug)]
pub struct BranchFailure {
    /// Position of the branch among the container's children
    pub index: usize,
    /// Name of the branch's action
    pub action: String,
    pub error: Error,
}

/// Every failure raised by the branches of one parallel container
#[derive(Error, Debug)]
#[error("{count} of {total} parallel branches failed", count = .failures.len())]
pub struct AggregateFailure {
    /// Number of branches the container ran
    pub total: usize,
    /// Failed branches, in child order
    pub failures: Vec<BranchFailure>,
}

impl AggregateFailure {
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BranchFailure> {
        self.failures.iter()
    }
}

/// Selects which failures a `Catch` container swallows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FailureMatcher {
    /// Any failure except condition evaluation failures
    #[default]
    Any,
    /// Failures whose kind tag equals the given name
    Kind(String),
}

impl FailureMatcher {
    /// Parse a matcher; `*` and `any` select every catchable failure
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "*" | "any" | "Any" => Self::Any,
            kind => Self::Kind(kind.to_string()),
        }
    }

    /// Whether the matcher selects this error
    ///
    /// Condition failures never match. An aggregate matches only when every
    /// branch failure matches.
    pub fn matches(&self, error: &Error) -> bool {
        match error {
            Error::Condition { .. } => false,
            Error::Aggregate(aggregate) => {
                !aggregate.is_empty() && aggregate.iter().all(|b| self.matches(&b.error))
            }
            _ => match self {
                Self::Any => true,
                Self::Kind(kind) => error.kind() == kind,
            },
        }
    }
}

impl std::fmt::Display for FailureMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Kind(kind) => write!(f, "{}", kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(index: usize, error: Error) -> BranchFailure {
        BranchFailure {
            index,
            action: format!("branch-{}", index),
            error,
        }
    }

    #[test]
    fn test_kind_of_action_failure() {
        let err: Error = ActionFailure::new("Assertion", "values differ").into();
        assert_eq!(err.kind(), "Assertion");
        assert_eq!(err.to_string(), "Assertion: values differ");
    }

    #[test]
    fn test_matcher_by_kind() {
        let matcher = FailureMatcher::parse("Assertion");
        assert!(matcher.matches(&ActionFailure::new("Assertion", "x").into()));
        assert!(!matcher.matches(&ActionFailure::new("IO", "x").into()));
    }

    #[test]
    fn test_matcher_never_matches_condition() {
        let err = Error::condition("i lt", "unexpected end of expression");
        assert!(!FailureMatcher::Any.matches(&err));
        assert!(!FailureMatcher::parse("Condition").matches(&err));
    }

    #[test]
    fn test_matcher_on_aggregate() {
        let aggregate = |errors: Vec<Error>| -> Error {
            AggregateFailure {
                total: 3,
                failures: errors
                    .into_iter()
                    .enumerate()
                    .map(|(i, e)| branch(i, e))
                    .collect(),
            }
            .into()
        };

        let matcher = FailureMatcher::parse("IO");
        let all_io = aggregate(vec![
            ActionFailure::new("IO", "a").into(),
            ActionFailure::new("IO", "b").into(),
        ]);
        assert!(matcher.matches(&all_io));

        let mixed = aggregate(vec![
            ActionFailure::new("IO", "a").into(),
            Error::condition("x", "bad"),
        ]);
        assert!(!matcher.matches(&mixed));
        assert!(!FailureMatcher::Any.matches(&mixed));
    }

    #[test]
    fn test_aggregate_message_counts_branches() {
        let err = AggregateFailure {
            total: 4,
            failures: vec![branch(1, ActionFailure::new("Fail", "boom").into())],
        };
        assert_eq!(err.to_string(), "1 of 4 parallel branches failed");
    }

    #[test]
    fn test_parse_any_matcher() {
        assert_eq!(FailureMatcher::parse("*"), FailureMatcher::Any);
        assert_eq!(FailureMatcher::parse(" any "), FailureMatcher::Any);
    }
}
