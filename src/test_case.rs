//! Test case orchestration
//!
//! A [`TestCase`] owns a main chain and a finally chain. The finally chain
//! always runs after the main chain, whatever its outcome, and a main-chain
//! failure takes precedence over a finally-chain failure in the report.

use std::fmt;
use std::time::{Duration, Instant, SystemTime};

use serde_json::Value;

use crate::action::{run_sequence_guarded, Action};
use crate::common::{Error, Result};
use crate::context::TestContext;

/// Test case lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

impl TestState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Authoring status of a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestStatus {
    #[default]
    Draft,
    ReadyForReview,
    Disabled,
    Final,
}

/// Descriptive metadata
#[derive(Debug, Clone, Default)]
pub struct MetaInfo {
    pub author: Option<String>,
    pub package: Option<String>,
    pub status: TestStatus,
    pub creation_date: Option<SystemTime>,
}

/// How a test case ended
#[derive(Debug)]
pub enum Outcome {
    Passed,
    MainFailed(Error),
    FinallyFailed(Error),
    BothFailed { main: Error, finally: Error },
}

impl Outcome {
    fn from_chains(main: Option<Error>, finally: Option<Error>) -> Self {
        match (main, finally) {
            (None, None) => Self::Passed,
            (Some(main), None) => Self::MainFailed(main),
            (None, Some(finally)) => Self::FinallyFailed(finally),
            (Some(main), Some(finally)) => Self::BothFailed { main, finally },
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Main-chain failure, if any
    pub fn main_error(&self) -> Option<&Error> {
        match self {
            Self::MainFailed(e) | Self::BothFailed { main: e, .. } => Some(e),
            _ => None,
        }
    }

    /// Finally-chain failure, if any
    pub fn finally_error(&self) -> Option<&Error> {
        match self {
            Self::FinallyFailed(e) | Self::BothFailed { finally: e, .. } => Some(e),
            _ => None,
        }
    }

    /// The failure reported for the test: main chain first
    pub fn error(&self) -> Option<&Error> {
        self.main_error().or_else(|| self.finally_error())
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::MainFailed(e) => write!(f, "main chain failed: {}", e),
            Self::FinallyFailed(e) => write!(f, "finally chain failed: {}", e),
            Self::BothFailed { main, finally } => write!(
                f,
                "main chain failed: {}; finally chain failed: {}",
                main, finally
            ),
        }
    }
}

/// Result of executing one test case
#[derive(Debug)]
pub struct TestReport {
    pub name: String,
    pub state: TestState,
    pub outcome: Outcome,
    pub duration: Duration,
}

impl TestReport {
    pub fn passed(&self) -> bool {
        self.outcome.is_passed()
    }

    pub fn error(&self) -> Option<&Error> {
        self.outcome.error()
    }
}

/// A test: predeclared variables, a main chain and a finally chain
#[derive(Debug)]
pub struct TestCase {
    name: String,
    description: Option<String>,
    meta: MetaInfo,
    variables: Vec<(String, Value)>,
    actions: Vec<Action>,
    finally: Vec<Action>,
    state: TestState,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            meta: MetaInfo::default(),
            variables: Vec::new(),
            actions: Vec::new(),
            finally: Vec::new(),
            state: TestState::NotStarted,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.meta.author = Some(author.into());
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.meta.package = Some(package.into());
        self
    }

    pub fn with_status(mut self, status: TestStatus) -> Self {
        self.meta.status = status;
        self
    }

    pub fn with_creation_date(mut self, date: SystemTime) -> Self {
        self.meta.creation_date = Some(date);
        self
    }

    /// Declare a variable seeded before the main chain runs
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }

    /// Append an action to the main chain
    pub fn with_action(mut self, action: impl Into<Action>) -> Self {
        self.actions.push(action.into());
        self
    }

    /// Append an action to the finally chain
    pub fn with_finally(mut self, action: impl Into<Action>) -> Self {
        self.finally.push(action.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn meta(&self) -> &MetaInfo {
        &self.meta
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn finally_actions(&self) -> &[Action] {
        &self.finally
    }

    pub fn state(&self) -> TestState {
        self.state
    }

    /// Execute the test case against a fresh context
    ///
    /// A test case runs once; executing it again fails with
    /// [`Error::InvalidState`].
    pub async fn execute(&mut self, context: &TestContext) -> Result<TestReport> {
        if self.state != TestState::NotStarted {
            return Err(Error::invalid_state("execute", &self.state.to_string()));
        }

        let started = Instant::now();
        self.state = TestState::Running;
        context.listeners().test_started(&self.name);
        tracing::info!(test = %self.name, "Running test case");

        let main_error = match self.seed(context) {
            Ok(()) => run_sequence_guarded(&self.actions, context).await.err(),
            Err(e) => Some(e),
        };
        if let Some(e) = &main_error {
            tracing::debug!(test = %self.name, error = %e, "Main chain failed");
        }

        if !self.finally.is_empty() {
            tracing::debug!(test = %self.name, "Running finally chain");
        }
        let finally_error = run_sequence_guarded(&self.finally, context).await.err();
        if let Some(e) = &finally_error {
            tracing::warn!(test = %self.name, error = %e, "Finally chain failed");
        }

        let outcome = Outcome::from_chains(main_error, finally_error);
        self.state = if outcome.is_passed() {
            TestState::Succeeded
        } else {
            TestState::Failed
        };

        let report = TestReport {
            name: self.name.clone(),
            state: self.state,
            outcome,
            duration: started.elapsed(),
        };
        context.listeners().test_finished(&report);
        Ok(report)
    }

    fn seed(&self, context: &TestContext) -> Result<()> {
        for (name, value) in &self.variables {
            let value = context.resolve_value(value)?;
            context.set_variable(name.as_str(), value);
        }
        Ok(())
    }
}
