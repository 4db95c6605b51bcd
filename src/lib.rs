//! actionflow - an execution engine for integration tests
//!
//! Tests are trees of actions: opaque leaves wrapped in control-flow
//! containers (sequences, parallel branches, loops, retries, conditionals,
//! failure catching and reusable templates). All actions of a run share a
//! variable context with `${name}` placeholder resolution.

pub mod action;
pub mod builtin;
pub mod cli;
pub mod commands;
pub mod common;
pub mod condition;
pub mod container;
pub mod context;
pub mod listener;
pub mod runner;
pub mod test_case;

pub use action::{Action, TestAction};
pub use common::{ActionFailure, AggregateFailure, BranchFailure, Error, FailureMatcher, Result};
pub use condition::Condition;
pub use context::TestContext;
pub use listener::{LoggingListener, TestListener};
pub use runner::{RunSummary, Runner};
pub use test_case::{Outcome, TestCase, TestReport, TestState, TestStatus};
