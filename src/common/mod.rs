//! Common utilities shared by the engine and the CLI

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{
    ActionFailure, AggregateFailure, BranchFailure, Error, FailureMatcher, Result,
};
