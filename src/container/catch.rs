use crate::action::{run_sequence, Action};
use crate::common::{FailureMatcher, Result};
use crate::context::TestContext;

use super::container_meta;

/// Runs its body as a sequence and swallows matching failures
///
/// Failures that do not match the matcher propagate unchanged. Condition
/// evaluation failures never match.
#[derive(Debug)]
pub struct Catch {
    name: String,
    description: Option<String>,
    actions: Vec<Action>,
    matcher: FailureMatcher,
}

container_meta!(Catch);

impl Catch {
    /// Catch any failure raised by the body
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            name: "catch".to_string(),
            description: None,
            actions,
            matcher: FailureMatcher::Any,
        }
    }

    /// Catch only failures of the given kind (`*` or `any` for all)
    pub fn for_kind(kind: &str, actions: Vec<Action>) -> Self {
        Self::new(actions).with_matcher(FailureMatcher::parse(kind))
    }

    pub fn with_matcher(mut self, matcher: FailureMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn matcher(&self) -> &FailureMatcher {
        &self.matcher
    }

    pub async fn execute(&self, context: &TestContext) -> Result<()> {
        match run_sequence(&self.actions, context).await {
            Err(e) if self.matcher.matches(&e) => {
                tracing::info!(
                    matcher = %self.matcher,
                    kind = e.kind(),
                    error = %e,
                    "Caught failure"
                );
                Ok(())
            }
            other => other,
        }
    }
}
