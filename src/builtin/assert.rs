use async_trait::async_trait;

use crate::action::{Action, TestAction};
use crate::common::{ActionFailure, Result};
use crate::context::TestContext;

/// Expects a nested action to fail
///
/// Succeeds only when the nested action fails, and, if configured, with the
/// expected kind and message. Condition evaluation failures propagate
/// unchanged.
#[derive(Debug)]
pub struct AssertFailure {
    action: Box<Action>,
    kind: Option<String>,
    message: Option<String>,
}

impl AssertFailure {
    pub fn new(action: impl Into<Action>) -> Self {
        Self {
            action: Box::new(action.into()),
            kind: None,
            message: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Expected failure message; placeholders are resolved before comparing
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[async_trait]
impl TestAction for AssertFailure {
    fn name(&self) -> &str {
        "assert"
    }

    async fn execute(&self, context: &TestContext) -> Result<()> {
        let error = match self.action.execute(context).await {
            Ok(()) => {
                return Err(ActionFailure::new(
                    ActionFailure::ASSERTION,
                    format!("Missing failure in action '{}'", self.action.name()),
                )
                .into())
            }
            Err(e) if e.is_condition() => return Err(e),
            Err(e) => e,
        };

        if let Some(kind) = &self.kind {
            if error.kind() != kind {
                return Err(ActionFailure::new(
                    ActionFailure::ASSERTION,
                    format!("Expected failure of kind '{}', got '{}'", kind, error.kind()),
                )
                .with_cause(error)
                .into());
            }
        }

        if let Some(expected) = &self.message {
            let expected = context.resolve(expected)?;
            let actual = match &error {
                crate::common::Error::Action(failure) => failure.message.clone(),
                other => other.to_string(),
            };
            if actual != expected {
                return Err(ActionFailure::new(
                    ActionFailure::ASSERTION,
                    format!("Expected failure message '{}', got '{}'", expected, actual),
                )
                .with_cause(error)
                .into());
            }
        }

        tracing::info!(kind = error.kind(), "Asserted failure occurred");
        Ok(())
    }
}

impl From<AssertFailure> for Action {
    fn from(assert: AssertFailure) -> Self {
        Action::leaf(assert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{Echo, Fail};

    #[tokio::test]
    async fn test_expected_failure_passes() {
        let assert = AssertFailure::new(Action::leaf(Fail::new("boom")))
            .with_kind("Fail")
            .with_message("boom");
        assert.execute(&TestContext::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_failure() {
        let assert = AssertFailure::new(Action::leaf(Echo::new("fine")));
        let err = assert.execute(&TestContext::new()).await.unwrap_err();
        assert_eq!(err.kind(), ActionFailure::ASSERTION);
        assert!(err.to_string().contains("Missing failure in action 'echo'"));
    }

    #[tokio::test]
    async fn test_wrong_kind() {
        let assert =
            AssertFailure::new(Action::leaf(Fail::new("boom").with_kind("IO"))).with_kind("Fail");
        let err = assert.execute(&TestContext::new()).await.unwrap_err();
        assert_eq!(err.kind(), ActionFailure::ASSERTION);
    }

    #[tokio::test]
    async fn test_message_resolved_before_compare() {
        let ctx = TestContext::new();
        ctx.set_variable("id", 7);
        let assert = AssertFailure::new(Action::leaf(Fail::new("order 7 rejected")))
            .with_message("order ${id} rejected");
        assert.execute(&ctx).await.unwrap();
    }
}
