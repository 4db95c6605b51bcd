use async_trait::async_trait;

use crate::action::TestAction;
use crate::common::{ActionFailure, Result};
use crate::context::TestContext;

/// Fails the test with a message
#[derive(Debug, Clone)]
pub struct Fail {
    message: String,
    kind: String,
}

impl Fail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ActionFailure::FAIL.to_string(),
        }
    }

    /// Raise a failure of a different kind
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }
}

#[async_trait]
impl TestAction for Fail {
    fn name(&self) -> &str {
        "fail"
    }

    async fn execute(&self, context: &TestContext) -> Result<()> {
        let message = context.resolve(&self.message)?;
        Err(ActionFailure::new(self.kind.clone(), message).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fail_raises_resolved_message() {
        let ctx = TestContext::new();
        ctx.set_variable("code", 503);

        let err = Fail::new("service returned ${code}")
            .execute(&ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "Fail");
        assert_eq!(err.to_string(), "Fail: service returned 503");
    }

    #[tokio::test]
    async fn test_fail_with_custom_kind() {
        let err = Fail::new("disk gone")
            .with_kind("IO")
            .execute(&TestContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "IO");
    }
}
