use async_trait::async_trait;

use crate::action::TestAction;
use crate::common::Result;
use crate::context::TestContext;

/// Logs a message with placeholders resolved
#[derive(Debug, Clone)]
pub struct Echo {
    message: String,
}

impl Echo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl TestAction for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    async fn execute(&self, context: &TestContext) -> Result<()> {
        let message = context.resolve(&self.message)?;
        tracing::info!("{}", message);
        Ok(())
    }
}
