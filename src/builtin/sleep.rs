use std::time::Duration;

use async_trait::async_trait;

use crate::action::TestAction;
use crate::common::Result;
use crate::context::TestContext;

/// Default delay when none is given
const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// Suspends the executing task for a fixed delay
#[derive(Debug, Clone)]
pub struct Sleep {
    delay: Duration,
}

impl Sleep {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for Sleep {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

#[async_trait]
impl TestAction for Sleep {
    fn name(&self) -> &str {
        "sleep"
    }

    async fn execute(&self, _context: &TestContext) -> Result<()> {
        tracing::info!(delay_ms = self.delay.as_millis() as u64, "Sleeping");
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
