use async_trait::async_trait;

use crate::action::TestAction;
use crate::common::Result;
use crate::context::TestContext;

/// Stopwatch id used when none is given
pub const DEFAULT_TIMER_ID: &str = "total";

/// Measures time between points of a test
///
/// The first `StopTime` for an id starts its stopwatch. Every later one logs
/// the elapsed time and stores it in milliseconds as `<id>_elapsed_ms`.
#[derive(Debug, Clone)]
pub struct StopTime {
    id: String,
}

impl StopTime {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Default for StopTime {
    fn default() -> Self {
        Self::new(DEFAULT_TIMER_ID)
    }
}

#[async_trait]
impl TestAction for StopTime {
    fn name(&self) -> &str {
        "stop-time"
    }

    async fn execute(&self, context: &TestContext) -> Result<()> {
        let id = context.resolve(&self.id)?;
        match context.stop_time(&id) {
            None => tracing::info!(timer = %id, "Starting stopwatch"),
            Some(elapsed) => {
                let elapsed_ms = elapsed.as_millis() as u64;
                tracing::info!(timer = %id, elapsed_ms, "Stopwatch lap");
                context.set_variable(format!("{}_elapsed_ms", id), elapsed_ms);
            }
        }
        Ok(())
    }
}
