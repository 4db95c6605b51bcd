use std::time::Duration;

use crate::action::{run_sequence, Action};
use crate::common::Result;
use crate::condition::Condition;
use crate::context::TestContext;

use super::{advance_index, container_meta, DEFAULT_INDEX_NAME, DEFAULT_INDEX_START};

/// Repeats its body until the condition holds, testing after each pass
///
/// The body always runs at least once. A body failure ends the loop and
/// propagates.
#[derive(Debug)]
pub struct RepeatUntilTrue {
    name: String,
    description: Option<String>,
    actions: Vec<Action>,
    condition: Condition,
    index_name: String,
    start: i64,
}

container_meta!(RepeatUntilTrue);

impl RepeatUntilTrue {
    pub fn new(condition: impl Into<Condition>, actions: Vec<Action>) -> Self {
        Self {
            name: "repeat-until-true".to_string(),
            description: None,
            actions,
            condition: condition.into(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            start: DEFAULT_INDEX_START,
        }
    }

    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    pub fn with_start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub async fn execute(&self, context: &TestContext) -> Result<()> {
        let mut index = self.start;

        loop {
            context.set_variable(self.index_name.as_str(), index);
            tracing::debug!(index_name = %self.index_name, index, "Repeat pass");
            run_sequence(&self.actions, context).await?;

            if self.condition.evaluate(context)? {
                return Ok(());
            }
            index = advance_index(index, 1, &self.condition)?;
        }
    }
}

/// Retries its body after failures until a pass succeeds or the condition holds
///
/// This is the only container whose retry is driven by failure: a failed pass
/// is swallowed, the loop sleeps for `auto_sleep` (if set) and runs again with
/// the next index. A successful pass, or a condition that evaluates true after
/// a failed pass, ends the loop successfully.
///
/// There is no attempt cap. A body that never succeeds loops forever unless
/// the condition eventually holds, so bounded retries must be written into the
/// condition, e.g. `i >= 5`. Condition evaluation failures are never
/// swallowed.
#[derive(Debug)]
pub struct RepeatOnErrorUntilTrue {
    name: String,
    description: Option<String>,
    actions: Vec<Action>,
    condition: Condition,
    index_name: String,
    start: i64,
    auto_sleep: Option<Duration>,
}

container_meta!(RepeatOnErrorUntilTrue);

impl RepeatOnErrorUntilTrue {
    pub fn new(condition: impl Into<Condition>, actions: Vec<Action>) -> Self {
        Self {
            name: "repeat-onerror-until-true".to_string(),
            description: None,
            actions,
            condition: condition.into(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            start: DEFAULT_INDEX_START,
            auto_sleep: None,
        }
    }

    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    pub fn with_start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    /// Pause between a failed pass and the next attempt
    pub fn with_auto_sleep(mut self, auto_sleep: Duration) -> Self {
        self.auto_sleep = Some(auto_sleep).filter(|d| !d.is_zero());
        self
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn auto_sleep(&self) -> Option<Duration> {
        self.auto_sleep
    }

    pub async fn execute(&self, context: &TestContext) -> Result<()> {
        let mut index = self.start;

        loop {
            context.set_variable(self.index_name.as_str(), index);

            let error = match run_sequence(&self.actions, context).await {
                Ok(()) => {
                    tracing::debug!(index, "Repeat-on-error pass succeeded");
                    return Ok(());
                }
                Err(e) if e.is_condition() => return Err(e),
                Err(e) => e,
            };

            tracing::warn!(
                index_name = %self.index_name,
                index,
                kind = error.kind(),
                error = %error,
                "Repeat-on-error pass failed"
            );

            if self.condition.evaluate(context)? {
                tracing::debug!(index, "Repeat-on-error condition reached");
                return Ok(());
            }

            if let Some(delay) = self.auto_sleep {
                tracing::debug!(delay_ms = delay.as_millis() as u64, "Sleeping before retry");
                tokio::time::sleep(delay).await;
            }
            index = advance_index(index, 1, &self.condition)?;
        }
    }
}
