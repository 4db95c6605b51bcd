use crate::action::{run_sequence, Action};
use crate::common::Result;
use crate::condition::Condition;
use crate::context::TestContext;

use super::{advance_index, container_meta, DEFAULT_INDEX_NAME, DEFAULT_INDEX_START};

/// Repeats its body while the condition holds, testing before each pass
///
/// The index is written to `index_name` before every condition check, so both
/// the condition and the body can reference it. A condition that is false on
/// entry means zero passes.
#[derive(Debug)]
pub struct Iterate {
    name: String,
    description: Option<String>,
    actions: Vec<Action>,
    condition: Condition,
    index_name: String,
    start: i64,
    step: i64,
}

container_meta!(Iterate);

impl Iterate {
    pub fn new(condition: impl Into<Condition>, actions: Vec<Action>) -> Self {
        Self {
            name: "iterate".to_string(),
            description: None,
            actions,
            condition: condition.into(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            start: DEFAULT_INDEX_START,
            step: 1,
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

    /// Amount added to the index after each pass
    ///
    /// A step of zero keeps the index fixed, so the loop ends only when the
    /// body changes what the condition reads.
    pub fn with_step(mut self, step: i64) -> Self {
        self.step = step;
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
        let mut passes = 0usize;

        loop {
            context.set_variable(self.index_name.as_str(), index);
            if !self.condition.evaluate(context)? {
                break;
            }

            tracing::debug!(index_name = %self.index_name, index, "Iteration pass");
            run_sequence(&self.actions, context).await?;
            passes += 1;
            index = advance_index(index, self.step, &self.condition)?;
        }

        tracing::debug!(passes, "Iteration finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::testkit::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_index_overflow_is_condition_error() {
        let journal = journal();
        let iterate =
            Iterate::new("true", vec![record("body", &journal)]).with_start(i64::MAX - 1);

        let err = iterate.execute(&TestContext::new()).await.unwrap_err();
        assert!(err.is_condition());
        assert!(err.to_string().contains("overflowed"));
        assert_eq!(entries(&journal).len(), 2);
    }

    #[tokio::test]
    async fn test_condition_checked_before_each_pass() {
        let journal = journal();
        let ctx = TestContext::new();
        let iterate = Iterate::new("i < 3", vec![record("body", &journal)]);

        iterate.execute(&ctx).await.unwrap();
        assert_eq!(entries(&journal).len(), 2);
        assert_eq!(ctx.get("i"), Some(json!(3)));
    }

    #[tokio::test]
    async fn test_zero_passes_when_false_on_entry() {
        let journal = journal();
        let iterate = Iterate::new("i > 10", vec![record("body", &journal)]);

        iterate.execute(&TestContext::new()).await.unwrap();
        assert!(entries(&journal).is_empty());
    }

    #[tokio::test]
    async fn test_custom_index_start_and_step() {
        let journal = journal();
        let ctx = TestContext::new();
        let iterate = Iterate::new("n le 10", vec![record("body", &journal)])
            .with_index_name("n")
            .with_start(0)
            .with_step(5);

        iterate.execute(&ctx).await.unwrap();
        assert_eq!(entries(&journal).len(), 3);
        assert_eq!(ctx.get("n"), Some(json!(15)));
    }

    #[tokio::test]
    async fn test_body_failure_stops_loop() {
        let ctx = TestContext::new();
        let iterate = Iterate::new("i < 5", vec![Action::leaf(FailWith("IO"))]);

        let err = iterate.execute(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), "IO");
        assert_eq!(ctx.get("i"), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_bad_condition_is_fatal() {
        let iterate = Iterate::new("i <", Vec::new());
        let err = iterate.execute(&TestContext::new()).await.unwrap_err();
        assert!(err.is_condition());
    }
}
