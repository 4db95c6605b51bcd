use crate::action::{run_sequence, Action};
use crate::common::Result;
use crate::condition::Condition;
use crate::context::TestContext;

use super::container_meta;

/// Runs its body once if the condition holds, otherwise does nothing
#[derive(Debug)]
pub struct Conditional {
    name: String,
    description: Option<String>,
    actions: Vec<Action>,
    condition: Condition,
}

container_meta!(Conditional);

impl Conditional {
    pub fn new(condition: impl Into<Condition>, actions: Vec<Action>) -> Self {
        Self {
            name: "conditional".to_string(),
            description: None,
            actions,
            condition: condition.into(),
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub async fn execute(&self, context: &TestContext) -> Result<()> {
        if self.condition.evaluate(context)? {
            run_sequence(&self.actions, context).await
        } else {
            tracing::debug!(condition = %self.condition, "Condition not met, skipping body");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::testkit::*;

    #[tokio::test]
    async fn test_true_condition_runs_body() {
        let journal = journal();
        let ctx = TestContext::new();
        ctx.set_variable("mode", "full");

        let cond = Conditional::new(
            "mode = 'full'",
            vec![record("a", &journal), record("b", &journal)],
        );
        cond.execute(&ctx).await.unwrap();
        assert_eq!(entries(&journal), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_false_condition_is_noop() {
        let journal = journal();
        let ctx = TestContext::new();
        let before = ctx.snapshot();

        let cond = Conditional::new("1 > 2", vec![record("a", &journal)]);
        cond.execute(&ctx).await.unwrap();

        assert!(entries(&journal).is_empty());
        assert_eq!(ctx.snapshot(), before);
    }

    #[tokio::test]
    async fn test_body_failure_propagates() {
        let cond = Conditional::new("true", vec![Action::leaf(FailWith("IO"))]);
        let err = cond.execute(&TestContext::new()).await.unwrap_err();
        assert_eq!(err.kind(), "IO");
    }
}
