use crate::action::{run_sequence, Action};
use crate::common::Result;
use crate::context::TestContext;

use super::container_meta;

/// Runs children in order, stopping at the first failure
#[derive(Debug)]
pub struct Sequence {
    name: String,
    description: Option<String>,
    actions: Vec<Action>,
}

container_meta!(Sequence);

impl Sequence {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            name: "sequential".to_string(),
            description: None,
            actions,
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub async fn execute(&self, context: &TestContext) -> Result<()> {
        run_sequence(&self.actions, context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::testkit::*;

    #[tokio::test]
    async fn test_runs_children_in_order() {
        let journal = journal();
        let seq = Sequence::new(vec![
            record("a", &journal),
            record("b", &journal),
            record("c", &journal),
        ]);

        seq.execute(&TestContext::new()).await.unwrap();
        assert_eq!(entries(&journal), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let journal = journal();
        let seq = Sequence::new(vec![
            record("a", &journal),
            Action::leaf(FailWith("Assertion")),
            record("c", &journal),
        ]);

        let err = seq.execute(&TestContext::new()).await.unwrap_err();
        assert_eq!(err.kind(), "Assertion");
        assert_eq!(entries(&journal), vec!["a"]);
    }

    #[tokio::test]
    async fn test_empty_sequence_succeeds() {
        let seq = Sequence::new(Vec::new()).with_name("nothing");
        assert_eq!(seq.name(), "nothing");
        seq.execute(&TestContext::new()).await.unwrap();
    }
}
