use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::task::{self, JoinSet};

use crate::action::{panic_failure, Action};
use crate::common::{AggregateFailure, BranchFailure, Error, Result};
use crate::context::TestContext;

use super::container_meta;

/// Branch index and its result
type BranchResult = (usize, Result<()>);

/// Runs every child concurrently and waits for all of them
///
/// Each child is spawned as its own task on the runtime's worker pool and
/// runs against the parent's shared store. A failing branch never cancels its
/// siblings; all failures are collected into one [`AggregateFailure`].
#[derive(Debug)]
pub struct Parallel {
    name: String,
    description: Option<String>,
    actions: Vec<Arc<Action>>,
}

container_meta!(Parallel);

impl Parallel {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            name: "parallel".to_string(),
            description: None,
            actions: actions.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn actions(&self) -> &[Arc<Action>] {
        &self.actions
    }

    pub async fn execute(&self, context: &TestContext) -> Result<()> {
        let mut tasks = JoinSet::new();
        let mut ids = HashMap::with_capacity(self.actions.len());

        for (index, action) in self.actions.iter().enumerate() {
            let action = Arc::clone(action);
            let context = context.child(true);
            let handle = tasks.spawn(async move {
                let result = AssertUnwindSafe(action.execute(&context))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| Err(panic_failure(payload).into()));
                (index, result)
            });
            ids.insert(handle.id(), index);
        }

        tracing::debug!(branches = self.actions.len(), "Parallel branches started");

        let mut failures = join_branches(&mut tasks, &ids).await;
        if failures.is_empty() {
            return Ok(());
        }

        failures.sort_by_key(|(index, _)| *index);
        let failures: Vec<BranchFailure> = failures
            .into_iter()
            .map(|(index, error)| BranchFailure {
                index,
                action: self
                    .actions
                    .get(index)
                    .map_or("unknown", |a| a.name())
                    .to_string(),
                error,
            })
            .collect();

        tracing::debug!(
            failed = failures.len(),
            total = self.actions.len(),
            "Parallel branches failed"
        );

        Err(Error::Aggregate(AggregateFailure {
            total: self.actions.len(),
            failures,
        }))
    }
}

/// Wait for every branch, collecting failures
///
/// A branch whose task was lost (cancelled or panicked outside the catch) is
/// recorded as an internal failure; the remaining branches are still awaited.
async fn join_branches(
    tasks: &mut JoinSet<BranchResult>,
    ids: &HashMap<task::Id, usize>,
) -> Vec<(usize, Error)> {
    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((index, Err(error))) => failures.push((index, error)),
            Err(e) => {
                let index = ids.get(&e.id()).copied().unwrap_or(usize::MAX);
                tracing::warn!(index, error = %e, "Parallel branch lost");
                failures.push((index, Error::Internal(format!("parallel branch lost: {}", e))));
            }
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::testkit::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use crate::action::TestAction;
    use crate::common::ActionFailure;

    struct Panics;

    #[async_trait]
    impl TestAction for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        async fn execute(&self, _context: &TestContext) -> Result<()> {
            panic!("branch exploded");
        }
    }

    struct SlowSet(&'static str, u64);

    #[async_trait]
    impl TestAction for SlowSet {
        fn name(&self) -> &str {
            self.0
        }

        async fn execute(&self, context: &TestContext) -> Result<()> {
            tokio::time::sleep(Duration::from_millis(self.1)).await;
            context.set_variable(self.0, true);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_all_branches_succeed() {
        let journal = journal();
        let par = Parallel::new(vec![
            record("a", &journal),
            record("b", &journal),
            record("c", &journal),
        ]);

        par.execute(&TestContext::new()).await.unwrap();
        let mut seen = entries(&journal);
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_collects_every_failure_without_cancelling() {
        let ctx = TestContext::new();
        let par = Parallel::new(vec![
            Action::leaf(FailWith("IO")),
            Action::leaf(SlowSet("slow", 50)),
            Action::leaf(FailWith("Assertion")),
        ]);

        let err = par.execute(&ctx).await.unwrap_err();
        let Error::Aggregate(aggregate) = err else {
            panic!("expected aggregate failure");
        };

        assert_eq!(aggregate.len(), 2);
        assert_eq!(aggregate.total, 3);
        let indexes: Vec<usize> = aggregate.iter().map(|b| b.index).collect();
        assert_eq!(indexes, vec![0, 2]);
        assert_eq!(aggregate.failures[1].error.kind(), "Assertion");

        // The slow sibling still ran to completion
        assert_eq!(ctx.get("slow"), Some(serde_json::json!(true)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_branch_is_reported() {
        let par = Parallel::new(vec![Action::leaf(Panics), Action::leaf(SlowSet("ok", 1))]);

        let err = par.execute(&TestContext::new()).await.unwrap_err();
        let Error::Aggregate(aggregate) = err else {
            panic!("expected aggregate failure");
        };
        assert_eq!(aggregate.len(), 1);
        assert_eq!(aggregate.failures[0].error.kind(), ActionFailure::PANIC);
        assert_eq!(aggregate.failures[0].action, "panics");
        assert!(aggregate.failures[0]
            .error
            .to_string()
            .contains("branch exploded"));
    }

    #[tokio::test]
    async fn test_lost_branch_does_not_stop_the_join() {
        let ctx = TestContext::new();
        let mut tasks: JoinSet<BranchResult> = JoinSet::new();
        let mut ids = HashMap::new();

        let lost = tasks.spawn(async {
            std::future::pending::<()>().await;
            (0, Ok(()))
        });
        ids.insert(lost.id(), 0);
        let slow_ctx = ctx.clone();
        let slow = tasks.spawn(async move {
            let result = SlowSet("slow", 20).execute(&slow_ctx).await;
            (1, result)
        });
        ids.insert(slow.id(), 1);
        lost.abort();

        let failures = join_branches(&mut tasks, &ids).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, 0);
        assert_eq!(failures[0].1.kind(), "Internal");
        assert_eq!(ctx.get("slow"), Some(serde_json::json!(true)));
    }

    #[tokio::test]
    async fn test_branches_share_parent_store() {
        let ctx = TestContext::new();
        let par = Parallel::new(vec![
            Action::leaf(SlowSet("left", 5)),
            Action::leaf(SlowSet("right", 1)),
        ]);

        par.execute(&ctx).await.unwrap();
        assert!(ctx.contains("left"));
        assert!(ctx.contains("right"));
    }
}
