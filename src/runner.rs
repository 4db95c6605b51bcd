//! Test runner
//!
//! Creates a fresh context per test case, seeded with global variables and
//! wired to the registered listeners, then executes test cases in order.

use std::sync::Arc;

use serde_json::Value;

use crate::common::config::Config;
use crate::common::Result;
use crate::context::TestContext;
use crate::listener::{Listeners, TestListener};
use crate::test_case::{TestCase, TestReport};

/// Context factory and sequential test executor
#[derive(Default)]
pub struct Runner {
    listeners: Vec<Arc<dyn TestListener>>,
    variables: Vec<(String, Value)>,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner seeded with the `[variables]` table of the configuration
    pub fn from_config(config: &Config) -> Self {
        let mut runner = Self::new();
        for (name, value) in &config.variables {
            runner = runner.with_variable(name.as_str(), value.clone());
        }
        runner
    }

    pub fn with_listener(mut self, listener: impl TestListener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Global variable copied into every context this runner creates
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }

    /// Create a fresh context for one test case
    pub fn create_context(&self) -> TestContext {
        let context = TestContext::with_listeners(Listeners::new(self.listeners.clone()));
        for (name, value) in &self.variables {
            context.set_variable(name.as_str(), value.clone());
        }
        context
    }

    /// Run a single test case in its own context
    pub async fn run(&self, test: &mut TestCase) -> Result<TestReport> {
        let context = self.create_context();
        test.execute(&context).await
    }

    /// Run test cases one after another
    ///
    /// A failing test does not stop the run. A test case that cannot be
    /// executed at all (already run) aborts with its error.
    pub async fn run_all(&self, tests: Vec<TestCase>) -> Result<RunSummary> {
        let mut reports = Vec::with_capacity(tests.len());
        for mut test in tests {
            reports.push(self.run(&mut test).await?);
        }

        let summary = RunSummary { reports };
        tracing::info!(
            passed = summary.passed(),
            failed = summary.failed(),
            "Run complete"
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("listeners", &self.listeners.len())
            .field("variables", &self.variables)
            .finish()
    }
}

/// Reports of a run, in execution order
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<TestReport>,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::builtin::Fail;
    use serde_json::json;

    #[test]
    fn test_contexts_are_independent() {
        let runner = Runner::new().with_variable("env", "staging");
        let a = runner.create_context();
        let b = runner.create_context();

        a.set_variable("env", "prod");
        assert_eq!(b.get("env"), Some(json!("staging")));
        assert!(!a.shares_store_with(&b));
    }

    #[test]
    fn test_from_config_seeds_variables() {
        let config = Config::parse("[variables]\nbase_url = \"http://localhost\"\n").unwrap();
        let ctx = Runner::from_config(&config).create_context();
        assert_eq!(ctx.get("base_url"), Some(json!("http://localhost")));
    }

    #[tokio::test]
    async fn test_run_all_continues_after_failure() {
        let tests = vec![
            TestCase::new("bad").with_action(Action::leaf(Fail::new("nope"))),
            TestCase::new("good"),
        ];

        let summary = Runner::new().run_all(tests).await.unwrap();
        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.passed(), 1);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.all_passed());
    }
}
