//! Container actions
//!
//! Each container is a control-flow policy over an owned list of child
//! actions. Children are owned by value, so an action always has exactly one
//! parent; the tree is assembled bottom-up and never re-parented here.

mod catch;
mod conditional;
mod iterate;
mod parallel;
mod repeat;
mod sequence;
mod template;

use crate::common::{Error, Result};
use crate::condition::Condition;

pub use catch::Catch;
pub use conditional::Conditional;
pub use iterate::Iterate;
pub use parallel::Parallel;
pub use repeat::{RepeatOnErrorUntilTrue, RepeatUntilTrue};
pub use sequence::Sequence;
pub use template::{Template, TemplateDefinition, TemplateRegistry, TemplateResolver};

/// Default first value of a loop index
pub const DEFAULT_INDEX_START: i64 = 1;

/// Default loop index variable name
pub const DEFAULT_INDEX_NAME: &str = "i";

/// Advance a loop index, failing instead of overflowing
pub(crate) fn advance_index(index: i64, step: i64, condition: &Condition) -> Result<i64> {
    index.checked_add(step).ok_or_else(|| {
        Error::condition(
            &condition.to_string(),
            format!("loop index overflowed after {}", index),
        )
    })
}

/// Name and description accessors shared by all containers
macro_rules! container_meta {
    ($container:ident) => {
        impl $container {
            pub fn name(&self) -> &str {
                &self.name
            }

            pub fn description(&self) -> Option<&str> {
                self.description.as_deref()
            }

            pub fn with_name(mut self, name: impl Into<String>) -> Self {
                self.name = name.into();
                self
            }

            pub fn with_description(mut self, description: impl Into<String>) -> Self {
                self.description = Some(description.into());
                self
            }
        }
    };
}

pub(crate) use container_meta;

#[cfg(test)]
pub(crate) mod testkit {
    //! Leaves for exercising containers

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::action::{Action, TestAction};
    use crate::common::{ActionFailure, Result};
    use crate::context::TestContext;

    /// Appends its name to a shared journal
    pub struct Record {
        pub name: String,
        pub journal: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl TestAction for Record {
        fn name(&self) -> &str {
            &self.name
        }

        async fn execute(&self, _context: &TestContext) -> Result<()> {
            self.journal.lock().unwrap().push(self.name.clone());
            Ok(())
        }
    }

    /// Fails with the given kind
    pub struct FailWith(pub &'static str);

    #[async_trait]
    impl TestAction for FailWith {
        fn name(&self) -> &str {
            "fail-with"
        }

        async fn execute(&self, _context: &TestContext) -> Result<()> {
            Err(ActionFailure::new(self.0, "induced failure").into())
        }
    }

    /// Fails on its first `failures` runs, then succeeds
    pub struct Flaky {
        pub failures: usize,
        pub runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TestAction for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn execute(&self, _context: &TestContext) -> Result<()> {
            let run = self.runs.fetch_add(1, Ordering::SeqCst);
            if run < self.failures {
                Err(ActionFailure::new("IO", format!("attempt {} failed", run + 1)).into())
            } else {
                Ok(())
            }
        }
    }

    pub fn journal() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    pub fn record(name: &str, journal: &Arc<Mutex<Vec<String>>>) -> Action {
        Action::leaf(Record {
            name: name.to_string(),
            journal: journal.clone(),
        })
    }

    pub fn entries(journal: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        journal.lock().unwrap().clone()
    }
}
