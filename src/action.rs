//! The unit of execution
//!
//! [`Action`] is a closed set of variants: opaque leaves plus the container
//! policies in [`crate::container`]. Leaves implement [`TestAction`]; the
//! engine never looks inside them.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::common::{ActionFailure, Result};
use crate::container::{
    Catch, Conditional, Iterate, Parallel, RepeatOnErrorUntilTrue, RepeatUntilTrue, Sequence,
    Template,
};
use crate::context::TestContext;

/// A leaf action supplied by transport, assertion or utility modules
#[async_trait]
pub trait TestAction: Send + Sync {
    /// Name used in logs and listener notifications
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Run the action against the context
    async fn execute(&self, context: &TestContext) -> Result<()>;
}

/// A node of the action tree
pub enum Action {
    Leaf(Arc<dyn TestAction>),
    Sequence(Sequence),
    Parallel(Parallel),
    Iterate(Iterate),
    RepeatUntilTrue(RepeatUntilTrue),
    RepeatOnErrorUntilTrue(RepeatOnErrorUntilTrue),
    Conditional(Conditional),
    Catch(Catch),
    Template(Template),
}

impl Action {
    /// Wrap a leaf implementation
    pub fn leaf(action: impl TestAction + 'static) -> Self {
        Self::Leaf(Arc::new(action))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Leaf(leaf) => leaf.name(),
            Self::Sequence(c) => c.name(),
            Self::Parallel(c) => c.name(),
            Self::Iterate(c) => c.name(),
            Self::RepeatUntilTrue(c) => c.name(),
            Self::RepeatOnErrorUntilTrue(c) => c.name(),
            Self::Conditional(c) => c.name(),
            Self::Catch(c) => c.name(),
            Self::Template(c) => c.name(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Leaf(leaf) => leaf.description(),
            Self::Sequence(c) => c.description(),
            Self::Parallel(c) => c.description(),
            Self::Iterate(c) => c.description(),
            Self::RepeatUntilTrue(c) => c.description(),
            Self::RepeatOnErrorUntilTrue(c) => c.description(),
            Self::Conditional(c) => c.description(),
            Self::Catch(c) => c.description(),
            Self::Template(c) => c.description(),
        }
    }

    /// Number of direct children (zero for leaves and templates)
    pub fn child_count(&self) -> usize {
        match self {
            Self::Leaf(_) | Self::Template(_) => 0,
            Self::Sequence(c) => c.actions().len(),
            Self::Parallel(c) => c.actions().len(),
            Self::Iterate(c) => c.actions().len(),
            Self::RepeatUntilTrue(c) => c.actions().len(),
            Self::RepeatOnErrorUntilTrue(c) => c.actions().len(),
            Self::Conditional(c) => c.actions().len(),
            Self::Catch(c) => c.actions().len(),
        }
    }

    /// Execute the action, notifying listeners at its boundaries
    pub fn execute<'a>(&'a self, context: &'a TestContext) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let name = self.name();
            context.listeners().action_started(name);

            let result = match self {
                Self::Leaf(leaf) => leaf.execute(context).await,
                Self::Sequence(c) => c.execute(context).await,
                Self::Parallel(c) => c.execute(context).await,
                Self::Iterate(c) => c.execute(context).await,
                Self::RepeatUntilTrue(c) => c.execute(context).await,
                Self::RepeatOnErrorUntilTrue(c) => c.execute(context).await,
                Self::Conditional(c) => c.execute(context).await,
                Self::Catch(c) => c.execute(context).await,
                Self::Template(c) => c.execute(context).await,
            };

            match &result {
                Ok(()) => context.listeners().action_finished(name),
                Err(e) => context.listeners().action_failed(name, e),
            }
            result
        })
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            Self::Leaf(_) => "Leaf",
            Self::Sequence(_) => "Sequence",
            Self::Parallel(_) => "Parallel",
            Self::Iterate(_) => "Iterate",
            Self::RepeatUntilTrue(_) => "RepeatUntilTrue",
            Self::RepeatOnErrorUntilTrue(_) => "RepeatOnErrorUntilTrue",
            Self::Conditional(_) => "Conditional",
            Self::Catch(_) => "Catch",
            Self::Template(_) => "Template",
        };
        f.debug_struct("Action")
            .field("variant", &variant)
            .field("name", &self.name())
            .field("children", &self.child_count())
            .finish()
    }
}

macro_rules! impl_from_container {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Action {
                fn from(container: $variant) -> Self {
                    Self::$variant(container)
                }
            }
        )*
    };
}

impl_from_container!(
    Sequence,
    Parallel,
    Iterate,
    RepeatUntilTrue,
    RepeatOnErrorUntilTrue,
    Conditional,
    Catch,
    Template
);

/// Run actions in order, stopping at the first failure
///
/// Shared by every container whose body is a sequence.
pub(crate) async fn run_sequence(actions: &[Action], context: &TestContext) -> Result<()> {
    for action in actions {
        action.execute(context).await?;
    }
    Ok(())
}

/// Run actions in order, turning a panic into a `Panic` failure
pub(crate) async fn run_sequence_guarded(actions: &[Action], context: &TestContext) -> Result<()> {
    AssertUnwindSafe(run_sequence(actions, context))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(panic_failure(payload).into()))
}

/// Failure reported for an action that panicked
pub(crate) fn panic_failure(payload: Box<dyn Any + Send>) -> ActionFailure {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    ActionFailure::new(ActionFailure::PANIC, format!("action panicked: {}", detail))
}
