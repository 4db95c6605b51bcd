//! Execution listeners
//!
//! Listeners are notified at test and action boundaries. Notifications are
//! fire-and-forget: they run synchronously on the executing task and must
//! return quickly.

use std::sync::Arc;

use crate::common::Error;
use crate::test_case::TestReport;

/// Observer of test execution
pub trait TestListener: Send + Sync {
    fn on_test_start(&self, _test: &str) {}

    fn on_test_finish(&self, _report: &TestReport) {}

    fn on_action_start(&self, _action: &str) {}

    fn on_action_finish(&self, _action: &str) {}

    fn on_action_failure(&self, _action: &str, _error: &Error) {}
}

/// Shared set of listeners carried by a test context
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Arc<Vec<Arc<dyn TestListener>>>,
}

impl Listeners {
    pub fn new(listeners: Vec<Arc<dyn TestListener>>) -> Self {
        Self {
            inner: Arc::new(listeners),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub(crate) fn test_started(&self, test: &str) {
        self.inner.iter().for_each(|l| l.on_test_start(test));
    }

    pub(crate) fn test_finished(&self, report: &TestReport) {
        self.inner.iter().for_each(|l| l.on_test_finish(report));
    }

    pub(crate) fn action_started(&self, action: &str) {
        self.inner.iter().for_each(|l| l.on_action_start(action));
    }

    pub(crate) fn action_finished(&self, action: &str) {
        self.inner.iter().for_each(|l| l.on_action_finish(action));
    }

    pub(crate) fn action_failed(&self, action: &str, error: &Error) {
        self.inner
            .iter()
            .for_each(|l| l.on_action_failure(action, error));
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.inner.len())
            .finish()
    }
}

/// Listener that writes every boundary to the tracing log
#[derive(Debug, Default)]
pub struct LoggingListener;

impl TestListener for LoggingListener {
    fn on_test_start(&self, test: &str) {
        tracing::info!(test, "Test started");
    }

    fn on_test_finish(&self, report: &TestReport) {
        tracing::info!(
            test = %report.name,
            state = %report.state,
            duration_ms = report.duration.as_millis() as u64,
            "Test finished"
        );
    }

    fn on_action_start(&self, action: &str) {
        tracing::debug!(action, "Action started");
    }

    fn on_action_finish(&self, action: &str) {
        tracing::debug!(action, "Action finished");
    }

    fn on_action_failure(&self, action: &str, error: &Error) {
        tracing::debug!(action, kind = error.kind(), error = %error, "Action failed");
    }
}
