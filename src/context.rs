//! Test context - the variable store threaded through an execution
//!
//! A context is a cheap handle onto a shared backing store. Cloning it (or
//! creating a global child) shares the store; an isolated child gets its own
//! copy, seeded from the parent at creation time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::common::{Error, Result};
use crate::listener::Listeners;

/// Variable store for one test run
#[derive(Clone, Default)]
pub struct TestContext {
    /// Backing store; the lock guards the map structure, not logical writes
    variables: Arc<RwLock<HashMap<String, Value>>>,
    /// Named stopwatches, shared by every child of the run
    timers: Arc<Mutex<HashMap<String, Instant>>>,
    listeners: Listeners,
}

impl TestContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context notifying the given listeners
    pub fn with_listeners(listeners: Listeners) -> Self {
        Self {
            variables: Arc::default(),
            timers: Arc::default(),
            listeners,
        }
    }

    /// Listeners notified by actions executing against this context
    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    /// Create a child scope
    ///
    /// With `global` the child shares this context's store, so its writes are
    /// visible here. Otherwise the child owns a snapshot copy and its writes
    /// are discarded with it.
    pub fn child(&self, global: bool) -> Self {
        if global {
            return self.clone();
        }
        Self {
            variables: Arc::new(RwLock::new(self.snapshot())),
            timers: self.timers.clone(),
            listeners: self.listeners.clone(),
        }
    }

    /// Whether two handles share the same backing store
    pub fn shares_store_with(&self, other: &TestContext) -> bool {
        Arc::ptr_eq(&self.variables, &other.variables)
    }

    /// Set a variable, replacing any previous value
    pub fn set_variable(&self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        tracing::trace!(variable = %name, value = %value, "Setting variable");
        self.variables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, value);
    }

    /// Get a variable value if present
    pub fn get(&self, name: &str) -> Option<Value> {
        self.variables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Get a variable value, failing if it is not set
    pub fn get_variable(&self, name: &str) -> Result<Value> {
        self.get(name)
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))
    }

    /// Get a variable rendered as a string
    pub fn get_string(&self, name: &str) -> Result<String> {
        self.get_variable(name).map(|v| render(&v))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Remove a variable, returning its value
    pub fn remove(&self, name: &str) -> Option<Value> {
        self.variables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Copy of every variable currently set
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.variables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Variable names in sorted order
    pub fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .variables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Stopwatch lap for `id`
    ///
    /// The first call for an id starts its stopwatch and returns `None`;
    /// later calls return the time elapsed since that start.
    pub fn stop_time(&self, id: &str) -> Option<Duration> {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        match timers.get(id) {
            Some(started) => Some(started.elapsed()),
            None => {
                timers.insert(id.to_string(), Instant::now());
                None
            }
        }
    }

    /// Replace every `${name}` placeholder with the variable's value
    pub fn resolve(&self, input: &str) -> Result<String> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| Error::placeholder(input, "missing closing '}'"))?;
            let name = after[..end].trim();
            if name.is_empty() {
                return Err(Error::placeholder(input, "empty variable name"));
            }
            out.push_str(&self.get_string(name)?);
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Resolve placeholders inside string values; other values pass through
    pub fn resolve_value(&self, value: &Value) -> Result<Value> {
        match value {
            Value::String(s) => self.resolve(s).map(Value::String),
            other => Ok(other.clone()),
        }
    }
}

impl std::fmt::Debug for TestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestContext")
            .field("variables", &self.variable_names())
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// Render a value the way placeholders expand it
///
/// Strings are inserted without quotes; everything else uses its JSON form.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let ctx = TestContext::new();
        ctx.set_variable("name", "citrus");
        ctx.set_variable("count", 3);

        assert_eq!(ctx.get_variable("name").unwrap(), json!("citrus"));
        assert_eq!(ctx.get_string("count").unwrap(), "3");
        assert!(ctx.contains("name"));
        assert!(matches!(
            ctx.get_variable("missing"),
            Err(Error::UnknownVariable(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_resolve_placeholders() {
        let ctx = TestContext::new();
        ctx.set_variable("user", "alice");
        ctx.set_variable("id", 42);

        assert_eq!(
            ctx.resolve("Hello ${user}, your id is ${ id }!").unwrap(),
            "Hello alice, your id is 42!"
        );
        assert_eq!(ctx.resolve("no placeholders").unwrap(), "no placeholders");
    }

    #[test]
    fn test_resolve_errors() {
        let ctx = TestContext::new();
        assert!(matches!(
            ctx.resolve("${missing}"),
            Err(Error::UnknownVariable(_))
        ));
        assert!(matches!(
            ctx.resolve("broken ${user"),
            Err(Error::Placeholder { .. })
        ));
        assert!(matches!(ctx.resolve("${}"), Err(Error::Placeholder { .. })));
    }

    #[test]
    fn test_global_child_shares_store() {
        let parent = TestContext::new();
        let child = parent.child(true);
        child.set_variable("x", 5);

        assert!(child.shares_store_with(&parent));
        assert_eq!(parent.get("x"), Some(json!(5)));
    }

    #[test]
    fn test_isolated_child_is_seeded_copy() {
        let parent = TestContext::new();
        parent.set_variable("seed", "yes");

        let child = parent.child(false);
        assert_eq!(child.get("seed"), Some(json!("yes")));

        child.set_variable("x", 5);
        child.set_variable("seed", "changed");

        assert!(!child.shares_store_with(&parent));
        assert!(!parent.contains("x"));
        assert_eq!(parent.get("seed"), Some(json!("yes")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_time_shared_with_children() {
        let ctx = TestContext::new();
        assert_eq!(ctx.stop_time("login"), None);

        tokio::time::sleep(Duration::from_millis(40)).await;
        let isolated = ctx.child(false);
        assert!(isolated.stop_time("login").unwrap() >= Duration::from_millis(40));
        assert_eq!(ctx.stop_time("other"), None);
    }

    #[test]
    fn test_variable_names_sorted() {
        let ctx = TestContext::new();
        ctx.set_variable("b", 1);
        ctx.set_variable("a", 2);
        assert_eq!(ctx.variable_names(), vec!["a", "b"]);
        assert_eq!(ctx.remove("a"), Some(json!(2)));
        assert_eq!(ctx.variable_names(), vec!["b"]);
    }
}
