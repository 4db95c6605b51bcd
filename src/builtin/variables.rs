use async_trait::async_trait;
use serde_json::Value;

use crate::action::TestAction;
use crate::common::Result;
use crate::context::{render, TestContext};

/// Sets variables during a test
///
/// String values may reference variables set earlier, including ones set by
/// this same action.
#[derive(Debug, Clone, Default)]
pub struct CreateVariables {
    variables: Vec<(String, Value)>,
}

impl CreateVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }
}

#[async_trait]
impl TestAction for CreateVariables {
    fn name(&self) -> &str {
        "create-variables"
    }

    async fn execute(&self, context: &TestContext) -> Result<()> {
        for (name, value) in &self.variables {
            let value = context.resolve_value(value)?;
            tracing::info!(variable = %name, value = %value, "Setting variable");
            context.set_variable(name.as_str(), value);
        }
        Ok(())
    }
}

/// Logs variable values
///
/// Without explicit names every variable is logged, sorted by name.
#[derive(Debug, Clone, Default)]
pub struct TraceVariables {
    names: Option<Vec<String>>,
}

impl TraceVariables {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Some(names.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl TestAction for TraceVariables {
    fn name(&self) -> &str {
        "trace-variables"
    }

    async fn execute(&self, context: &TestContext) -> Result<()> {
        let names = match &self.names {
            Some(names) => names.clone(),
            None => context.variable_names(),
        };

        for name in names {
            let value = context.get_variable(&name)?;
            tracing::info!("Variable {} = {}", name, render(&value));
        }
        Ok(())
    }
}
