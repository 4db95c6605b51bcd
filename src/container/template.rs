use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::action::{run_sequence, Action};
use crate::common::{Error, Result};
use crate::context::TestContext;

/// A named, reusable fragment of actions
#[derive(Debug)]
pub struct TemplateDefinition {
    name: String,
    actions: Vec<Action>,
    /// Default parameters, overridden per invocation
    parameters: Vec<(String, Value)>,
    global_context: bool,
}

impl TemplateDefinition {
    pub fn new(name: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            name: name.into(),
            actions,
            parameters: Vec::new(),
            global_context: true,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    pub fn with_global_context(mut self, global_context: bool) -> Self {
        self.global_context = global_context;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn parameters(&self) -> &[(String, Value)] {
        &self.parameters
    }

    pub fn is_global_context(&self) -> bool {
        self.global_context
    }
}

/// Looks up template definitions by name
///
/// Registration belongs to the assembly layer; the engine only resolves.
pub trait TemplateResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<TemplateDefinition>>;
}

/// In-memory template registry
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Arc<TemplateDefinition>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any previous one with the same name
    pub fn register(&mut self, definition: TemplateDefinition) -> &mut Self {
        tracing::debug!(template = definition.name(), "Registering template");
        self.templates
            .insert(definition.name().to_string(), Arc::new(definition));
        self
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateResolver for TemplateRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<TemplateDefinition>> {
        self.templates.get(name).cloned()
    }
}

/// Invocation of a registered template
///
/// Parameters are bound into the template's context before its actions run
/// as a sequence. In global mode (the default) the bindings and every write
/// the fragment makes remain visible to the caller; otherwise they live in a
/// throwaway child context.
pub struct Template {
    name: String,
    description: Option<String>,
    parameters: Vec<(String, Value)>,
    /// Overrides the definition's scope mode when set
    global_context: Option<bool>,
    resolver: Arc<dyn TemplateResolver>,
}

impl Template {
    pub fn new(name: impl Into<String>, resolver: Arc<dyn TemplateResolver>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters: Vec::new(),
            global_context: None,
            resolver,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    pub fn with_global_context(mut self, global_context: bool) -> Self {
        self.global_context = Some(global_context);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parameters(&self) -> &[(String, Value)] {
        &self.parameters
    }

    pub async fn execute(&self, context: &TestContext) -> Result<()> {
        let definition = self
            .resolver
            .resolve(&self.name)
            .ok_or_else(|| Error::TemplateNotFound(self.name.clone()))?;

        let global = self.global_context.unwrap_or(definition.global_context);
        let inner = context.child(global);

        for (name, value) in merge_parameters(&definition.parameters, &self.parameters) {
            inner.set_variable(name, context.resolve_value(value)?);
        }

        tracing::debug!(template = %self.name, global, "Applying template");
        run_sequence(&definition.actions, &inner).await
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("global_context", &self.global_context)
            .finish()
    }
}

/// Definition defaults in order, with invocation values replacing or appending
fn merge_parameters<'a>(
    defaults: &'a [(String, Value)],
    overrides: &'a [(String, Value)],
) -> Vec<(&'a str, &'a Value)> {
    let mut merged: Vec<(&str, &Value)> = defaults.iter().map(|(k, v)| (k.as_str(), v)).collect();
    for (name, value) in overrides {
        match merged.iter_mut().find(|(k, _)| *k == name.as_str()) {
            Some(slot) => slot.1 = value,
            None => merged.push((name.as_str(), value)),
        }
    }
    merged
}
