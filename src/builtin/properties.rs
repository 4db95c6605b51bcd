use async_trait::async_trait;

use crate::action::TestAction;
use crate::common::{Error, Result};
use crate::context::TestContext;

/// Loads variables from a properties file
///
/// Lines are `key=value` or `key: value`. Blank lines and lines starting with
/// `#` or `!` are skipped, and a key without a separator gets an empty value.
/// Values may reference variables, including ones loaded earlier in the file.
#[derive(Debug, Clone)]
pub struct LoadProperties {
    path: String,
}

impl LoadProperties {
    /// The path itself may contain placeholders
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TestAction for LoadProperties {
    fn name(&self) -> &str {
        "load-properties"
    }

    async fn execute(&self, context: &TestContext) -> Result<()> {
        let path = context.resolve(&self.path)?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::FileRead {
                path: path.clone(),
                error: e.to_string(),
            })?;

        let mut loaded = 0usize;
        for (key, value) in parse_properties(&content) {
            let value = context.resolve(value)?;
            context.set_variable(key, value);
            loaded += 1;
        }

        tracing::info!(path = %path, loaded, "Loaded properties");
        Ok(())
    }
}

fn parse_properties(content: &str) -> impl Iterator<Item = (&str, &str)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .map(|line| match line.find(['=', ':']) {
            Some(at) => (line[..at].trim(), line[at + 1..].trim()),
            None => (line, ""),
        })
}
