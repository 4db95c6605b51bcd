//! Configuration file handling

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    /// Worker pool settings
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Global variables seeded into every test context
    #[serde(default)]
    pub variables: BTreeMap<String, serde_json::Value>,
}

/// Worker pool configuration
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct RuntimeConfig {
    /// Number of worker threads running parallel branches
    ///
    /// Defaults to the host's available parallelism.
    pub worker_threads: Option<usize>,
}

impl RuntimeConfig {
    /// Effective worker count
    pub fn worker_threads(&self) -> usize {
        self.worker_threads.filter(|n| *n > 0).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Also write logs to the data directory
    #[serde(default)]
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            file: false,
        }
    }
}

fn default_filter() -> String {
    "actionflow=info,warn".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.runtime.worker_threads == Some(0) {
            return Err(Error::Config(
                "runtime.worker_threads must be at least 1".to_string(),
            ));
        }
        if let Some(name) = self.variables.keys().find(|k| k.trim().is_empty()) {
            return Err(Error::Config(format!("invalid variable name '{}'", name)));
        }
        Ok(())
    }
}
