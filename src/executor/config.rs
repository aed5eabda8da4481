//! Execution configuration
//!
//! Loaded from a JSON document. Every field is optional:
//!
//! ```json
//! {
//!   "log_operator_execution": false,
//!   "row_count_mode": "exact",
//!   "max_rows": 100
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Which table-status read backs the Count operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RowCountMode {
    /// Committed count plus this session's own writes
    #[default]
    Exact,
    /// Committed count only; never contends with writers
    Approximate,
}

impl RowCountMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowCountMode::Exact => "exact",
            RowCountMode::Approximate => "approximate",
        }
    }
}

/// Runtime options shared by every cursor of one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Log every open/next/close at TRACE level
    #[serde(default)]
    pub log_operator_execution: bool,

    #[serde(default)]
    pub row_count_mode: RowCountMode,

    /// Cap on rows returned by a top-level scan
    #[serde(default)]
    pub max_rows: Option<u64>,
}

impl ExecutionConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: ExecutionConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rows == Some(0) {
            return Err(ConfigError::Invalid("max_rows must be > 0".to_string()));
        }
        Ok(())
    }
}
