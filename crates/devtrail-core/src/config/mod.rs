//! Configuration types for the devtrail activity logger.
//!
//! Configuration is loaded from a single YAML file (by convention
//! `devtrail.yaml`) and handed to the logger once at startup. Nothing in the
//! logging pipeline mutates it afterwards.
//!
//! # Example
//!
//! ```yaml
//! storage:
//!   storage_type: search_index
//!   file_path: logs.json
//!   search_index:
//!     host: http://localhost:9200
//!     index_name: developer_logs
//! authorized_actors:
//!   - dev_001
//!   - dev_002
//! ```

pub mod storage;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use storage::{MAX_RESULT_WINDOW, SearchIndexConfig, StorageConfig, StorageType};

/// Complete devtrail configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevtrailConfig {
    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Actor identifiers allowed to emit records.
    #[serde(default, alias = "authorizedActors", alias = "authorized_developers")]
    pub authorized_actors: Vec<String>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl DevtrailConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    ///
    /// An empty document yields the default configuration.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Check the configuration for values the logger cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate()?;

        if let Some(idx) = self
            .authorized_actors
            .iter()
            .position(|actor| actor.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "authorized_actors[{}] must not be empty",
                idx
            )));
        }

        Ok(())
    }
}
