//! Storage backend configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;

/// Which storage backend records are persisted to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum StorageType {
    /// A single JSON file holding an array of records.
    #[default]
    #[serde(rename = "file", alias = "json_file")]
    File,
    /// An Elasticsearch-compatible search index.
    #[serde(rename = "search_index", alias = "elasticsearch", alias = "searchIndex")]
    SearchIndex,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::SearchIndex => write!(f, "search_index"),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Selected backend.
    #[serde(default, alias = "storageType")]
    pub storage_type: StorageType,

    /// Path of the JSON log file (file backend).
    #[serde(default = "default_file_path", alias = "filePath", alias = "filename")]
    pub file_path: PathBuf,

    /// Search index settings (search index backend).
    #[serde(default, alias = "searchIndex", alias = "elasticsearch")]
    pub search_index: SearchIndexConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::default(),
            file_path: default_file_path(),
            search_index: SearchIndexConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Validate the settings of the selected backend.
    ///
    /// Settings of the backend that is not selected are ignored.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.storage_type {
            StorageType::File => {
                if self.file_path.as_os_str().is_empty() {
                    return Err(ConfigError::Invalid(
                        "storage.file_path must not be empty".to_string(),
                    ));
                }
                Ok(())
            }
            StorageType::SearchIndex => self.search_index.validate(),
        }
    }
}

/// Largest page a single search request may return. Elasticsearch rejects
/// `from + size` above its `index.max_result_window`, which defaults to this.
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// Search index connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIndexConfig {
    /// Base URL of the store, e.g. `http://localhost:9200`.
    #[serde(default = "default_host")]
    pub host: String,

    /// Index that records are written to and read from.
    #[serde(default = "default_index_name", alias = "indexName", alias = "index")]
    pub index_name: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of documents returned by a match-all read. At most
    /// [`MAX_RESULT_WINDOW`]; records beyond it are not read back.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Wait for an indexed document to become searchable before returning.
    #[serde(default = "default_refresh")]
    pub refresh: bool,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            index_name: default_index_name(),
            timeout_secs: default_timeout_secs(),
            max_results: default_max_results(),
            refresh: default_refresh(),
        }
    }
}

impl SearchIndexConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ConfigError::Invalid(
                "storage.search_index.host must not be empty".to_string(),
            ));
        }
        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "storage.search_index.host must start with http:// or https://, got '{}'",
                host
            )));
        }
        validate_index_name(&self.index_name)?;
        if self.max_results == 0 {
            return Err(ConfigError::Invalid(
                "storage.search_index.max_results must be greater than zero".to_string(),
            ));
        }
        if self.max_results > MAX_RESULT_WINDOW {
            return Err(ConfigError::Invalid(format!(
                "storage.search_index.max_results must be at most {}, got {}",
                MAX_RESULT_WINDOW, self.max_results
            )));
        }
        Ok(())
    }
}

/// Index names follow the store's rules: lowercase, no leading `-`, `_` or
/// `+`, no whitespace and none of `\ / * ? " < > | , #`.
fn validate_index_name(name: &str) -> Result<(), ConfigError> {
    const FORBIDDEN: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ',', '#'];

    if name.is_empty() {
        return Err(ConfigError::Invalid(
            "storage.search_index.index_name must not be empty".to_string(),
        ));
    }
    if name.starts_with(['-', '_', '+']) {
        return Err(ConfigError::Invalid(format!(
            "index name '{}' must not start with '-', '_' or '+'",
            name
        )));
    }
    if name.chars().any(|c| c.is_uppercase()) {
        return Err(ConfigError::Invalid(format!(
            "index name '{}' must be lowercase",
            name
        )));
    }
    if let Some(c) = name
        .chars()
        .find(|c| c.is_whitespace() || FORBIDDEN.contains(c))
    {
        return Err(ConfigError::Invalid(format!(
            "index name '{}' contains forbidden character '{}'",
            name, c
        )));
    }
    Ok(())
}

fn default_file_path() -> PathBuf {
    PathBuf::from("logs.json")
}

fn default_host() -> String {
    "http://localhost:9200".to_string()
}

fn default_index_name() -> String {
    "developer_logs".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_results() -> usize {
    MAX_RESULT_WINDOW
}

fn default_refresh() -> bool {
    true
}
