//! Record storage backends.
//!
//! A backend appends records and reads all of them back. Two backends exist:
//!
//! - [`FileBackend`]: a single JSON file holding an array of records
//! - [`SearchIndexBackend`]: one document per record in an
//!   Elasticsearch-compatible index
//!
//! `append` and `read_all` report failures as [`LogError`]. Callers that must
//! never fail use the best-effort forms, which report through `tracing` and
//! degrade instead.

mod file;
mod search;

use async_trait::async_trait;
use devtrail_core::{StorageConfig, StorageType};
use std::sync::Arc;

use crate::error::LogError;
use crate::record::LogRecord;

pub use file::FileBackend;
pub use search::SearchIndexBackend;

/// Trait for record storage backends.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Durably append one record.
    async fn append(&self, record: &LogRecord) -> Result<(), LogError>;

    /// Read every stored record, in the backend's order.
    async fn read_all(&self) -> Result<Vec<LogRecord>, LogError>;

    /// Append, reporting a failure instead of returning it.
    ///
    /// Returns whether the record was stored.
    async fn append_best_effort(&self, record: &LogRecord) -> bool {
        match self.append(record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(backend = self.name(), error = %e, "Failed to save log record");
                false
            }
        }
    }

    /// Read all records, or an empty list if the backend cannot be read.
    async fn read_all_or_empty(&self) -> Vec<LogRecord> {
        match self.read_all().await {
            Ok(records) => records,
            Err(e) if e.is_not_found() => {
                tracing::info!(backend = self.name(), "Log file not found");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(backend = self.name(), error = %e, "Failed to read log records");
                Vec::new()
            }
        }
    }
}

/// Create the storage backend selected by configuration.
pub fn create_backend(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>, LogError> {
    config.validate()?;

    match config.storage_type {
        StorageType::File => Ok(Arc::new(FileBackend::new(&config.file_path))),
        StorageType::SearchIndex => Ok(Arc::new(SearchIndexBackend::new(&config.search_index)?)),
    }
}
