//! # devtrail-core
//!
//! Configuration shared by the devtrail crates. The logging pipeline in
//! `devtrail-logger` consumes a [`DevtrailConfig`] read-only at startup.

pub mod config;

pub use config::{
    ConfigError, DevtrailConfig, MAX_RESULT_WINDOW, SearchIndexConfig, StorageConfig, StorageType,
};
