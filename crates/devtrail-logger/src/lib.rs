//! # devtrail-logger
//!
//! Access-controlled activity logging.
//!
//! This crate provides functionality for:
//! - Recording method calls, database transactions and model interactions
//!   performed by identified actors
//! - Rejecting records from actors outside a fixed allow-list
//! - Capturing faults as structured, serializable [`ErrorInfo`]s
//! - Persisting records to a JSON file or a search index
//! - Reading records back and filtering them by action, model or actor
//!
//! Logging never breaks the code being logged: no operation on [`Logger`]
//! returns an error or panics because of the pipeline. Failures are reported
//! through `tracing`.
//!
//! ## Record Format
//!
//! | Key | Description |
//! |-----|-------------|
//! | `developer_id` | Actor that performed the action |
//! | `action` | `Method call`, `Database transaction`, `Model interaction` or free text |
//! | `model` / `method` | Subject of the action |
//! | `result` | Outcome label, e.g. `success`, `failure`, `error` |
//! | `error` | `null` or `{type, message, traceback}` |
//! | `start_time` | ISO-8601 local time |
//! | `duration` | Elapsed seconds (monotonic clock) |
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use devtrail_core::DevtrailConfig;
//! use devtrail_logger::{DispatchMode, ErrorInfo, Logger};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DevtrailConfig::from_file("devtrail.yaml")?;
//! let logger = Logger::from_config(&config)?;
//!
//! if let Err(e) = "abc".parse::<i32>() {
//!     logger
//!         .record_method_call(
//!             "dev_001",
//!             "UserModel",
//!             "update_user",
//!             "failure",
//!             Some(ErrorInfo::capture(&e)),
//!             DispatchMode::Inline,
//!         )
//!         .await;
//! }
//!
//! logger.record_transaction("dev_001", "Order", "insert", "success", None);
//! logger.wait_idle().await;
//!
//! let failures = logger.filter_by_model("UserModel").await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fault;
pub mod gate;
pub mod logger;
pub mod query;
pub mod record;
pub mod storage;

pub use error::LogError;
pub use fault::ErrorInfo;
pub use gate::AccessGate;
pub use logger::{DispatchMode, DispatchOutcome, Logger};
pub use query::RecordFilter;
pub use record::{LogRecord, RecordBuilder, actions};
pub use storage::{FileBackend, SearchIndexBackend, StorageBackend, create_backend};
