//! Structured fault capture.
//!
//! [`ErrorInfo`] is the only form in which a fault reaches a record. It holds
//! plain strings, so a record carrying one is always serializable.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;

/// Serializable description of a fault.
///
/// Stored as `{"type": .., "message": .., "traceback": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(rename = "type")]
    kind: String,
    message: String,
    #[serde(rename = "traceback")]
    trace: String,
}

impl ErrorInfo {
    /// Describe a caller-defined fault. The trace is captured here.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            trace: capture_trace(),
        }
    }

    /// Capture any `std::error::Error`.
    ///
    /// The kind is the unqualified type name of `E`; the message is the
    /// error's `Display` followed by its `source()` chain.
    pub fn capture<E>(err: &E) -> Self
    where
        E: StdError + ?Sized,
    {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": caused by ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        Self::new(short_type_name(std::any::type_name::<E>()), message)
    }

    /// Capture an `anyhow::Error`, keeping its context chain in the message.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        Self::new("anyhow::Error", format!("{:#}", err))
    }

    /// Capture a panic payload as returned by `catch_unwind`.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::new("panic", message)
    }

    /// Fault category, e.g. `ParseIntError`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Backtrace captured when the fault was formatted. Empty if the
    /// platform could not capture one.
    pub fn trace(&self) -> &str {
        &self.trace
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Render the current call stack, or an empty string if that fails.
fn capture_trace() -> String {
    std::panic::catch_unwind(|| {
        let trace = Backtrace::force_capture();
        match trace.status() {
            BacktraceStatus::Captured => trace.to_string(),
            _ => String::new(),
        }
    })
    .unwrap_or_default()
}

/// `core::num::error::ParseIntError` -> `ParseIntError`,
/// `dyn core::error::Error + Send` -> `Error`.
fn short_type_name(full: &str) -> &str {
    let base = full.strip_prefix("dyn ").unwrap_or(full);
    let base = base.split([' ', '<']).next().unwrap_or(base);
    base.rsplit("::").next().unwrap_or(base)
}
