//! Log records and their construction.
//!
//! A [`LogRecord`] is immutable once built: its fields are private and only
//! exposed through accessors. [`RecordBuilder`] captures the wall-clock start
//! time and a monotonic start marker when it is created, and measures the
//! elapsed time when [`RecordBuilder::build`] is called.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::{Duration, Instant};

use crate::fault::ErrorInfo;

/// Action labels used by the convenience dispatchers. Any other free text is
/// accepted as an action too.
pub mod actions {
    pub const METHOD_CALL: &str = "Method call";
    pub const DATABASE_TRANSACTION: &str = "Database transaction";
    pub const MODEL_INTERACTION: &str = "Model interaction";
}

/// Result label stored when a dispatch had to fall back to an error record.
pub const RESULT_ERROR: &str = "error";

/// One persisted activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "developer_id")]
    actor_id: String,
    action: String,
    model: String,
    method: String,
    result: String,
    error: Option<ErrorInfo>,
    #[serde(deserialize_with = "deserialize_start_time")]
    start_time: DateTime<FixedOffset>,
    /// Elapsed seconds, measured on a monotonic clock.
    duration: f64,
}

impl LogRecord {
    /// Start building a record. Timing starts now.
    pub fn builder(
        actor_id: impl Into<String>,
        action: impl Into<String>,
        model: impl Into<String>,
        method: impl Into<String>,
    ) -> RecordBuilder {
        RecordBuilder::new(actor_id, action, model, method)
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// Local wall-clock time at which construction started.
    pub fn start_time(&self) -> DateTime<FixedOffset> {
        self.start_time
    }

    /// Elapsed seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Format the record as a human-readable log line.
    ///
    /// Format: `[start_time] ACTION developer=.. model=.. method=.. result=.. duration=..s [error=".."]`
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "[{}] {} developer={} model={} method={} result={} duration={:.6}s",
            self.start_time.format("%Y-%m-%dT%H:%M:%S%.3f%:z"),
            self.action.to_uppercase(),
            self.actor_id,
            self.model,
            self.method,
            self.result,
            self.duration,
        );

        if let Some(ref error) = self.error {
            line.push_str(&format!(" error=\"{}\"", error.to_string().replace('"', "'")));
        }

        line
    }
}

/// Accept RFC 3339 timestamps and ISO-8601 timestamps without an offset.
///
/// Offset-less timestamps are local capture times and are read in the local
/// time zone. A local time skipped by a DST transition is read as UTC.
fn deserialize_start_time<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(time) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(time);
    }

    let naive: NaiveDateTime = raw.parse().map_err(|e| {
        serde::de::Error::custom(format!("invalid start_time '{}': {}", raw, e))
    })?;
    Ok(Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|time| time.fixed_offset())
        .unwrap_or_else(|| naive.and_utc().fixed_offset()))
}

/// Builder for [`LogRecord`]s.
///
/// The record's `duration` covers the time from [`RecordBuilder::new`] to
/// [`RecordBuilder::build`] unless an explicit duration is supplied.
#[derive(Debug)]
pub struct RecordBuilder {
    actor_id: String,
    action: String,
    model: String,
    method: String,
    result: String,
    error: Option<ErrorInfo>,
    start_time: DateTime<FixedOffset>,
    started: Instant,
    duration: Option<Duration>,
}

impl RecordBuilder {
    /// Create a new builder with required fields. The result defaults to
    /// `success`.
    pub fn new(
        actor_id: impl Into<String>,
        action: impl Into<String>,
        model: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            start_time: Local::now().fixed_offset(),
            started: Instant::now(),
            actor_id: actor_id.into(),
            action: action.into(),
            model: model.into(),
            method: method.into(),
            result: "success".to_string(),
            error: None,
            duration: None,
        }
    }

    /// Set the outcome label.
    pub fn result(mut self, result: impl Into<String>) -> Self {
        self.result = result.into();
        self
    }

    /// Attach a formatted fault.
    pub fn error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    /// Attach a formatted fault if there is one.
    pub fn maybe_error(mut self, error: Option<ErrorInfo>) -> Self {
        self.error = error;
        self
    }

    /// Use a duration the caller measured instead of timing construction.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Build the record.
    pub fn build(self) -> LogRecord {
        let elapsed = self.duration.unwrap_or_else(|| self.started.elapsed());

        LogRecord {
            actor_id: self.actor_id,
            action: self.action,
            model: self.model,
            method: self.method,
            result: self.result,
            error: self.error,
            start_time: self.start_time,
            duration: elapsed.as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = LogRecord::builder("dev_001", actions::METHOD_CALL, "UserModel", "update_user")
            .build();

        assert_eq!(record.actor_id(), "dev_001");
        assert_eq!(record.action(), "Method call");
        assert_eq!(record.model(), "UserModel");
        assert_eq!(record.method(), "update_user");
        assert_eq!(record.result(), "success");
        assert!(record.error().is_none());
        assert!(record.duration() >= 0.0);
    }

    #[test]
    fn test_explicit_duration() {
        let record = LogRecord::builder("dev_001", "Deploy", "Service", "rollout")
            .result("failure")
            .with_duration(Duration::from_millis(1500))
            .build();

        assert_eq!(record.result(), "failure");
        assert!((record.duration() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serialized_keys() {
        let record = LogRecord::builder("dev_002", actions::DATABASE_TRANSACTION, "Order", "insert")
            .build();
        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();

        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        for key in [
            "developer_id",
            "action",
            "model",
            "method",
            "result",
            "error",
            "start_time",
            "duration",
        ] {
            assert!(keys.contains(&key), "missing key {}", key);
        }
        assert_eq!(object.len(), 8);
        assert!(object["error"].is_null());
        assert_eq!(object["developer_id"], "dev_002");
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let record = LogRecord::builder("dev_001", actions::MODEL_INTERACTION, "Classifier", "predict")
            .result("failure")
            .error(ErrorInfo::new("ValueError", "bad \"input\"\nline two"))
            .build();

        let json = serde_json::to_string(&record).unwrap();
        let back: LogRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(back.actor_id(), record.actor_id());
        assert_eq!(back.action(), record.action());
        assert_eq!(back.model(), record.model());
        assert_eq!(back.method(), record.method());
        assert_eq!(back.result(), record.result());
        assert_eq!(back.error(), record.error());
        assert_eq!(back.start_time(), record.start_time());
        assert!((back.duration() - record.duration()).abs() < 1e-9);
    }

    #[test]
    fn test_start_time_without_offset_is_local() {
        let json = r#"{
            "developer_id": "dev_001",
            "action": "Method call",
            "model": "UserModel",
            "method": "update_user",
            "result": "success",
            "error": null,
            "start_time": "2024-05-01T10:20:30.123456",
            "duration": 0.25
        }"#;

        let record: LogRecord = serde_json::from_str(json).unwrap();
        let expected = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(10, 20, 30, 123_456)
            .unwrap();
        assert_eq!(record.start_time().naive_local(), expected);

        let whole_seconds = json.replace("10:20:30.123456", "10:20:30");
        let record: LogRecord = serde_json::from_str(&whole_seconds).unwrap();
        assert_eq!(record.start_time().format("%H:%M:%S").to_string(), "10:20:30");
    }

    #[test]
    fn test_start_time_with_offset_is_kept() {
        let value = serde_json::json!({
            "developer_id": "dev_001",
            "action": "Method call",
            "model": "UserModel",
            "method": "update_user",
            "result": "success",
            "error": null,
            "start_time": "2024-05-01T10:20:30.5+02:00",
            "duration": 0.0
        });

        let record: LogRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.start_time().offset().local_minus_utc(), 2 * 3600);
        assert_eq!(record.start_time().to_rfc3339(), "2024-05-01T10:20:30.500+02:00");
    }

    #[test]
    fn test_invalid_start_time_is_rejected() {
        let value = serde_json::json!({
            "developer_id": "dev_001",
            "action": "Method call",
            "model": "UserModel",
            "method": "update_user",
            "result": "success",
            "error": null,
            "start_time": "yesterday",
            "duration": 0.0
        });

        let err = serde_json::from_value::<LogRecord>(value).unwrap_err();
        assert!(err.to_string().contains("invalid start_time 'yesterday'"));
    }

    #[test]
    fn test_to_log_line() {
        let record = LogRecord::builder("dev_001", actions::METHOD_CALL, "UserModel", "update_user")
            .result("failure")
            .error(ErrorInfo::new("ZeroDivisionError", "division by zero"))
            .build();

        let line = record.to_log_line();
        assert!(line.contains("METHOD CALL"));
        assert!(line.contains("developer=dev_001"));
        assert!(line.contains("model=UserModel"));
        assert!(line.contains("result=failure"));
        assert!(line.contains("error=\"ZeroDivisionError: division by zero\""));
    }
}
