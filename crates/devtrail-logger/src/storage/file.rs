//! JSON file backend.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::StorageBackend;
use crate::error::LogError;
use crate::record::LogRecord;

/// Stores all records as one JSON array in a single file.
///
/// Every append reads the whole array, pushes the record and rewrites the
/// file. Appends through one `FileBackend` are serialized by an internal
/// mutex, so concurrent appends never lose each other's records. Separate
/// processes (or separate `FileBackend`s on the same path) are not
/// coordinated and can still overwrite each other's appends.
///
/// The rewrite goes to a sibling temporary file that is then renamed over the
/// log, so a concurrent reader sees either the old or the new array.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Create a backend for `path`. The file is created on first append.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Read the raw array. Entries are kept as JSON values so appends never
    /// rewrite entries they do not understand.
    async fn load_entries(&self) -> Result<Vec<serde_json::Value>, LogError> {
        let bytes = tokio::fs::read(&self.path).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn append(&self, record: &LogRecord) -> Result<(), LogError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = match self.load_entries().await {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => Vec::new(),
            // A file we cannot parse is left untouched.
            Err(e) => return Err(e),
        };
        entries.push(serde_json::to_value(record)?);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(&entries)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "Log saved to JSON file");
        Ok(())
    }

    /// Entries that are not records (written by other tools, or by older
    /// versions) are skipped with a warning. They stay in the file.
    async fn read_all(&self) -> Result<Vec<LogRecord>, LogError> {
        let entries = self.load_entries().await?;
        let mut records = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<LogRecord>(entry) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    index,
                    error = %e,
                    "Skipping unreadable log entry"
                ),
            }
        }
        tracing::debug!(path = %self.path.display(), count = records.len(), "Logs read");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::ErrorInfo;
    use crate::record::actions;
    use std::sync::Arc;

    fn record(actor: &str, method: &str) -> LogRecord {
        LogRecord::builder(actor, actions::METHOD_CALL, "UserModel", method).build()
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("logs.json"));

        let err = backend.read_all().await.unwrap_err();
        assert!(err.is_not_found());
        assert!(backend.read_all_or_empty().await.is_empty());
    }

    #[tokio::test]
    async fn test_append_creates_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs.json");
        let backend = FileBackend::new(&path);

        backend.append(&record("dev_001", "create_user")).await.unwrap();
        backend.append(&record("dev_002", "delete_user")).await.unwrap();

        let records = backend.read_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].method(), "create_user");
        assert_eq!(records[1].actor_id(), "dev_002");
        assert!(!backend.temp_path().exists());
    }

    #[tokio::test]
    async fn test_file_is_a_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.json");
        let backend = FileBackend::new(&path);

        let failing = LogRecord::builder("dev_001", actions::METHOD_CALL, "UserModel", "divide")
            .result("failure")
            .error(ErrorInfo::new("ZeroDivisionError", "division by zero"))
            .build();
        backend.append(&failing).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entries = raw.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["developer_id"], "dev_001");
        assert_eq!(entries[0]["error"]["type"], "ZeroDivisionError");
        assert_eq!(entries[0]["error"]["message"], "division by zero");
    }

    #[tokio::test]
    async fn test_empty_file_is_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.json");
        std::fs::write(&path, "").unwrap();

        let backend = FileBackend::new(&path);
        assert!(backend.read_all().await.unwrap().is_empty());

        backend.append(&record("dev_001", "update_user")).await.unwrap();
        assert_eq!(backend.read_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.json");
        std::fs::write(&path, "{ not json").unwrap();

        let backend = FileBackend::new(&path);
        let err = backend.append(&record("dev_001", "update_user")).await.unwrap_err();
        assert!(matches!(err, LogError::Serialization(_)));
        assert!(!backend.append_best_effort(&record("dev_001", "update_user")).await);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
        assert!(backend.read_all_or_empty().await.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_entries_survive_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.json");
        std::fs::write(&path, r#"[{"note": "written by another tool"}]"#).unwrap();

        let backend = FileBackend::new(&path);
        backend.append(&record("dev_001", "update_user")).await.unwrap();

        let raw: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0]["note"], "written by another tool");

        backend.append(&record("dev_002", "delete_user")).await.unwrap();
        let records = backend.read_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].actor_id(), "dev_001");
        assert_eq!(records[1].method(), "delete_user");
    }

    #[tokio::test]
    async fn test_timestamp_without_offset_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.json");
        std::fs::write(
            &path,
            r#"[{
                "developer_id": "dev_001",
                "action": "Method call",
                "model": "UserModel",
                "method": "update_user",
                "result": "success",
                "error": null,
                "start_time": "2024-05-01T10:20:30.123456",
                "duration": 0.002
            }]"#,
        )
        .unwrap();

        let backend = FileBackend::new(&path);
        let records = backend.read_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].actor_id(), "dev_001");
        assert_eq!(
            records[0].start_time().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            "2024-05-01T10:20:30.123456"
        );

        // Appending keeps the old entry as written and adds an RFC 3339 one.
        backend.append(&record("dev_002", "delete_user")).await.unwrap();
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["start_time"], "2024-05-01T10:20:30.123456");
        let written = raw[1]["start_time"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(written).is_ok());
        assert_eq!(backend.read_all().await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FileBackend::new(dir.path().join("logs.json")));

        let mut handles = Vec::new();
        for i in 0..16 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                backend.append(&record("dev_001", &format!("call_{}", i))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let records = backend.read_all().await.unwrap();
        assert_eq!(records.len(), 16);
        for i in 0..16 {
            let method = format!("call_{}", i);
            assert!(records.iter().any(|r| r.method() == method));
        }
    }
}
