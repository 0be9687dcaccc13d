//! JSONL file writer for run events.
//!
//! Each [`RunEvent`] is serialized as a single JSON line with a `type` field
//! and `timestamp`, appended to the file via a buffered writer.

use interconsult_application::{RunEvent, RunEventLogger};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL run transcript that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`; concurrent specialists log
/// through the same instance. Flushes on `Drop`.
pub struct JsonlRunEventLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlRunEventLogger {
    /// Create a new logger writing to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create transcript directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not create transcript file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Logger writing `<dir>/<timestamp>.run.jsonl`
    pub fn in_dir(dir: impl AsRef<Path>) -> Option<Self> {
        let name = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ.run.jsonl").to_string();
        Self::new(dir.as_ref().join(name))
    }

    /// Get the path to the transcript file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunEventLogger for JsonlRunEventLogger {
    fn log(&self, event: RunEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        // Build the record: merge payload with type + timestamp
        let record = if let serde_json::Value::Object(mut map) = event.payload {
            map.insert(
                "type".to_string(),
                serde_json::Value::String(event.event_type.to_string()),
            );
            map.insert("timestamp".to_string(), serde_json::Value::String(timestamp));
            serde_json::Value::Object(map)
        } else {
            serde_json::json!({
                "type": event.event_type,
                "timestamp": timestamp,
                "data": event.payload,
            })
        };

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // a cancelled run must still leave a readable transcript
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlRunEventLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read(path: &Path) -> String {
        let mut content = String::new();
        File::open(path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    #[test]
    fn test_jsonl_logger_writes_valid_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.run.jsonl");
        let logger = JsonlRunEventLogger::new(&path).unwrap();

        logger.log(RunEvent::new(
            "consultation_dispatched",
            serde_json::json!({
                "consultation_id": "C-001",
                "specialty": "cardiology",
                "urgency": "routine"
            }),
        ));
        logger.log(RunEvent::new(
            "tool_call",
            serde_json::json!({
                "consultation_id": "C-001",
                "tool": "calculate_chads2vasc",
                "success": true
            }),
        ));
        drop(logger);

        let content = read(&path);
        let lines: Vec<&str> = content.trim().lines().collect();
        assert_eq!(lines.len(), 2);

        for line in &lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("type").is_some());
            assert!(value.get("timestamp").is_some());
        }

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "consultation_dispatched");
        assert_eq!(first["specialty"], "cardiology");

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["tool"], "calculate_chads2vasc");
        assert_eq!(second["success"], true);
    }

    #[test]
    fn test_jsonl_logger_handles_non_object_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.run.jsonl");
        let logger = JsonlRunEventLogger::new(&path).unwrap();

        logger.log(RunEvent::new("record_assembled", serde_json::json!("case-1")));
        drop(logger);

        let value: serde_json::Value = serde_json::from_str(read(&path).trim()).unwrap();
        assert_eq!(value["type"], "record_assembled");
        assert_eq!(value["data"], "case-1");
    }

    #[test]
    fn test_in_dir_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let logger = JsonlRunEventLogger::in_dir(dir.path().join("runs/2026")).unwrap();

        assert!(logger.path().starts_with(dir.path().join("runs/2026")));
        assert!(logger.path().to_string_lossy().ends_with(".run.jsonl"));
    }
}
