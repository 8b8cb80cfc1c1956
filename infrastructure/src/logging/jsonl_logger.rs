//! JSONL file writer for orchestration events.
//!
//! Each [`OrchestrationEvent`] becomes one JSON line: the event payload plus
//! `event` and `timestamp` fields.

use squadforge_application::ports::progress::{ListenerError, ProgressListener};
use squadforge_domain::OrchestrationEvent;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Event log that appends one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every event and
/// on `Drop`.
pub struct JsonlEventLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventLogger {
    /// Create the log file (and parent directories).
    ///
    /// Returns `None` if the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not create event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(event: &OrchestrationEvent) -> serde_json::Value {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        match event.payload() {
            serde_json::Value::Object(mut map) => {
                map.insert(
                    "event".to_string(),
                    serde_json::Value::String(event.kind().to_string()),
                );
                map.insert("timestamp".to_string(), serde_json::Value::String(timestamp));
                serde_json::Value::Object(map)
            }
            other => serde_json::json!({
                "event": event.kind(),
                "timestamp": timestamp,
                "data": other,
            }),
        }
    }
}

impl ProgressListener for JsonlEventLogger {
    fn name(&self) -> &str {
        "jsonl-event-log"
    }

    fn on_event(&self, event: &OrchestrationEvent) -> Result<(), ListenerError> {
        let line = serde_json::to_string(&Self::record(event))
            .map_err(|e| ListenerError(e.to_string()))?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ListenerError("event log writer poisoned".to_string()))?;
        writeln!(writer, "{}", line).map_err(|e| ListenerError(e.to_string()))?;
        // JSONL is append-only; flush so a crash keeps every event written so far.
        writer.flush().map_err(|e| ListenerError(e.to_string()))
    }
}

impl Drop for JsonlEventLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squadforge_domain::{ExecutionMode, SquadStatus};

    #[test]
    fn test_writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.events.jsonl");
        let logger = JsonlEventLogger::new(&path).unwrap();

        logger
            .on_event(&OrchestrationEvent::OrchestrationStarted {
                mode: ExecutionMode::Hybrid.to_string(),
            })
            .unwrap();
        logger
            .on_event(&OrchestrationEvent::SquadCompleted {
                squad: "backend".to_string(),
                status: SquadStatus::Partial.as_str().to_string(),
            })
            .unwrap();
        drop(logger);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert!(line.get("timestamp").is_some());
        }
        assert_eq!(lines[0]["event"], "orchestration_started");
        assert_eq!(lines[0]["mode"], "hybrid");
        assert_eq!(lines[1]["event"], "squad_completed");
        assert_eq!(lines[1]["squad"], "backend");
        assert_eq!(lines[1]["status"], "partial");
    }

    #[test]
    fn test_returns_none_for_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        // A regular file cannot be used as a parent directory.
        assert!(JsonlEventLogger::new(blocker.join("events.jsonl")).is_none());
    }
}
