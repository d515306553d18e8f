//! JSONL file writer for invocations and alert transitions.
//!
//! Each record is serialized as a single JSON line with a `type` field
//! (`invocation` or `alert`) and a `timestamp`, appended to the file via a
//! buffered writer.

use serde::Serialize;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use toolgate_application::InvocationLogger;
use toolgate_domain::{AlertEvent, Invocation};
use tracing::warn;

/// JSONL invocation logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Appends to an existing file and
/// flushes on `Drop`.
pub struct JsonlInvocationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlInvocationLogger {
    /// Open (or create) the log file, creating parent directories as needed.
    ///
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create invocation log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open invocation log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_record(&self, record_type: &str, payload: &impl Serialize) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let record = match serde_json::to_value(payload) {
            Ok(Value::Object(mut map)) => {
                map.insert("type".to_string(), Value::String(record_type.to_string()));
                map.insert("timestamp".to_string(), Value::String(timestamp));
                Value::Object(map)
            }
            Ok(other) => serde_json::json!({
                "type": record_type,
                "timestamp": timestamp,
                "data": other,
            }),
            Err(e) => {
                warn!("Could not serialize {} record: {}", record_type, e);
                return;
            }
        };

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // JSONL is append-only; flush each line so a crash loses at most one
            let _ = writer.flush();
        }
    }
}

impl InvocationLogger for JsonlInvocationLogger {
    fn log_invocation(&self, invocation: &Invocation) {
        self.write_record("invocation", invocation);
    }

    fn log_alert(&self, event: &AlertEvent) {
        self.write_record("alert", event);
    }
}

impl Drop for JsonlInvocationLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::time::Duration;
    use toolgate_domain::{
        AlertRuleId, AlertTransition, DegradedModeNotice, DegradedReason, ToolError, ToolName,
        UsedMode,
    };

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_invocation_and_alert_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("invocations.jsonl");
        let logger = JsonlInvocationLogger::new(&path).unwrap();

        let success = Invocation::success("search".into(), UsedMode::Live, json!({"hits": 2}))
            .timed(Utc::now(), Duration::from_millis(40));
        let substituted = Invocation::success("search".into(), UsedMode::Degraded, json!({}))
            .with_notice(DegradedModeNotice::new(DegradedReason::BackendUnhealthy));
        logger.log_invocation(&success);
        logger.log_invocation(&substituted);
        logger.log_alert(&AlertEvent {
            rule_id: AlertRuleId::HighLatency,
            tool_name: ToolName::from("search"),
            severity: AlertRuleId::HighLatency.severity(),
            transition: AlertTransition::Fired,
            at: Utc::now(),
            detail: "p95 6200ms".to_string(),
        });
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records.len(), 3);
        for record in &records {
            assert!(record.get("timestamp").is_some());
        }
        assert_eq!(records[0]["type"], "invocation");
        assert_eq!(records[0]["tool_name"], "search");
        assert_eq!(records[0]["result"], json!({"hits": 2}));
        assert!(records[1].get("degraded_notice").is_some());
        assert_eq!(records[2]["type"], "alert");
        assert_eq!(records[2]["rule_id"], "high_latency");
    }

    #[test]
    fn test_appends_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invocations.jsonl");

        for _ in 0..2 {
            let logger = JsonlInvocationLogger::new(&path).unwrap();
            logger.log_invocation(&Invocation::failure(
                "calc".into(),
                UsedMode::Live,
                ToolError::Connection {
                    tool: "calc".to_string(),
                    message: "refused".to_string(),
                },
            ));
        }

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert!(records[1].get("error").is_some());
    }

    #[test]
    fn test_returns_none_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        assert!(JsonlInvocationLogger::new(blocker.join("log.jsonl")).is_none());
    }
}
