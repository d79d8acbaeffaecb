//! Request log: one JSON object per line, appended to a file.
//!
//! Entries never contain API keys; dispatch records carry the redacted URL.
//! A file that has grown past [`MAX_LOG_BYTES`] is moved aside to `<file>.1`
//! when the logger opens it, so at most two generations are kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub component: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl LogEntry {
    pub fn new(level: LogLevel, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            component: component.into(),
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, ctx: serde_json::Value) -> Self {
        self.context = Some(ctx);
        self
    }
}

/// Outcome of one relayed call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub status: u16,
    pub success: bool,
    pub elapsed_ms: u64,
}

pub struct Logger {
    writer: BufWriter<File>,
}

impl Logger {
    pub fn new(file_path: impl AsRef<Path>) -> std::io::Result<Self> {
        Self::open(file_path.as_ref(), MAX_LOG_BYTES)
    }

    fn open(file_path: &Path, max_bytes: u64) -> std::io::Result<Self> {
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        rotate_if_oversized(file_path, max_bytes)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn log(&mut self, entry: &LogEntry) {
        if let Ok(json) = serde_json::to_string(entry) {
            let _ = writeln!(self.writer, "{}", json);
            let _ = self.writer.flush();
        }
    }
}

/// `<file>.1` next to the live log.
fn rotated_path(file_path: &Path) -> PathBuf {
    let mut name = OsString::from(file_path.as_os_str());
    name.push(".1");
    PathBuf::from(name)
}

fn rotate_if_oversized(file_path: &Path, max_bytes: u64) -> std::io::Result<()> {
    match std::fs::metadata(file_path) {
        Ok(meta) if meta.len() > max_bytes => {
            std::fs::rename(file_path, rotated_path(file_path))
        }
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct SharedLogger(Arc<Mutex<Logger>>);

impl SharedLogger {
    pub fn new(file_path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self(Arc::new(Mutex::new(Logger::new(file_path)?))))
    }

    pub fn log(&self, entry: LogEntry) {
        if let Ok(mut logger) = self.0.lock() {
            logger.log(&entry);
        }
    }

    pub fn info(&self, component: impl Into<String>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Info, component, message));
    }

    pub fn warn(&self, component: impl Into<String>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Warn, component, message));
    }

    /// Record a finished call. Failures above 499 are logged as errors,
    /// other failures as warnings.
    pub fn log_dispatch(&self, record: &DispatchRecord) {
        let level = match (record.success, record.status) {
            (true, _) => LogLevel::Info,
            (false, s) if s >= 500 => LogLevel::Error,
            (false, _) => LogLevel::Warn,
        };
        let message = format!(
            "{} status={} provider={} elapsed={}ms",
            if record.success { "relayed" } else { "failed" },
            record.status,
            record.provider.as_deref().unwrap_or("-"),
            record.elapsed_ms
        );
        let context = serde_json::to_value(record).unwrap_or(serde_json::Value::Null);
        self.log(LogEntry::new(level, "dispatch", message).with_context(context));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(success: bool, status: u16) -> DispatchRecord {
        DispatchRecord {
            request_id: "req-1".to_string(),
            provider: Some("openai".to_string()),
            url: Some("https://api.openai.com/v1/chat/completions".to_string()),
            status,
            success,
            elapsed_ms: 12,
        }
    }

    fn read_entries(path: &Path) -> Vec<LogEntry> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_entries_are_appended() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("relay.log");

        let logger = SharedLogger::new(&path).unwrap();
        logger.info("startup", "listening");
        drop(logger);

        // reopening appends rather than truncating
        let logger = SharedLogger::new(&path).unwrap();
        logger.log_dispatch(&record(true, 200));

        let entries = read_entries(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "listening");
        assert_eq!(entries[1].component, "dispatch");
    }

    #[test]
    fn test_dispatch_levels() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relay.log");
        let logger = SharedLogger::new(&path).unwrap();
        logger.log_dispatch(&record(true, 200));
        logger.log_dispatch(&record(false, 401));
        logger.log_dispatch(&record(false, 500));

        let levels: Vec<LogLevel> = read_entries(&path).iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![LogLevel::Info, LogLevel::Warn, LogLevel::Error]);
    }

    #[test]
    fn test_dispatch_context_carries_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relay.log");
        let logger = SharedLogger::new(&path).unwrap();
        logger.log_dispatch(&record(false, 429));

        let entry = &read_entries(&path)[0];
        let ctx = entry.context.as_ref().unwrap();
        assert_eq!(ctx["request_id"], "req-1");
        assert_eq!(ctx["status"], 429);
        assert!(entry.message.contains("provider=openai"));
    }

    #[test]
    fn test_oversized_file_is_rotated_on_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relay.log");
        std::fs::write(&path, "x".repeat(64)).unwrap();

        let mut logger = Logger::open(&path, 32).unwrap();
        logger.log(&LogEntry::new(LogLevel::Info, "startup", "fresh"));

        assert_eq!(
            std::fs::read_to_string(dir.path().join("relay.log.1")).unwrap(),
            "x".repeat(64)
        );
        let entries = read_entries(&path);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "fresh");
    }

    #[test]
    fn test_small_file_is_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relay.log");

        Logger::open(&path, 1024)
            .unwrap()
            .log(&LogEntry::new(LogLevel::Info, "startup", "first"));
        Logger::open(&path, 1024)
            .unwrap()
            .log(&LogEntry::new(LogLevel::Info, "startup", "second"));

        assert!(!dir.path().join("relay.log.1").exists());
        assert_eq!(read_entries(&path).len(), 2);
    }
}
