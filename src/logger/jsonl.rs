//! JSONL activity log: append-only line-delimited JSON.
//!
//! Each line is a self-contained JSON object assembled in memory and written
//! with a single `write_all`, so a concurrent `tail -f` never sees half a line.
//!
//! The interactive client owns the terminal, so failures never reach stderr:
//! if the file cannot be opened or written the writer drops to silent discard.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TempoError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Things worth recording about a session of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AppStart,
    AppStop,
    PullOk,
    PullFailed,
    SessionToggled,
    SessionCreated,
    SessionUpdated,
    SessionDeleted,
    WorklogCreated,
    Login,
    Logout,
    Error,
}

/// One JSONL line. Only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp with milliseconds.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_key: Option<String>,
    /// Number of trackers in a pull.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Seconds submitted with a worklog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create an entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            session_id: None,
            issue_key: None,
            count: None,
            seconds: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }

    #[must_use]
    pub fn info(event: EventType) -> Self {
        Self::new(event, Severity::Info)
    }

    /// An entry describing a failure, carrying the error's code and text.
    #[must_use]
    pub fn failure(event: EventType, error: &TempoError) -> Self {
        let severity = if error.is_retryable() {
            Severity::Warning
        } else {
            Severity::Error
        };
        Self {
            error_code: Some(error.code().to_string()),
            error_message: Some(error.to_string()),
            ..Self::new(event, severity)
        }
    }

    #[must_use]
    pub fn session(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn issue(mut self, key: Option<impl Into<String>>) -> Self {
        self.issue_key = key.map(Into::into);
        self
    }

    #[must_use]
    pub const fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub const fn seconds(mut self, seconds: u64) -> Self {
        self.seconds = Some(seconds);
        self
    }

    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Discard,
}

#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    /// Size that triggers rotation. Default: 4 MiB.
    pub max_size_bytes: u64,
    /// Rotated files kept next to the live one. Default: 2.
    pub max_rotated_files: u32,
}

impl JsonlConfig {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_size_bytes: 4 * 1024 * 1024,
            max_rotated_files: 2,
        }
    }
}

/// Append-only JSONL writer with size rotation.
pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the log file, or start in discard mode if that fails.
    pub fn open(config: JsonlConfig) -> Self {
        let mut w = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        if let Ok((file, size)) = open_append(&w.config.path) {
            w.writer = Some(BufWriter::new(file));
            w.state = WriterState::Normal;
            w.bytes_written = size;
        }
        w
    }

    /// A writer that drops everything.
    #[must_use]
    pub fn discard() -> Self {
        Self {
            config: JsonlConfig::new(PathBuf::new()),
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        }
    }

    pub fn write_entry(&mut self, entry: &LogEntry) {
        let Ok(json) = serde_json::to_string(entry) else {
            return;
        };
        self.write_line(&format!("{json}\n"));
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    pub fn state(&self) -> &str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Discard => "discard",
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn write_line(&mut self, line: &str) {
        if self.state == WriterState::Discard {
            return;
        }
        if self.bytes_written + line.len() as u64 > self.config.max_size_bytes {
            self.rotate();
        }
        let Some(w) = self.writer.as_mut() else {
            self.degrade();
            return;
        };
        if w.write_all(line.as_bytes()).is_err() || w.flush().is_err() {
            self.degrade();
            return;
        }
        self.bytes_written += line.len() as u64;
    }

    fn degrade(&mut self) {
        self.writer = None;
        self.state = WriterState::Discard;
    }

    fn rotate(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
        self.writer = None;

        let base = self.config.path.clone();
        for i in (1..self.config.max_rotated_files).rev() {
            let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
        }
        if self.config.max_rotated_files == 0 {
            let _ = fs::remove_file(&base);
        } else {
            let _ = rename(&base, rotated_name(&base, 1));
        }

        match open_append(&base) {
            Ok((file, _)) => {
                self.writer = Some(BufWriter::new(file));
                self.bytes_written = 0;
            }
            Err(_) => self.degrade(),
        }
    }
}

/// Cloneable handle shared by the runtime and its worker threads.
#[derive(Clone)]
pub struct ActivityLog {
    inner: Arc<Mutex<JsonlWriter>>,
}

impl ActivityLog {
    /// Open the log at `path`; never fails.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        Self::from_writer(JsonlWriter::open(JsonlConfig::new(path)))
    }

    #[must_use]
    pub fn discard() -> Self {
        Self::from_writer(JsonlWriter::discard())
    }

    fn from_writer(writer: JsonlWriter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn record(&self, entry: &LogEntry) {
        self.inner.lock().write_entry(entry);
    }

    pub fn flush(&self) {
        self.inner.lock().flush();
    }

    pub fn state(&self) -> String {
        self.inner.lock().state().to_string()
    }
}

impl std::fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLog")
            .field("state", &self.state())
            .finish()
    }
}

fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| TempoError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TempoError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// `activity.jsonl` → `activity.jsonl.2`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
