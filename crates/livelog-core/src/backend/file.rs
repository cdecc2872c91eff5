//! JSONL file backend.
//!
//! Appends one [`JsonLogEntry`] per line to a file whose path is computed from
//! a pattern at every write, so a pattern such as `logs/{YYYY}-{MM}-{DD}.jsonl`
//! rolls over to a new file at midnight. Supported placeholders:
//!
//! | placeholder | value            |
//! |-------------|------------------|
//! | `{YYYY}`    | four-digit year  |
//! | `{YY}`      | two-digit year   |
//! | `{MM}`      | zero-padded month|
//! | `{M}`       | month            |
//! | `{DD}`      | zero-padded day  |
//! | `{D}`       | day              |
//!
//! I/O failures never reach the caller: they are reported through `tracing`
//! and the event is dropped.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Local};
use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value;

use super::entry::JsonLogEntry;
use super::Backend;
use crate::error::LogResult;
use crate::level::Level;

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("ANSI escape pattern is valid")
});

/// Remove terminal escape sequences (colors, cursor movement) from `text`.
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

struct OpenFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

/// Backend appending JSON lines to a date-patterned file.
pub struct FileBackend {
    pattern: String,
    current: Mutex<Option<OpenFile>>,
}

impl FileBackend {
    /// Create a file backend. Nothing is opened until the first write.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            current: Mutex::new(None),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Resolve the path pattern for the given moment.
    pub fn resolve_path(&self, now: DateTime<Local>) -> PathBuf {
        let resolved = self
            .pattern
            .replace("{YYYY}", &format!("{:04}", now.year()))
            .replace("{YY}", &format!("{:02}", now.year() % 100))
            .replace("{MM}", &format!("{:02}", now.month()))
            .replace("{M}", &now.month().to_string())
            .replace("{DD}", &format!("{:02}", now.day()))
            .replace("{D}", &now.day().to_string());
        PathBuf::from(resolved)
    }

    /// Path of the file currently open, if any.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.current.lock().as_ref().map(|file| file.path.clone())
    }

    /// Append an entry, switching files when the pattern resolves to a new path.
    pub fn write_entry(&self, entry: &JsonLogEntry, now: DateTime<Local>) -> LogResult<()> {
        let json = entry.to_json_line()?;
        let path = self.resolve_path(now);

        let mut current = self.current.lock();

        let stale = current.as_ref().map(|file| file.path != path).unwrap_or(true);
        if stale {
            if let Some(mut old) = current.take() {
                old.writer.flush()?;
            }
            *current = Some(open_append(&path)?);
            tracing::debug!(path = %path.display(), "Opened log file");
        }

        if let Some(file) = current.as_mut() {
            writeln!(file.writer, "{}", json)?;
            file.writer.flush()?;
        }

        Ok(())
    }

    /// Flush any buffered data to disk.
    pub fn flush(&self) -> LogResult<()> {
        if let Some(file) = self.current.lock().as_mut() {
            file.writer.flush()?;
        }
        Ok(())
    }
}

fn open_append(path: &Path) -> LogResult<OpenFile> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;

    Ok(OpenFile {
        path: path.to_path_buf(),
        writer: BufWriter::new(file),
    })
}

impl Backend for FileBackend {
    fn write(&self, key: Option<&str>, level: Level, message: &str, data: Option<&Value>) {
        let mut entry = JsonLogEntry::new(key, level, strip_ansi(message));
        if let Some(data) = data {
            entry = entry.with_data(data.clone());
        }

        if let Err(e) = self.write_entry(&entry, Local::now()) {
            tracing::error!(pattern = %self.pattern, error = %e, "Failed to write log file entry");
        }
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
