//! Log entry type for the JSONL file backend.
//!
//! Each entry is a self-contained JSON object written on its own line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::level::Level;

/// A single log entry in JSONL format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonLogEntry {
    /// ISO 8601 timestamp (e.g., "2026-01-21T14:30:45.123Z")
    pub timestamp: String,

    pub level: Level,

    /// Hierarchical key (e.g., "http/poll")
    pub key: Option<String>,

    /// Message with terminal escape sequences removed
    pub message: String,

    /// Optional structured payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonLogEntry {
    /// Create a new log entry with the current timestamp.
    pub fn new(key: Option<&str>, level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            level,
            key: key.map(str::to_string),
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data to the entry.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Serialize to a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from a JSON line.
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
