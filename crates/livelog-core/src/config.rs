//! Logging configuration.
//!
//! A [`LogConfig`] describes destinations, filter rules and high-frequency
//! patterns. It is usually loaded from JSON; every field has a default, so
//! `{}` is a valid configuration (colored console output, no filtering).
//!
//! ```json
//! {
//!   "filters": [">=info", "!debug[http/*]"],
//!   "console": { "timestamp_format": "%H:%M:%S" },
//!   "file": { "path_pattern": "logs/{YYYY}-{MM}-{DD}.jsonl" },
//!   "high_frequency": {
//!     "max_idle_secs": 30,
//!     "patterns": [{ "pattern": "^/poll/(\\w+)$" }]
//!   }
//! }
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::activity::{ActivityKind, ActivityTracker, PatternDescriptor};
use crate::backend::{Backend, ConsoleBackend, FileBackend, FilterBackend, MultiBackend};
use crate::error::{LogError, LogResult};
use crate::filter::Predicate;

/// Environment variable holding comma-separated filter rules.
pub const FILTER_ENV: &str = "LIVELOG_FILTER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter rules, evaluated in order
    pub filters: Vec<String>,
    /// Whether an empty rule list lets everything through
    pub allow_empty: bool,
    pub console: ConsoleConfig,
    pub file: Option<FileConfig>,
    pub high_frequency: HighFrequencyConfig,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            allow_empty: true,
            console: ConsoleConfig::default(),
            file: None,
            high_frequency: HighFrequencyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// `chrono` format for a line prefix; no timestamp when absent
    pub timestamp_format: Option<String>,
    pub colors: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timestamp_format: None,
            colors: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Path with `{YYYY}`, `{YY}`, `{MM}`, `{M}`, `{DD}`, `{D}` placeholders
    pub path_pattern: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighFrequencyConfig {
    /// Idle seconds before an unheld pooled area is closed
    pub max_idle_secs: u64,
    pub patterns: Vec<PatternConfig>,
}

impl Default for HighFrequencyConfig {
    fn default() -> Self {
        Self {
            max_idle_secs: 60,
            patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Regular expression over the activity shape
    pub pattern: String,
    #[serde(default)]
    pub max_idle_secs: Option<u64>,
}

impl LogConfig {
    pub fn from_json_str(json: &str) -> LogResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> LogResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        debug!(path = %path.display(), "Loaded log configuration");
        Ok(config)
    }

    /// Replace the filter rules with those in `LIVELOG_FILTER`, if set.
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(FILTER_ENV) {
            self.override_filters(&value);
        }
    }

    /// Replace the filter rules with the comma-separated rules in `value`.
    pub fn override_filters(&mut self, value: &str) {
        self.filters = value
            .split(',')
            .map(str::trim)
            .filter(|rule| !rule.is_empty())
            .map(str::to_string)
            .collect();
    }

    /// Parse the filter rules, skipping (and reporting) malformed ones.
    pub fn predicates(&self) -> LogResult<Vec<Predicate>> {
        let mut predicates = Vec::with_capacity(self.filters.len());
        for rule in &self.filters {
            match Predicate::try_parse(rule)? {
                Some(predicate) => predicates.push(predicate),
                None => warn!(%rule, "Skipping malformed filter rule"),
            }
        }
        Ok(predicates)
    }

    /// Build the configured destinations behind a filter backend.
    pub fn build_backend(&self) -> LogResult<Arc<dyn Backend>> {
        let mut destinations: Vec<Arc<dyn Backend>> = Vec::new();

        if self.console.enabled {
            let mut console = ConsoleBackend::stdout().with_colors(self.console.colors);
            if let Some(format) = &self.console.timestamp_format {
                console = console.with_timestamp(format.clone());
            }
            destinations.push(Arc::new(console));
        }

        if let Some(file) = &self.file {
            destinations.push(Arc::new(FileBackend::new(file.path_pattern.clone())));
        }

        let base: Arc<dyn Backend> = match destinations.len() {
            0 => return Err(LogError::Config("no log destination enabled".to_string())),
            1 => destinations.remove(0),
            _ => Arc::new(MultiBackend::new(destinations)),
        };

        let filter = FilterBackend::new(base, self.predicates()?);
        filter.set_allow_empty(self.allow_empty);
        Ok(Arc::new(filter))
    }

    pub fn default_max_idle(&self) -> Duration {
        Duration::from_secs(self.high_frequency.max_idle_secs)
    }

    /// Register the configured high-frequency patterns on `tracker`, in order.
    pub fn apply_patterns<K: ActivityKind>(
        &self,
        tracker: &ActivityTracker<K>,
    ) -> LogResult<Vec<Arc<PatternDescriptor>>> {
        tracker.pool().set_default_max_idle(self.default_max_idle());

        self.high_frequency
            .patterns
            .iter()
            .map(|p| {
                let max_idle = p.max_idle_secs.map(Duration::from_secs);
                tracker.register_pattern(&p.pattern, None, max_idle)
            })
            .collect()
    }
}
