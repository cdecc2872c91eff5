//! Plain loggers.

use std::sync::Arc;

use serde_json::Value;

use crate::backend::Backend;
use crate::level::Level;
use crate::live::LiveLogger;
use crate::shared::SharedLogger;

/// Level-named convenience methods over a single `log` entry point.
pub trait Log {
    fn log(&self, level: Level, message: &str, data: Option<&Value>);

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message, None);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message, None);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message, None);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message, None);
    }

    fn fatal(&self, message: &str) {
        self.log(Level::Fatal, message, None);
    }
}

/// Join two namespace segments with `/`, skipping empty ones.
pub fn join_keys(parent: Option<&str>, child: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [parent, child]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// A logger bound to a fixed namespace prefix.
#[derive(Clone)]
pub struct Logger {
    backend: Arc<dyn Backend>,
    prefix: Option<String>,
}

impl Logger {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            prefix: None,
        }
    }

    pub fn with_prefix(backend: Arc<dyn Backend>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            backend,
            prefix: (!prefix.is_empty()).then_some(prefix),
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Child logger whose prefix is `<prefix>/<key>`.
    pub fn service(&self, key: &str) -> Logger {
        Logger {
            backend: Arc::clone(&self.backend),
            prefix: join_keys(self.prefix(), Some(key)),
        }
    }

    /// Live logger on a fresh region, keeping this logger's prefix.
    pub fn live(&self) -> LiveLogger {
        LiveLogger::new(Arc::clone(&self.backend), self.prefix.clone())
    }

    /// Logger whose namespace is chosen per call, under this prefix.
    pub fn shared(&self) -> SharedLogger {
        SharedLogger::new(Arc::clone(&self.backend), self.prefix.clone())
    }
}

impl Log for Logger {
    fn log(&self, level: Level, message: &str, data: Option<&Value>) {
        self.backend.write(self.prefix(), level, message, data);
    }
}
