//! Loggers whose namespace is chosen per call.

use std::sync::Arc;

use serde_json::Value;

use crate::backend::Backend;
use crate::level::Level;
use crate::live::LiveSharedLogger;
use crate::logger::{join_keys, Logger};

/// Level-named methods over a `log` that takes the namespace per call.
pub trait SharedLog {
    fn log(&self, key: &str, level: Level, message: &str, data: Option<&Value>);

    fn debug(&self, key: &str, message: &str) {
        self.log(key, Level::Debug, message, None);
    }

    fn info(&self, key: &str, message: &str) {
        self.log(key, Level::Info, message, None);
    }

    fn warn(&self, key: &str, message: &str) {
        self.log(key, Level::Warn, message, None);
    }

    fn error(&self, key: &str, message: &str) {
        self.log(key, Level::Error, message, None);
    }

    fn fatal(&self, key: &str, message: &str) {
        self.log(key, Level::Fatal, message, None);
    }
}

/// One logger serving many namespaces under a common prefix.
#[derive(Clone)]
pub struct SharedLogger {
    backend: Arc<dyn Backend>,
    prefix: Option<String>,
}

impl SharedLogger {
    pub fn new(backend: Arc<dyn Backend>, prefix: Option<String>) -> Self {
        Self { backend, prefix }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Fixed-namespace logger for `key`.
    pub fn service(&self, key: &str) -> Logger {
        match join_keys(self.prefix(), Some(key)) {
            Some(prefix) => Logger::with_prefix(Arc::clone(&self.backend), prefix),
            None => Logger::new(Arc::clone(&self.backend)),
        }
    }

    pub fn live(&self) -> LiveSharedLogger {
        LiveSharedLogger::new(Arc::clone(&self.backend), self.prefix.clone())
    }
}

impl SharedLog for SharedLogger {
    fn log(&self, key: &str, level: Level, message: &str, data: Option<&Value>) {
        let key = join_keys(self.prefix(), Some(key));
        self.backend.write(key.as_deref(), level, message, data);
    }
}
