use std::sync::Arc;

use serde_json::Value;

use super::session::LiveSession;
use super::shared::LiveSharedLogger;
use crate::backend::Backend;
use crate::level::Level;
use crate::logger::{join_keys, Log, Logger};

/// A logger whose writes land in one updatable region.
///
/// Clones and [`LiveLogger::service`] children share the same session, so
/// output from any of them appears in the same region.
#[derive(Clone)]
pub struct LiveLogger {
    session: Arc<LiveSession>,
    prefix: Option<String>,
}

impl LiveLogger {
    /// Live logger on a fresh region from `backend`.
    pub fn new(backend: Arc<dyn Backend>, prefix: Option<String>) -> Self {
        Self::from_session(Arc::new(LiveSession::new(backend)), prefix)
    }

    pub fn from_session(session: Arc<LiveSession>, prefix: Option<String>) -> Self {
        Self { session, prefix }
    }

    pub fn session(&self) -> &Arc<LiveSession> {
        &self.session
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Child live logger on the same region, prefixed `<prefix>/<key>`.
    pub fn service(&self, key: &str) -> LiveLogger {
        LiveLogger {
            session: Arc::clone(&self.session),
            prefix: join_keys(self.prefix(), Some(key)),
        }
    }

    /// Per-call-namespace logger on the same region.
    pub fn shared(&self) -> LiveSharedLogger {
        LiveSharedLogger::from_session(Arc::clone(&self.session), self.prefix.clone())
    }

    /// Plain logger on the same backend, bypassing the region.
    pub fn plain(&self) -> Logger {
        match &self.prefix {
            Some(prefix) => Logger::with_prefix(Arc::clone(self.session.backend()), prefix.clone()),
            None => Logger::new(Arc::clone(self.session.backend())),
        }
    }

    /// Open an update scope; see [`LiveSession::begin_update`].
    pub fn begin(&self) {
        self.session.begin_update();
    }

    pub fn end(&self) {
        self.session.end_update();
    }

    /// Run `f` with every write it makes routed into the region.
    pub fn update<R>(&self, f: impl FnOnce() -> R) -> R {
        self.session.run_scoped(f)
    }

    pub fn clear(&self) {
        self.session.clear();
    }

    pub fn close(&self) {
        self.session.close();
    }
}

impl Log for LiveLogger {
    fn log(&self, level: Level, message: &str, data: Option<&Value>) {
        self.session.write(self.prefix(), level, message, data);
    }
}
