use std::sync::Arc;

use serde_json::Value;

use super::logger::LiveLogger;
use super::session::LiveSession;
use crate::backend::Backend;
use crate::level::Level;
use crate::logger::join_keys;
use crate::shared::{SharedLog, SharedLogger};

/// Per-call-namespace logger writing into one live region.
#[derive(Clone)]
pub struct LiveSharedLogger {
    session: Arc<LiveSession>,
    prefix: Option<String>,
}

impl LiveSharedLogger {
    pub fn new(backend: Arc<dyn Backend>, prefix: Option<String>) -> Self {
        Self::from_session(Arc::new(LiveSession::new(backend)), prefix)
    }

    pub fn from_session(session: Arc<LiveSession>, prefix: Option<String>) -> Self {
        Self { session, prefix }
    }

    pub fn session(&self) -> &Arc<LiveSession> {
        &self.session
    }

    /// Fixed-namespace live logger on the same region.
    pub fn service(&self, key: &str) -> LiveLogger {
        let prefix = join_keys(self.prefix.as_deref(), Some(key));
        LiveLogger::from_session(Arc::clone(&self.session), prefix)
    }

    /// Plain shared logger on the same backend.
    pub fn plain(&self) -> SharedLogger {
        SharedLogger::new(Arc::clone(self.session.backend()), self.prefix.clone())
    }

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

impl SharedLog for LiveSharedLogger {
    fn log(&self, key: &str, level: Level, message: &str, data: Option<&Value>) {
        let key = join_keys(self.prefix.as_deref(), Some(key));
        self.session.write(key.as_deref(), level, message, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::RecordingBackend;
    use crate::logger::Log;

    #[test]
    fn test_shared_and_service_use_one_region() {
        let backend = RecordingBackend::new();
        let shared = LiveSharedLogger::new(backend.clone(), None);

        shared.update(|| {
            shared.info("poll", "waiting");
            shared.service("poll").info("done");
        });

        let events = backend.events.lock();
        assert!(events.iter().all(|e| e.region == Some(0)));
        assert_eq!(events[1].key.as_deref(), Some("poll"));
        assert_eq!(backend.begins(), 1);
    }

    #[test]
    fn test_plain_writes_outside_region() {
        let backend = RecordingBackend::new();
        let shared = LiveSharedLogger::new(backend.clone(), Some("api".into()));

        shared.plain().info("x", "plain");

        assert_eq!(backend.events.lock()[0].region, None);
        assert_eq!(backend.events.lock()[0].key.as_deref(), Some("api/x"));
    }
}
