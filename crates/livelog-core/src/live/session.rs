//! Reentrant live session.
//!
//! A [`LiveSession`] wraps one live region with a nesting counter. Any number
//! of overlapping "update" scopes can share the region: the backend hears
//! about the update only when the first scope opens (depth 0→1) and when the
//! last one closes (depth 1→0). The first write of an update replaces the
//! region's content and later writes of the same update are added below it.
//! A logger that logs from inside another log's rendering scope therefore
//! keeps writing into the same visible region.
//!
//! Every write names the session's region explicitly, so sessions running
//! on different threads over one backend never see each other's lines.
//!
//! When the backend cannot create live regions the session still counts
//! scopes, but never calls the backend's live hooks, so every write is a plain
//! sequential write.

use std::sync::Arc;

use parking_lot::Mutex;

use serde_json::Value;

use crate::backend::{Backend, LiveRegion};
use crate::level::Level;

#[derive(Debug, Default)]
struct SessionState {
    depth: usize,
    closed: bool,
    /// No write has landed since the update began
    fresh: bool,
}

/// A live region shared by nested update scopes.
pub struct LiveSession {
    backend: Arc<dyn Backend>,
    region: Option<Arc<dyn LiveRegion>>,
    state: Mutex<SessionState>,
}

impl LiveSession {
    /// Create a session on a fresh region from `backend`.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let region = backend.create_live();
        Self::with_region(backend, region)
    }

    /// Create a session on an existing region (or none, for plain output).
    pub fn with_region(backend: Arc<dyn Backend>, region: Option<Arc<dyn LiveRegion>>) -> Self {
        Self {
            backend,
            region,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn region(&self) -> Option<&Arc<dyn LiveRegion>> {
        self.region.as_ref()
    }

    /// Whether writes in a scope actually land in a live region.
    pub fn is_live(&self) -> bool {
        self.region.is_some()
    }

    /// Number of open update scopes.
    pub fn depth(&self) -> usize {
        self.state.lock().depth
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Open an update scope. No-op once the session is closed.
    pub fn begin_update(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }

        state.depth += 1;
        if state.depth == 1 {
            state.fresh = true;
            if let Some(region) = &self.region {
                self.backend.begin_live(region);
            }
        }
    }

    /// Close an update scope. Unbalanced calls at depth 0 are ignored.
    pub fn end_update(&self) {
        let mut state = self.state.lock();
        if state.depth == 0 {
            return;
        }

        state.depth -= 1;
        if state.depth == 0 {
            if let Some(region) = &self.region {
                self.backend.end_live(region);
            }
        }
    }

    /// Run `f` inside an update scope.
    ///
    /// The scope is closed on every exit path, including a panic in `f`.
    pub fn run_scoped<R>(&self, f: impl FnOnce() -> R) -> R {
        self.begin_update();
        let _scope = ScopeGuard(self);
        f()
    }

    /// Write one event into the region inside its own update scope.
    ///
    /// Without a region, or once the session is closed, the event is written
    /// as a plain line.
    pub fn write(&self, key: Option<&str>, level: Level, message: &str, data: Option<&Value>) {
        self.run_scoped(|| self.emit(key, level, message, data));
    }

    fn emit(&self, key: Option<&str>, level: Level, message: &str, data: Option<&Value>) {
        let Some(region) = &self.region else {
            self.backend.write(key, level, message, data);
            return;
        };

        let mut state = self.state.lock();
        if state.closed {
            drop(state);
            self.backend.write(key, level, message, data);
            return;
        }

        // Held across the write so replace-then-append stays ordered.
        let replace = std::mem::take(&mut state.fresh);
        self.backend.write_live(region, replace, key, level, message, data);
    }

    /// Clear the region's content, activating the region first if needed.
    pub fn clear(&self) {
        let Some(region) = &self.region else {
            return;
        };

        if self.depth() == 0 {
            self.run_scoped(|| self.backend.clear(region));
        } else {
            self.backend.clear(region);
        }
    }

    /// Close the underlying region immediately, whatever the depth.
    ///
    /// Open scopes are abandoned: the depth is forced to zero (handing output
    /// back to the backend's plain sink if a scope was open) and later
    /// `end_update` calls are no-ops. Closing twice does nothing.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }

        state.closed = true;
        let abandoned = std::mem::take(&mut state.depth);

        if let Some(region) = &self.region {
            if abandoned > 0 {
                tracing::debug!(depth = abandoned, "Closing live session with open scopes");
                self.backend.end_live(region);
            }
            region.close();
        }
    }
}

struct ScopeGuard<'a>(&'a LiveSession);

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.0.end_update();
    }
}
