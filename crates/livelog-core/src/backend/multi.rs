//! Fan-out backend.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use super::{Backend, LiveRegion};
use crate::level::Level;

/// Writes every event to each child backend, in order.
///
/// Live regions come from the first child able to create one; live writes
/// and hooks are broadcast to every child.
pub struct MultiBackend {
    backends: RwLock<Vec<Arc<dyn Backend>>>,
    active: Mutex<Vec<Arc<dyn LiveRegion>>>,
}

impl MultiBackend {
    pub fn new(backends: impl IntoIterator<Item = Arc<dyn Backend>>) -> Self {
        Self {
            backends: RwLock::new(backends.into_iter().collect()),
            active: Mutex::new(Vec::new()),
        }
    }

    /// Add a child. The child is told to begin every region currently in
    /// an update.
    pub fn add_backend(&self, backend: Arc<dyn Backend>) {
        for region in self.active.lock().iter() {
            backend.begin_live(region);
        }
        self.backends.write().push(backend);
    }

    pub fn len(&self) -> usize {
        self.backends.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.read().is_empty()
    }
}

impl Backend for MultiBackend {
    fn write(&self, key: Option<&str>, level: Level, message: &str, data: Option<&Value>) {
        for backend in self.backends.read().iter() {
            backend.write(key, level, message, data);
        }
    }

    fn write_live(
        &self,
        region: &Arc<dyn LiveRegion>,
        replace: bool,
        key: Option<&str>,
        level: Level,
        message: &str,
        data: Option<&Value>,
    ) {
        for backend in self.backends.read().iter() {
            backend.write_live(region, replace, key, level, message, data);
        }
    }

    fn create_live(&self) -> Option<Arc<dyn LiveRegion>> {
        self.backends.read().iter().find_map(|b| b.create_live())
    }

    fn begin_live(&self, region: &Arc<dyn LiveRegion>) {
        self.active.lock().push(Arc::clone(region));
        for backend in self.backends.read().iter() {
            backend.begin_live(region);
        }
    }

    fn end_live(&self, region: &Arc<dyn LiveRegion>) {
        self.active.lock().retain(|r| !Arc::ptr_eq(r, region));
        for backend in self.backends.read().iter() {
            backend.end_live(region);
        }
    }

    fn clear(&self, region: &Arc<dyn LiveRegion>) {
        for backend in self.backends.read().iter() {
            backend.clear(region);
        }
    }
}
