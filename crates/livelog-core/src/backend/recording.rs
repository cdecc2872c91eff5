//! Recording backend for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use super::{Backend, LiveRegion};
use crate::level::Level;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Recorded {
    pub key: Option<String>,
    pub level: Level,
    pub message: String,
    pub data: Option<Value>,
    /// Id of the live region the write was addressed to
    pub region: Option<usize>,
    pub replace: bool,
}

#[derive(Default)]
pub(crate) struct RecordingRegion {
    pub id: usize,
    pub lines: Mutex<Vec<String>>,
    pub closes: AtomicUsize,
    pub pinned: Mutex<bool>,
}

impl LiveRegion for RecordingRegion {
    fn write(&self, text: &str) {
        *self.lines.lock() = vec![text.to_string()];
    }

    fn append(&self, text: &str) {
        self.lines.lock().push(text.to_string());
    }

    fn clear(&self) {
        self.lines.lock().clear();
    }

    fn pin(&self) {
        *self.pinned.lock() = true;
    }

    fn unpin(&self) {
        *self.pinned.lock() = false;
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct RecordingBackend {
    pub events: Mutex<Vec<Recorded>>,
    pub regions: Mutex<Vec<Arc<RecordingRegion>>>,
    pub begins: AtomicUsize,
    pub ends: AtomicUsize,
    pub clears: AtomicUsize,
    /// When false, `create_live` returns `None`
    pub live_capable: bool,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            live_capable: true,
            ..Default::default()
        })
    }

    pub fn without_live() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn region(&self, id: usize) -> Arc<RecordingRegion> {
        Arc::clone(&self.regions.lock()[id])
    }

    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn ends(&self) -> usize {
        self.ends.load(Ordering::SeqCst)
    }
}

impl RecordingBackend {
    fn record(
        &self,
        region: Option<usize>,
        replace: bool,
        key: Option<&str>,
        level: Level,
        message: &str,
        data: Option<&Value>,
    ) {
        self.events.lock().push(Recorded {
            key: key.map(str::to_string),
            level,
            message: message.to_string(),
            data: data.cloned(),
            region,
            replace,
        });
    }
}

impl Backend for RecordingBackend {
    fn write(&self, key: Option<&str>, level: Level, message: &str, data: Option<&Value>) {
        self.record(None, false, key, level, message, data);
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
        let id = self
            .regions
            .lock()
            .iter()
            .find(|r| std::ptr::addr_eq(Arc::as_ptr(*r), Arc::as_ptr(region)))
            .map(|r| r.id);
        if id.is_some() {
            if replace {
                region.write(message);
            } else {
                region.append(message);
            }
        }
        self.record(id, replace, key, level, message, data);
    }

    fn create_live(&self) -> Option<Arc<dyn LiveRegion>> {
        if !self.live_capable {
            return None;
        }
        let mut regions = self.regions.lock();
        let region = Arc::new(RecordingRegion {
            id: regions.len(),
            ..Default::default()
        });
        regions.push(Arc::clone(&region));
        Some(region)
    }

    fn begin_live(&self, _region: &Arc<dyn LiveRegion>) {
        self.begins.fetch_add(1, Ordering::SeqCst);
    }

    fn end_live(&self, _region: &Arc<dyn LiveRegion>) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }

    fn clear(&self, region: &Arc<dyn LiveRegion>) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        region.clear();
    }
}
