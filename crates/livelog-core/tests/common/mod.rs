//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use livelog_core::backend::file::strip_ansi;
use livelog_core::{Backend, Level, LiveRegion};
use parking_lot::Mutex;
use serde_json::Value;

/// In-memory terminal output
#[derive(Clone, Default)]
pub struct Screen(Arc<Mutex<Vec<u8>>>);

impl Screen {
    pub fn text(&self) -> String {
        strip_ansi(&String::from_utf8_lossy(&self.0.lock()))
    }
}

impl Write for Screen {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A live region that records what it was asked to do.
#[derive(Default)]
pub struct TestRegion {
    pub id: usize,
    pub lines: Mutex<Vec<String>>,
    pub closes: AtomicUsize,
}

impl TestRegion {
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl LiveRegion for TestRegion {
    fn write(&self, text: &str) {
        *self.lines.lock() = vec![text.to_string()];
    }

    fn append(&self, text: &str) {
        self.lines.lock().push(text.to_string());
    }

    fn clear(&self) {
        self.lines.lock().clear();
    }

    fn pin(&self) {}

    fn unpin(&self) {}

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// One write seen by a [`TestBackend`].
#[derive(Debug, Clone)]
pub struct Written {
    pub key: Option<String>,
    pub level: Level,
    pub message: String,
    pub data: Option<Value>,
    /// Region the write was addressed to
    pub region: Option<usize>,
}

/// Backend recording writes and live-region traffic.
#[derive(Default)]
pub struct TestBackend {
    pub written: Mutex<Vec<Written>>,
    pub regions: Mutex<Vec<Arc<TestRegion>>>,
    pub begins: AtomicUsize,
    pub ends: AtomicUsize,
}

impl TestBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.written.lock().iter().map(|w| w.message.clone()).collect()
    }

    pub fn region(&self, id: usize) -> Arc<TestRegion> {
        Arc::clone(&self.regions.lock()[id])
    }

    pub fn region_count(&self) -> usize {
        self.regions.lock().len()
    }

    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn ends(&self) -> usize {
        self.ends.load(Ordering::SeqCst)
    }

    fn id_of(&self, region: &Arc<dyn LiveRegion>) -> Option<usize> {
        self.regions
            .lock()
            .iter()
            .find(|r| std::ptr::addr_eq(Arc::as_ptr(*r), Arc::as_ptr(region)))
            .map(|r| r.id)
    }

    fn record(
        &self,
        region: Option<usize>,
        key: Option<&str>,
        level: Level,
        message: &str,
        data: Option<&Value>,
    ) {
        self.written.lock().push(Written {
            key: key.map(str::to_string),
            level,
            message: message.to_string(),
            data: data.cloned(),
            region,
        });
    }
}

impl Backend for TestBackend {
    fn write(&self, key: Option<&str>, level: Level, message: &str, data: Option<&Value>) {
        self.record(None, key, level, message, data);
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
        let id = self.id_of(region);
        if id.is_some() {
            if replace {
                region.write(message);
            } else {
                region.append(message);
            }
        }
        self.record(id, key, level, message, data);
    }

    fn create_live(&self) -> Option<Arc<dyn LiveRegion>> {
        let mut regions = self.regions.lock();
        let region = Arc::new(TestRegion {
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
}
