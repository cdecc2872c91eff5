//! Log destinations.
//!
//! A [`Backend`] receives fully-resolved log events. Live rendering is an
//! optional capability: every live hook has a default, and a backend that
//! cannot render live regions simply returns `None` from
//! [`Backend::create_live`], in which case live loggers degrade to plain
//! sequential writes.
//!
//! ## Implementations
//!
//! - [`ConsoleBackend`]: formatted, colored lines on a [`Terminal`]
//! - [`FileBackend`]: JSONL files with a date-based path pattern
//! - [`MultiBackend`]: fan-out to several backends
//! - [`FilterBackend`]: predicate-list gate in front of another backend

pub mod console;
pub mod entry;
pub mod file;
pub mod filter;
pub mod multi;
pub mod terminal;

#[cfg(test)]
pub(crate) mod recording;

use std::sync::Arc;

use serde_json::Value;

use crate::level::Level;

pub use console::ConsoleBackend;
pub use entry::JsonLogEntry;
pub use file::FileBackend;
pub use filter::FilterBackend;
pub use multi::MultiBackend;
pub use terminal::{Terminal, TerminalRegion};

/// An updatable block of terminal output.
///
/// Implementations must tolerate any call order; what happens after
/// [`LiveRegion::close`] is implementation defined.
pub trait LiveRegion: Send + Sync {
    /// Replace the region's content.
    fn write(&self, text: &str);

    /// Add a line below the region's current content.
    fn append(&self, text: &str);

    /// Remove the region's content, keeping the region open.
    fn clear(&self);

    /// Keep the region below all unpinned regions.
    fn pin(&self);

    fn unpin(&self);

    /// Stop updating the region; its last content becomes permanent output.
    fn close(&self);
}

/// A log destination.
///
/// Live output is routed per call: every hook that touches a region receives
/// it explicitly, so sessions on different threads never share routing state.
pub trait Backend: Send + Sync {
    /// Write one event. `key` is the hierarchical namespace, if any.
    fn write(&self, key: Option<&str>, level: Level, message: &str, data: Option<&Value>);

    /// Write one event into `region`. With `replace`, the event replaces the
    /// region's content; otherwise it is added below it.
    ///
    /// Backends that cannot render into the region write a plain event.
    fn write_live(
        &self,
        _region: &Arc<dyn LiveRegion>,
        _replace: bool,
        key: Option<&str>,
        level: Level,
        message: &str,
        data: Option<&Value>,
    ) {
        self.write(key, level, message, data);
    }

    /// Create a new live region, or `None` when live rendering is unsupported.
    fn create_live(&self) -> Option<Arc<dyn LiveRegion>> {
        None
    }

    /// `region` starts receiving an update (its first open scope).
    fn begin_live(&self, _region: &Arc<dyn LiveRegion>) {}

    /// `region` finished its update (its last scope closed).
    fn end_live(&self, _region: &Arc<dyn LiveRegion>) {}

    /// Clear `region`'s content.
    fn clear(&self, region: &Arc<dyn LiveRegion>) {
        region.clear();
    }
}
