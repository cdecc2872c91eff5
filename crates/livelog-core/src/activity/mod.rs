//! Activity tracking.
//!
//! An [`ActivityTracker`] renders the begin and end of each activity into a
//! live area. Activities matching a high-frequency pattern registered on the
//! tracker's [`PatternPool`] share a pooled area per key, so a burst of
//! similar activities updates one region instead of flooding the output.

pub mod http;
pub mod pool;
pub mod tracker;

pub use http::{HttpActivity, HttpRequestTracker, HttpRequests};
pub use pool::{Keyer, PatternDescriptor, PatternPool, DEFAULT_MAX_IDLE};
pub use tracker::{ActivityKind, ActivityTracker, SkipFn, Tracked};
