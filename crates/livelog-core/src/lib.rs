//! livelog core library
//!
//! Structured, namespaced logging with live-updating terminal regions.
//!
//! ## Overview
//!
//! Events carry a severity [`Level`] and a hierarchical key (`api/users`) and
//! are written to a [`Backend`]. Backends compose: a [`FilterBackend`] gates
//! events through an ordered list of filter [`Predicate`]s, a
//! [`MultiBackend`] fans out to several destinations.
//!
//! Live loggers write into a region that updates in place instead of
//! scrolling. Regions are reentrant ([`LiveSession`]): nested writes share
//! one region and it is torn down only when the outermost scope ends.
//!
//! An [`ActivityTracker`] renders begin/end lines for activities such as HTTP
//! requests. Activities matching a registered high-frequency pattern share a
//! pooled region per key, reclaimed after an idle timeout, so a polling
//! endpoint hit every second occupies one line instead of thousands.
//!
//! ## Quick Start
//!
//! ```ignore
//! use livelog_core::{HttpRequestTracker, Log, LogConfig, Logger};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_json_str(r#"{ "filters": [">=info"] }"#)?;
//!     let logger = Logger::new(config.build_backend()?);
//!     logger.service("startup").info("listening on :8080");
//!
//!     let http = HttpRequestTracker::http(logger.service("http"));
//!     http.register_pattern(r"^/poll/(\w+)$", None, None)?;
//!
//!     let request = http.begin_request("GET", "/poll/abc");
//!     http.finish_request(request, 200);
//!     Ok(())
//! }
//! ```

pub mod activity;
pub mod backend;
pub mod config;
pub mod error;
pub mod filter;
pub mod layer;
pub mod level;
pub mod live;
pub mod logger;
pub mod shared;

// Re-exports
pub use activity::{
    ActivityKind, ActivityTracker, HttpActivity, HttpRequestTracker, HttpRequests, Keyer,
    PatternDescriptor, PatternPool, Tracked,
};
pub use backend::{
    Backend, ConsoleBackend, FileBackend, FilterBackend, LiveRegion, MultiBackend, Terminal,
};
pub use config::LogConfig;
pub use error::{LogError, LogResult};
pub use filter::{evaluate, Comparison, NamespacePattern, Predicate};
pub use layer::BackendLayer;
pub use level::Level;
pub use live::{LiveLogger, LiveSession, LiveSharedLogger};
pub use logger::{Log, Logger};
pub use shared::{SharedLog, SharedLogger};
