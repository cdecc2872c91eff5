//! Live (in-place updating) logging.
//!
//! - [`LiveSession`]: reentrant scope counter around one live region
//! - [`LiveLogger`]: fixed-namespace logger writing into a session
//! - [`LiveSharedLogger`]: per-call-namespace logger writing into a session

mod logger;
mod session;
mod shared;

pub use logger::LiveLogger;
pub use session::LiveSession;
pub use shared::LiveSharedLogger;
