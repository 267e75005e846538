//! Activity log.
//!
//! Keeps a short, newest-first history of what the engine reported and what
//! the user asked it to do.

mod log;

pub use log::{describe_event, ActivityLog, LogEntry, LogTone, DEFAULT_CAPACITY};
