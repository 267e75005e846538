//! Bounded activity log.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::features::automation::EngineEvent;

/// Entries kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 50;

/// How an entry should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTone {
    /// Errors and failed requests
    Failure,
    /// Engine came up or started
    Success,
    /// A post was matched or answered
    Highlight,
    /// Everything else
    Muted,
}

impl LogTone {
    /// Classify a log message by its wording.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        if message.contains("Error") || message.contains("Failed") {
            Self::Failure
        } else if message.contains("started") || message.contains("connected") {
            Self::Success
        } else if message.contains("matched") || message.contains("posted") {
            Self::Highlight
        } else {
            Self::Muted
        }
    }
}

/// One line of the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub id: u64,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl LogEntry {
    #[must_use]
    pub fn tone(&self) -> LogTone {
        LogTone::classify(&self.message)
    }

    /// Wall-clock time of the entry, `HH:MM:SS`.
    #[must_use]
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Newest-first log holding at most `capacity` entries.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_id: u64,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ActivityLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log keeping at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 0,
        }
    }

    /// Add a message, dropping the oldest entry when full.
    pub fn push(&mut self, message: impl Into<String>) -> &LogEntry {
        self.next_id += 1;
        self.entries.push_front(LogEntry {
            id: self.next_id,
            message: message.into(),
            timestamp: Local::now(),
        });
        self.entries.truncate(self.capacity);
        &self.entries[0]
    }

    /// Add the log line for an engine event.
    pub fn record_event(&mut self, event: &EngineEvent) -> &LogEntry {
        self.push(describe_event(event))
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Log line for an engine event.
#[must_use]
pub fn describe_event(event: &EngineEvent) -> String {
    match event {
        EngineEvent::ServiceConnected => "Accessibility service connected".to_string(),
        EngineEvent::AutomationStarted => "Automation started".to_string(),
        EngineEvent::AutomationStopped => "Automation stopped".to_string(),
        EngineEvent::PostMatched { rule } => format!("Post matched rule: {rule}"),
        EngineEvent::PostLiked => "Post liked".to_string(),
        EngineEvent::CommentPosted { reply } => format!("Comment posted: {reply}"),
        EngineEvent::Error { message } => format!("Error: {message}"),
    }
}
