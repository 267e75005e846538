//! Engine events.
//!
//! The engine emits named events with an optional JSON payload. Only the
//! names in [`EventName`] are recognized; everything else is dropped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngojeeError;

/// Recognized event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventName {
    ServiceConnected,
    AutomationStarted,
    AutomationStopped,
    PostMatched,
    PostLiked,
    CommentPosted,
    Error,
}

impl EventName {
    /// Every recognized name.
    pub const ALL: [Self; 7] = [
        Self::ServiceConnected,
        Self::AutomationStarted,
        Self::AutomationStopped,
        Self::PostMatched,
        Self::PostLiked,
        Self::CommentPosted,
        Self::Error,
    ];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServiceConnected => "serviceConnected",
            Self::AutomationStarted => "automationStarted",
            Self::AutomationStopped => "automationStopped",
            Self::PostMatched => "postMatched",
            Self::PostLiked => "postLiked",
            Self::CommentPosted => "commentPosted",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = EngojeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| EngojeeError::InvalidInput(format!("unknown engine event '{s}'")))
    }
}

/// A decoded engine event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The accessibility service bound to the engine
    ServiceConnected,
    AutomationStarted,
    AutomationStopped,
    /// A post matched the named rule
    PostMatched { rule: String },
    PostLiked,
    /// A reply was posted
    CommentPosted { reply: String },
    /// The engine reported a failure
    Error { message: String },
}

impl EngineEvent {
    #[must_use]
    pub const fn name(&self) -> EventName {
        match self {
            Self::ServiceConnected => EventName::ServiceConnected,
            Self::AutomationStarted => EventName::AutomationStarted,
            Self::AutomationStopped => EventName::AutomationStopped,
            Self::PostMatched { .. } => EventName::PostMatched,
            Self::PostLiked => EventName::PostLiked,
            Self::CommentPosted { .. } => EventName::CommentPosted,
            Self::Error { .. } => EventName::Error,
        }
    }

    /// Build an event from its name and raw payload.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when a required payload field
    /// is missing or not a string.
    pub fn from_payload(name: EventName, payload: &Value) -> Result<Self, String> {
        let field = |key: &str| {
            payload
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| format!("{name} event is missing string field '{key}'"))
        };

        Ok(match name {
            EventName::ServiceConnected => Self::ServiceConnected,
            EventName::AutomationStarted => Self::AutomationStarted,
            EventName::AutomationStopped => Self::AutomationStopped,
            EventName::PostMatched => Self::PostMatched { rule: field("rule")? },
            EventName::PostLiked => Self::PostLiked,
            EventName::CommentPosted => Self::CommentPosted { reply: field("reply")? },
            EventName::Error => Self::Error { message: field("message")? },
        })
    }
}

/// An undecoded emission from the bridge: `{"event": ..., "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "event")]
    pub name: String,
    #[serde(rename = "data", default)]
    pub payload: Value,
}

impl RawEvent {
    #[must_use]
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}
