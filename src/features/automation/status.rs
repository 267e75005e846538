//! Engine status as reported by the bridge.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Observed engine state.
///
/// The engine moves `disabled -> connected -> running -> connected`, resting
/// in `stopped` when enabled but idle. This crate only reads the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Accessibility permission not granted
    Disabled,
    /// Enabled, not processing
    Stopped,
    /// Accessibility service bound, not processing
    Connected,
    /// Processing posts
    Running,
}

impl ServiceStatus {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Stopped => "stopped",
            Self::Connected => "connected",
            Self::Running => "running",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Disabled => "Service Disabled",
            Self::Stopped => "Service Stopped",
            Self::Connected => "Service Connected",
            Self::Running => "Service Running",
        }
    }

    /// Read a status reported by the engine.
    ///
    /// Anything outside the four known states reads as `Stopped`.
    #[must_use]
    pub fn from_engine(raw: &str) -> Self {
        match raw {
            "disabled" => Self::Disabled,
            "stopped" => Self::Stopped,
            "connected" => Self::Connected,
            "running" => Self::Running,
            other => {
                tracing::warn!(status = other, "unknown engine status, treating as stopped");
                Self::Stopped
            }
        }
    }

    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_engine(s))
    }
}
