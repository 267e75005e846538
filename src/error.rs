//! Error types for engojee.

use thiserror::Error;

/// Errors surfaced by the rule store, the engine facade and the CLI.
#[derive(Debug, Error)]
pub enum EngojeeError {
    /// The persisted rule collection exists but could not be read or decoded.
    #[error("Failed to read rules: {0}")]
    StorageRead(String),

    /// The key-value medium rejected a write.
    #[error("Failed to save rules: {0}")]
    StorageWrite(String),

    /// An update targeted an id that is not in the collection.
    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    /// The engine refused to start, or the bridge call failed.
    #[error("Failed to start service: {0}")]
    ServiceStart(String),

    /// The engine refused to stop, or the bridge call failed.
    #[error("Failed to stop service: {0}")]
    ServiceStop(String),

    /// The platform could not show the accessibility settings screen.
    #[error("Failed to open accessibility settings: {0}")]
    SettingsUnavailable(String),

    /// Any other bridge failure.
    #[error("Engine bridge call failed: {0}")]
    BridgeCall(String),

    /// Editor input rejected before reaching the store.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Start was requested with an empty rule set.
    #[error("No rules: please create at least one rule before starting the service")]
    NoRules,

    /// Malformed caller input (route parameters, CLI flags).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be resolved, read or written.
    #[error("Configuration error: {0}")]
    Config(String),

    /// `SQLite` failure below the key-value layer.
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl EngojeeError {
    /// Whether the error came from the engine side of the bridge.
    #[must_use]
    pub const fn is_engine_error(&self) -> bool {
        matches!(
            self,
            Self::ServiceStart(_)
                | Self::ServiceStop(_)
                | Self::SettingsUnavailable(_)
                | Self::BridgeCall(_)
        )
    }
}
