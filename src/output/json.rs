use serde::Serialize;
use serde_json::json;

use crate::error::EngojeeError;
use crate::features::activity::LogEntry;
use crate::features::automation::ServiceStatus;
use crate::features::rules::Rule;

/// Format the rule list as JSON
///
/// # Errors
///
/// Returns `EngojeeError::Parse` if JSON serialization fails.
pub fn format_rules_json(rules: &[Rule]) -> Result<String, EngojeeError> {
    let output = json!({
        "count": rules.len(),
        "items": rules
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format the engine status as JSON
///
/// # Errors
///
/// Returns `EngojeeError::Parse` if JSON serialization fails.
pub fn format_status_json(status: ServiceStatus) -> Result<String, EngojeeError> {
    let output = json!({
        "status": status,
        "label": status.label(),
        "running": status.is_running()
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format one activity log line as compact JSON (one object per line)
///
/// # Errors
///
/// Returns `EngojeeError::Parse` if JSON serialization fails.
pub fn format_log_entry_json(entry: &LogEntry) -> Result<String, EngojeeError> {
    let output = json!({
        "id": entry.id,
        "message": entry.message,
        "timestamp": entry.timestamp.to_rfc3339(),
        "tone": entry.tone()
    });
    Ok(serde_json::to_string(&output)?)
}

/// Serialize any value as pretty JSON
///
/// # Errors
///
/// Returns `EngojeeError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, EngojeeError> {
    Ok(serde_json::to_string_pretty(value)?)
}
