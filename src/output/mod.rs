//! Output formatting for engojee.
//!
//! This module provides formatters for displaying rules, engine status and
//! activity in pretty or JSON form.

mod json;
mod pretty;

use crate::cli::args::OutputFormat;
use crate::error::EngojeeError;
use crate::features::activity::LogEntry;
use crate::features::automation::ServiceStatus;
use crate::features::rules::Rule;

pub use json::*;
pub use pretty::*;

/// Format the rule list based on output format
///
/// # Errors
///
/// Returns `EngojeeError::Parse` if JSON serialization fails.
pub fn format_rules(rules: &[Rule], format: OutputFormat) -> Result<String, EngojeeError> {
    match format {
        OutputFormat::Pretty => Ok(format_rules_pretty(rules)),
        OutputFormat::Json => format_rules_json(rules),
    }
}

/// Format a single rule based on output format
///
/// # Errors
///
/// Returns `EngojeeError::Parse` if JSON serialization fails.
pub fn format_rule(rule: &Rule, format: OutputFormat) -> Result<String, EngojeeError> {
    match format {
        OutputFormat::Pretty => Ok(format_rule_pretty(rule)),
        OutputFormat::Json => to_json(rule),
    }
}

/// Format the engine status based on output format
///
/// # Errors
///
/// Returns `EngojeeError::Parse` if JSON serialization fails.
pub fn format_status(status: ServiceStatus, format: OutputFormat) -> Result<String, EngojeeError> {
    match format {
        OutputFormat::Pretty => Ok(format_status_pretty(status)),
        OutputFormat::Json => format_status_json(status),
    }
}

/// Format one activity log line based on output format
///
/// # Errors
///
/// Returns `EngojeeError::Parse` if JSON serialization fails.
pub fn format_log_entry(entry: &LogEntry, format: OutputFormat) -> Result<String, EngojeeError> {
    match format {
        OutputFormat::Pretty => Ok(format_log_entry_pretty(entry)),
        OutputFormat::Json => format_log_entry_json(entry),
    }
}
