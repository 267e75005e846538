//! Service command implementation.
//!
//! Composes the rule store and the engine facade: `start` reads the rules
//! and refuses to start with none, `watch` feeds engine events into an
//! activity log and prints each new line.

use std::sync::{Arc, Mutex, PoisonError};

use colored::Colorize;

use crate::cli::args::{OutputFormat, ServiceCommands};
use crate::error::EngojeeError;
use crate::features::activity::ActivityLog;
use crate::features::automation::{AutomationService, EngineBridge, EventName, EventSource};
use crate::features::rules::RuleStore;
use crate::output::{format_log_entry, format_status, to_json};

/// Execute service subcommands.
///
/// # Errors
///
/// Returns `NoRules` when starting without rules, `StorageRead` when the
/// stored rules are unreadable, or the engine's error.
pub async fn service<B: EngineBridge + EventSource>(
    service: &AutomationService<B>,
    store: &RuleStore,
    cmd: ServiceCommands,
    log_capacity: usize,
    format: OutputFormat,
) -> Result<String, EngojeeError> {
    match cmd {
        ServiceCommands::Start => {
            let rules = store.try_load_all().await?;
            if rules.is_empty() {
                return Err(EngojeeError::NoRules);
            }
            service.start(&rules).await?;
            requested("Service start requested", Some(rules.len()), format)
        }
        ServiceCommands::Stop => {
            service.stop().await?;
            requested("Service stop requested", None, format)
        }
        ServiceCommands::Status => format_status(service.get_status().await?, format),
        ServiceCommands::Settings => {
            service.open_platform_settings().await?;
            match format {
                OutputFormat::Json => to_json(&serde_json::json!({ "opened": true })),
                OutputFormat::Pretty => Ok(format!(
                    "{}\nFind \"X Engojee\" in the accessibility services list and enable it.",
                    "Accessibility settings opened".green()
                )),
            }
        }
        ServiceCommands::Watch => watch(service, log_capacity, format).await,
    }
}

/// Print engine activity until the engine closes its event stream.
async fn watch<B: EngineBridge + EventSource>(
    service: &AutomationService<B>,
    log_capacity: usize,
    format: OutputFormat,
) -> Result<String, EngojeeError> {
    let log = Arc::new(Mutex::new(ActivityLog::with_capacity(log_capacity)));

    for event in EventName::ALL {
        let log = Arc::clone(&log);
        service.subscribe(event, move |event| {
            let mut log = log.lock().unwrap_or_else(PoisonError::into_inner);
            match format_log_entry(log.record_event(event), format) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "failed to format activity entry"),
            }
        });
    }

    let (events, task) = service
        .bridge()
        .events(log_capacity)
        .map_err(|e| EngojeeError::BridgeCall(e.message))?;
    let received = service.pump(events).await;
    service.unsubscribe_all();

    if let Err(e) = task.await {
        tracing::warn!(error = %e, "engine event task failed");
    }

    match format {
        OutputFormat::Json => Ok(String::new()),
        OutputFormat::Pretty => Ok(format!("Engine event stream closed after {received} events")
            .dimmed()
            .to_string()),
    }
}

fn requested(
    message: &str,
    rules: Option<usize>,
    format: OutputFormat,
) -> Result<String, EngojeeError> {
    match format {
        OutputFormat::Json => to_json(&serde_json::json!({
            "message": message,
            "rules": rules
        })),
        OutputFormat::Pretty => Ok(match rules {
            Some(count) => format!("{} ({count} rules)", message.green()),
            None => message.green().to_string(),
        }),
    }
}
