use colored::{ColoredString, Colorize};

use crate::features::activity::{LogEntry, LogTone};
use crate::features::automation::ServiceStatus;
use crate::features::rules::Rule;

/// Replies shown before collapsing the rest into a count.
const REPLY_PREVIEW: usize = 3;

/// Format the rule list as a pretty table
pub fn format_rules_pretty(rules: &[Rule]) -> String {
    if rules.is_empty() {
        return format!(
            "Rules (0)\n  No rules yet\n\nCreate one with: {}",
            "engojee rules add --name <name> --keywords <k1,k2> --reply <text>".cyan()
        );
    }

    let mut output = format!("Rules ({})\n", rules.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for rule in rules {
        output.push_str(&format!(
            "{}  {}\n",
            rule.name.bold(),
            rule.id.dimmed()
        ));
        output.push_str(&format!(
            "    {} keywords | {} replies | created {}\n",
            rule.keyword_list().len(),
            rule.reply_list().len(),
            rule.created_at.format("%Y-%m-%d")
        ));
    }

    output
}

/// Format a single rule with its keywords and a reply preview
pub fn format_rule_pretty(rule: &Rule) -> String {
    let mut output = format!("{}\n", rule.name.bold());
    output.push_str(&format!("  {}: {}\n", "ID".dimmed(), rule.id));
    output.push_str(&format!(
        "  {}: {}\n",
        "Created".dimmed(),
        rule.created_at.format("%Y-%m-%d %H:%M")
    ));

    let keywords = rule.keyword_list();
    output.push_str(&format!(
        "  {} ({}): {}\n",
        "Keywords".dimmed(),
        keywords.len(),
        keywords
            .iter()
            .map(|k| k.cyan().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    ));

    let preview = rule.reply_preview(REPLY_PREVIEW);
    output.push_str(&format!(
        "  {} ({}):\n",
        "Replies".dimmed(),
        preview.shown.len() + preview.remaining
    ));
    for reply in &preview.shown {
        output.push_str(&format!("    - {reply}\n"));
    }
    if preview.remaining > 0 {
        output.push_str(&format!(
            "    {}\n",
            format!("+{} more replies...", preview.remaining).dimmed()
        ));
    }

    output
}

/// Format the engine status
pub fn format_status_pretty(status: ServiceStatus) -> String {
    let label = match status {
        ServiceStatus::Running => status.label().green(),
        ServiceStatus::Disabled => status.label().yellow(),
        ServiceStatus::Connected | ServiceStatus::Stopped => status.label().normal(),
    };
    let mut output = format!("● {label}");
    if status == ServiceStatus::Disabled {
        output.push_str(&format!(
            "\n  Enable the accessibility service with: {}",
            "engojee service settings".cyan()
        ));
    }
    output
}

/// Format one activity log line
pub fn format_log_entry_pretty(entry: &LogEntry) -> String {
    format!("{}  {}", entry.time_label().dimmed(), tone(entry))
}

fn tone(entry: &LogEntry) -> ColoredString {
    let message = entry.message.as_str();
    match entry.tone() {
        LogTone::Failure => message.red(),
        LogTone::Success => message.green(),
        LogTone::Highlight => message.cyan(),
        LogTone::Muted => message.dimmed(),
    }
}
