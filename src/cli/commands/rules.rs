//! Rules command implementation.
//!
//! Add and edit go through the editor flow so the CLI applies the same
//! validation and trimming as any other front-end.

use colored::Colorize;
use serde_json::json;

use crate::cli::args::{OutputFormat, RulesCommands};
use crate::error::EngojeeError;
use crate::features::rules::{submit, EditorMode, EditorParams, Rule, RuleDraft, RuleStore};
use crate::output::{format_rule, format_rules, to_json};

/// Execute rules subcommands.
///
/// # Errors
///
/// Returns validation, lookup and storage errors.
pub async fn rules(
    store: &RuleStore,
    cmd: RulesCommands,
    format: OutputFormat,
) -> Result<String, EngojeeError> {
    match cmd {
        RulesCommands::List => format_rules(&store.load_all().await, format),
        RulesCommands::Show { id } => {
            let rule = find(store, &id).await?;
            format_rule(&rule, format)
        }
        RulesCommands::Add {
            name,
            keywords,
            replies,
        } => {
            let draft = RuleDraft::new(name, keywords, replies.join("\n"));
            let rules = submit(store, &EditorMode::Create, draft).await?;
            let rule = rules
                .last()
                .ok_or_else(|| EngojeeError::StorageRead("rule list empty after add".to_string()))?;
            saved(rule, "Created", format)
        }
        RulesCommands::Edit {
            id,
            name,
            keywords,
            replies,
        } => {
            let existing = find(store, &id).await?;
            let (mode, mut draft) = EditorParams::for_rule(&existing).resolve()?;
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(keywords) = keywords {
                draft.keywords = keywords;
            }
            if !replies.is_empty() {
                draft.replies = replies.join("\n");
            }

            let rules = submit(store, &mode, draft).await?;
            let rule = rules
                .iter()
                .find(|r| r.id == id)
                .ok_or_else(|| EngojeeError::RuleNotFound(id.clone()))?;
            saved(rule, "Updated", format)
        }
        RulesCommands::Delete { id } => {
            let before = store.load_all().await.len();
            let rules = store.delete(&id).await?;
            let deleted = rules.len() < before;

            match format {
                OutputFormat::Json => to_json(&json!({
                    "id": id,
                    "deleted": deleted,
                    "remaining": rules.len()
                })),
                OutputFormat::Pretty if deleted => {
                    Ok(format!("{} rule {}", "Deleted".green(), id.bold()))
                }
                OutputFormat::Pretty => Ok(format!("No rule with id {id}; nothing deleted")),
            }
        }
    }
}

async fn find(store: &RuleStore, id: &str) -> Result<Rule, EngojeeError> {
    store
        .get(id)
        .await
        .ok_or_else(|| EngojeeError::RuleNotFound(id.to_string()))
}

fn saved(rule: &Rule, verb: &str, format: OutputFormat) -> Result<String, EngojeeError> {
    match format {
        OutputFormat::Json => to_json(rule),
        OutputFormat::Pretty => Ok(format!(
            "{} rule {} ({})",
            verb.green(),
            rule.name.bold(),
            rule.id.dimmed()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn add_cmd(name: &str) -> RulesCommands {
        RulesCommands::Add {
            name: name.to_string(),
            keywords: "btc,eth".to_string(),
            replies: vec!["gm".to_string(), "wagmi".to_string()],
        }
    }

    #[tokio::test]
    async fn test_add_joins_replies() {
        let store = RuleStore::new(MemoryStore::new());

        let output = rules(&store, add_cmd("Crypto"), OutputFormat::Json)
            .await
            .unwrap();
        let created: Rule = serde_json::from_str(&output).unwrap();

        assert_eq!(created.replies, "gm\nwagmi");
        assert_eq!(store.load_all().await, vec![created]);
    }

    #[tokio::test]
    async fn test_add_rejects_blank_name() {
        let store = RuleStore::new(MemoryStore::new());
        let err = rules(&store, add_cmd("   "), OutputFormat::Pretty)
            .await
            .unwrap_err();
        assert!(matches!(err, EngojeeError::Validation(_)));
    }

    #[tokio::test]
    async fn test_edit_keeps_unspecified_fields() {
        let store = RuleStore::new(MemoryStore::new());
        rules(&store, add_cmd("Crypto"), OutputFormat::Json)
            .await
            .unwrap();
        let id = store.load_all().await[0].id.clone();

        rules(
            &store,
            RulesCommands::Edit {
                id: id.clone(),
                name: None,
                keywords: Some("sol".to_string()),
                replies: Vec::new(),
            },
            OutputFormat::Json,
        )
        .await
        .unwrap();

        let rule = store.get(&id).await.unwrap();
        assert_eq!(rule.name, "Crypto");
        assert_eq!(rule.keywords, "sol");
        assert_eq!(rule.replies, "gm\nwagmi");
    }

    #[tokio::test]
    async fn test_edit_and_show_missing_rule() {
        let store = RuleStore::new(MemoryStore::new());

        let err = rules(
            &store,
            RulesCommands::Show { id: "404".to_string() },
            OutputFormat::Pretty,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngojeeError::RuleNotFound(_)));

        let err = rules(
            &store,
            RulesCommands::Edit {
                id: "404".to_string(),
                name: Some("x".to_string()),
                keywords: None,
                replies: Vec::new(),
            },
            OutputFormat::Pretty,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngojeeError::RuleNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_reports_whether_anything_changed() {
        let store = RuleStore::new(MemoryStore::new());
        rules(&store, add_cmd("Crypto"), OutputFormat::Json)
            .await
            .unwrap();
        let id = store.load_all().await[0].id.clone();

        let output = rules(&store, RulesCommands::Delete { id: id.clone() }, OutputFormat::Json)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["deleted"], true);
        assert_eq!(value["remaining"], 0);

        let output = rules(&store, RulesCommands::Delete { id }, OutputFormat::Json)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["deleted"], false);
    }
}
