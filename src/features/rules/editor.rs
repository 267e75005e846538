//! Rule editor flow.
//!
//! The editor is opened with string route parameters. In edit mode the form
//! is prefilled from those parameters; on submit the draft is validated,
//! trimmed and handed to the store as either a create or an update.

use std::collections::HashMap;

use super::rule::{NewRule, Rule, RulePatch};
use super::store::RuleStore;
use crate::error::EngojeeError;

/// What the editor will do on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    /// Create a new rule
    Create,
    /// Update the rule with this id
    Edit { rule_id: String },
}

/// Raw navigation parameters passed to the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorParams {
    pub mode: Option<String>,
    pub rule_id: Option<String>,
    pub rule_name: Option<String>,
    pub keywords: Option<String>,
    pub replies: Option<String>,
}

impl EditorParams {
    /// Read parameters from a route map using their wire names
    /// (`mode`, `ruleId`, `ruleName`, `keywords`, `replies`).
    #[must_use]
    pub fn from_route(params: &HashMap<String, String>) -> Self {
        let get = |key: &str| params.get(key).cloned();
        Self {
            mode: get("mode"),
            rule_id: get("ruleId"),
            rule_name: get("ruleName"),
            keywords: get("keywords"),
            replies: get("replies"),
        }
    }

    /// Parameters that open the editor on an existing rule.
    #[must_use]
    pub fn for_rule(rule: &Rule) -> Self {
        Self {
            mode: Some("edit".to_string()),
            rule_id: Some(rule.id.clone()),
            rule_name: Some(rule.name.clone()),
            keywords: Some(rule.keywords.clone()),
            replies: Some(rule.replies.clone()),
        }
    }

    /// Resolve the editor mode and the initial form contents.
    ///
    /// Any mode other than `edit` opens an empty create form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when `mode` is `edit` but no `ruleId` was given.
    pub fn resolve(self) -> Result<(EditorMode, RuleDraft), EngojeeError> {
        if self.mode.as_deref() != Some("edit") {
            return Ok((EditorMode::Create, RuleDraft::default()));
        }

        let rule_id = self
            .rule_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| EngojeeError::InvalidInput("edit mode requires a ruleId".to_string()))?;

        let draft = RuleDraft {
            name: self.rule_name.unwrap_or_default(),
            keywords: self.keywords.unwrap_or_default(),
            replies: self.replies.unwrap_or_default(),
        };
        Ok((EditorMode::Edit { rule_id }, draft))
    }
}

/// Form contents of the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleDraft {
    pub name: String,
    pub keywords: String,
    pub replies: String,
}

impl RuleDraft {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        keywords: impl Into<String>,
        replies: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.into(),
            replies: replies.into(),
        }
    }

    /// Whether anything has been typed (used to confirm discarding).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !(self.name.is_empty() && self.keywords.is_empty() && self.replies.is_empty())
    }

    /// Number of non-blank keyword terms.
    #[must_use]
    pub fn keyword_count(&self) -> usize {
        self.keywords.split(',').filter(|k| !k.trim().is_empty()).count()
    }

    /// Number of non-blank reply lines.
    #[must_use]
    pub fn reply_count(&self) -> usize {
        self.replies.lines().filter(|r| !r.trim().is_empty()).count()
    }

    /// Check the draft can be saved.
    ///
    /// # Errors
    ///
    /// Returns `Validation` naming the first missing field.
    pub fn validate(&self) -> Result<(), EngojeeError> {
        if self.name.trim().is_empty() {
            return Err(EngojeeError::Validation("Please enter a rule name".to_string()));
        }
        if self.keywords.trim().is_empty() {
            return Err(EngojeeError::Validation(
                "Please enter at least one keyword".to_string(),
            ));
        }
        if self.replies.trim().is_empty() {
            return Err(EngojeeError::Validation(
                "Please enter at least one reply".to_string(),
            ));
        }
        Ok(())
    }

    fn into_trimmed(self) -> NewRule {
        NewRule::new(
            self.name.trim(),
            self.keywords.trim(),
            self.replies.trim(),
        )
    }
}

/// Validate `draft` and save it according to `mode`.
///
/// Returns the updated rule collection.
///
/// # Errors
///
/// Returns `Validation` before touching the store, or any store error.
pub async fn submit(
    store: &RuleStore,
    mode: &EditorMode,
    draft: RuleDraft,
) -> Result<Vec<Rule>, EngojeeError> {
    draft.validate()?;
    let fields = draft.into_trimmed();

    match mode {
        EditorMode::Create => store.add(fields).await,
        EditorMode::Edit { rule_id } => {
            let patch = RulePatch::new()
                .with_name(fields.name)
                .with_keywords(fields.keywords)
                .with_replies(fields.replies);
            store.update(rule_id, patch).await
        }
    }
}
