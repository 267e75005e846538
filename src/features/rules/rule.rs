//! Auto-reply rule definitions.
//!
//! A rule pairs a comma-separated keyword list with newline-separated
//! candidate replies. The engine decides when a post matches; this crate only
//! stores and forwards rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An auto-reply rule, in its persisted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Unique rule ID, assigned at creation
    pub id: String,
    /// Display name
    pub name: String,
    /// Comma-separated trigger terms, stored verbatim
    pub keywords: String,
    /// Newline-separated candidate replies, stored verbatim
    pub replies: String,
    /// Creation time, never changed by updates
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

/// `createdAt` as an ISO-8601 UTC string that always carries milliseconds
/// (`2024-01-15T10:30:00.000Z`).
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }
}

impl Rule {
    /// Keyword terms, trimmed, with empty terms dropped.
    #[must_use]
    pub fn keyword_list(&self) -> Vec<&str> {
        split_terms(&self.keywords, ',')
    }

    /// Reply lines, trimmed, with blank lines dropped.
    #[must_use]
    pub fn reply_list(&self) -> Vec<&str> {
        split_terms(&self.replies, '\n')
    }

    /// The first `limit` replies and how many were left out.
    #[must_use]
    pub fn reply_preview(&self, limit: usize) -> ReplyPreview<'_> {
        let replies = self.reply_list();
        let remaining = replies.len().saturating_sub(limit);
        ReplyPreview {
            shown: replies.into_iter().take(limit).collect(),
            remaining,
        }
    }
}

/// A truncated view of a rule's replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPreview<'a> {
    /// Replies to display
    pub shown: Vec<&'a str>,
    /// Replies not shown
    pub remaining: usize,
}

/// Fields supplied when creating a rule. The store assigns `id` and `createdAt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRule {
    pub name: String,
    pub keywords: String,
    pub replies: String,
}

impl NewRule {
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
}

/// A partial update. Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePatch {
    pub name: Option<String>,
    pub keywords: Option<String>,
    pub replies: Option<String>,
}

impl RulePatch {
    /// Create an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the keywords.
    #[must_use]
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    /// Set the replies.
    #[must_use]
    pub fn with_replies(mut self, replies: impl Into<String>) -> Self {
        self.replies = Some(replies.into());
        self
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.keywords.is_none() && self.replies.is_none()
    }

    /// Merge this patch over `rule`. `id` and `created_at` are never touched.
    pub fn apply(self, rule: &mut Rule) {
        if let Some(name) = self.name {
            rule.name = name;
        }
        if let Some(keywords) = self.keywords {
            rule.keywords = keywords;
        }
        if let Some(replies) = self.replies {
            rule.replies = replies;
        }
    }
}

fn split_terms(raw: &str, separator: char) -> Vec<&str> {
    raw.split(separator)
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .collect()
}
