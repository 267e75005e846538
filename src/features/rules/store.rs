//! Persistent rule collection.
//!
//! All rules live as one JSON array under [`RULES_STORAGE_KEY`]. Every
//! mutation reads the whole array, changes one entry and writes the whole
//! array back.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use tokio::sync::Mutex;

use super::rule::{NewRule, Rule, RulePatch};
use crate::error::EngojeeError;
use crate::storage::KeyValueStore;

/// Key holding the serialized rule collection.
pub const RULES_STORAGE_KEY: &str = "@xengojee_rules";

/// CRUD over the rule collection.
///
/// Clones share the same medium and the same writer lock, so mutations made
/// through any clone in this process are applied one at a time.
#[derive(Clone)]
pub struct RuleStore {
    kv: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl RuleStore {
    /// Create a store over a key-value medium.
    pub fn new(kv: impl KeyValueStore + 'static) -> Self {
        Self::with_shared(Arc::new(kv))
    }

    /// Create a store over an already shared medium.
    #[must_use]
    pub fn with_shared(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load every rule.
    ///
    /// Returns an empty list when nothing was ever saved, and also when the
    /// stored value cannot be read or decoded. Use [`Self::try_load_all`] to
    /// tell those cases apart.
    pub async fn load_all(&self) -> Vec<Rule> {
        match self.try_load_all().await {
            Ok(rules) => rules,
            Err(e) => {
                tracing::warn!(error = %e, "treating unreadable rule collection as empty");
                Vec::new()
            }
        }
    }

    /// Load every rule, surfacing unreadable data.
    ///
    /// # Errors
    ///
    /// Returns `StorageRead` if the medium fails or the stored value is not a
    /// rule list.
    pub async fn try_load_all(&self) -> Result<Vec<Rule>, EngojeeError> {
        let raw = self
            .kv
            .get_item(RULES_STORAGE_KEY)
            .await
            .map_err(|e| EngojeeError::StorageRead(e.to_string()))?;

        let Some(raw) = raw else {
            return Ok(Vec::new());
        };

        let rules: Vec<Rule> = serde_json::from_str(&raw).map_err(|e| {
            EngojeeError::StorageRead(format!("stored value is not a rule list: {e}"))
        })?;
        tracing::debug!(count = rules.len(), "loaded rules");
        Ok(rules)
    }

    /// Look up one rule by id.
    pub async fn get(&self, id: &str) -> Option<Rule> {
        self.load_all().await.into_iter().find(|r| r.id == id)
    }

    /// Replace the persisted collection with `rules`.
    ///
    /// # Errors
    ///
    /// Returns `StorageWrite` if serialization fails or the medium rejects the write.
    pub async fn save_all(&self, rules: &[Rule]) -> Result<(), EngojeeError> {
        let json = serde_json::to_string(rules)
            .map_err(|e| EngojeeError::StorageWrite(format!("Failed to serialize rules: {e}")))?;

        self.kv
            .set_item(RULES_STORAGE_KEY, &json)
            .await
            .map_err(|e| EngojeeError::StorageWrite(e.to_string()))?;

        tracing::debug!(count = rules.len(), "saved rules");
        Ok(())
    }

    /// Append a new rule and return the updated collection.
    ///
    /// # Errors
    ///
    /// Returns `StorageRead` if the existing collection is unreadable, or
    /// `StorageWrite` if it cannot be persisted. Nothing is written on error.
    pub async fn add(&self, new_rule: NewRule) -> Result<Vec<Rule>, EngojeeError> {
        let _writer = self.write_lock.lock().await;
        let mut rules = self.try_load_all().await?;

        let created_at = Utc::now().trunc_subsecs(3);
        let rule = Rule {
            id: next_id(&rules, created_at.timestamp_millis()),
            name: new_rule.name,
            keywords: new_rule.keywords,
            replies: new_rule.replies,
            created_at,
        };
        tracing::debug!(id = %rule.id, name = %rule.name, "adding rule");

        rules.push(rule);
        self.save_all(&rules).await?;
        Ok(rules)
    }

    /// Merge `patch` into the rule with `id`, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns `RuleNotFound` if no rule has that id (nothing is written),
    /// `StorageRead` or `StorageWrite` on medium failures.
    pub async fn update(&self, id: &str, patch: RulePatch) -> Result<Vec<Rule>, EngojeeError> {
        let _writer = self.write_lock.lock().await;
        let mut rules = self.try_load_all().await?;

        let rule = rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| EngojeeError::RuleNotFound(id.to_string()))?;
        patch.apply(rule);
        tracing::debug!(id, "updating rule");

        self.save_all(&rules).await?;
        Ok(rules)
    }

    /// Remove the rule with `id`. Removing a missing id is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageRead` or `StorageWrite` on medium failures.
    pub async fn delete(&self, id: &str) -> Result<Vec<Rule>, EngojeeError> {
        let _writer = self.write_lock.lock().await;
        let mut rules = self.try_load_all().await?;

        let before = rules.len();
        rules.retain(|r| r.id != id);
        tracing::debug!(id, removed = before - rules.len(), "deleting rule");

        self.save_all(&rules).await?;
        Ok(rules)
    }
}

/// Millisecond id, bumped past every numeric id already in use.
///
/// When no numeric id fits above the newest one, falls back to
/// `<millis>-<n>`.
fn next_id(rules: &[Rule], now_millis: i64) -> String {
    let taken = |id: &str| rules.iter().any(|r| r.id == id);

    let newest = rules.iter().filter_map(|r| r.id.parse::<i64>().ok()).max();
    let mut candidate = match newest {
        Some(newest) if newest >= now_millis => newest.checked_add(1),
        _ => Some(now_millis),
    };

    while let Some(value) = candidate {
        let id = value.to_string();
        if !taken(&id) {
            return id;
        }
        candidate = value.checked_add(1);
    }

    tracing::warn!(now_millis, "numeric rule ids exhausted, using suffixed id");
    let mut suffix: u64 = 1;
    loop {
        let id = format!("{now_millis}-{suffix}");
        if !taken(&id) {
            return id;
        }
        suffix += 1;
    }
}
