//! Auto-reply rules.
//!
//! - Rule definitions and partial updates
//! - The persisted rule collection (CRUD over one key-value entry)
//! - The editor flow that validates input before it reaches the store

pub mod editor;
pub mod rule;
pub mod store;

pub use editor::{submit, EditorMode, EditorParams, RuleDraft};
pub use rule::{NewRule, ReplyPreview, Rule, RulePatch};
pub use store::{RuleStore, RULES_STORAGE_KEY};
