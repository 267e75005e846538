//! Feature implementations for engojee.
//!
//! - Auto-reply rules and their persisted collection
//! - Engine control and event fan-out
//! - The activity log fed by engine events

pub mod activity;
pub mod automation;
pub mod rules;
