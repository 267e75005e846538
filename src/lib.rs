//! engojee - auto-reply rules and engine control
//!
//! This crate stores keyword-triggered auto-reply rules in a key-value
//! medium and drives an external automation engine that applies them.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod output;
pub mod storage;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::EngojeeError;
pub use features::automation::{AutomationService, CommandBridge, EngineBridge};
pub use features::rules::{Rule, RuleStore};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
