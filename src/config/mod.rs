//! Configuration management for engojee.
//!
//! This module handles loading and saving configuration from `~/.engojee/`.

mod paths;
mod settings;

pub use paths::Paths;
pub use settings::{ActivityConfig, Config, EngineConfig, GeneralConfig};
