//! Automation engine control.
//!
//! The engine itself runs outside this crate. This module provides:
//! - The bridge contract and a program-backed bridge
//! - Start/stop/status/settings forwarding
//! - Event decoding and subscriber fan-out

pub mod bridge;
pub mod events;
pub mod service;
pub mod status;

pub use bridge::{BridgeError, CommandBridge, EngineBridge, EventSource};
pub use events::{EngineEvent, EventName, RawEvent};
pub use service::{AutomationService, EventHandler, SubscriptionHandle};
pub use status::ServiceStatus;
