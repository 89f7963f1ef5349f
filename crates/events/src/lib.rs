//! Update events for the sprint orchestration engine.
//!
//! This crate provides the typed events a sprint run emits (agent status,
//! artifacts, logs, completion) and the per-session bus that delivers them
//! to an observer in emission order.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
