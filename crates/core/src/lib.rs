//! Domain model for the sprint orchestration engine.
//!
//! This crate defines the shared sprint state, the per-field merge rules
//! used when a stage's partial update is folded into that state, and the
//! story/artifact types the stages exchange.

pub mod domain;
pub mod error;

pub use domain::{
    ArtifactKind, ArtifactRecord, Message, SprintState, StateUpdate, StoryStatus, UserStory,
};
pub use error::CoreError;
