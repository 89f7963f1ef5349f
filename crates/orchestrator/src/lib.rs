//! Sprint orchestration engine.
//!
//! Drives a simulated development sprint through its fixed phase sequence
//! (planning, development, retro), merging each stage's partial update into
//! the shared [`sprint_core::SprintState`] and streaming progress events to
//! the session's observer.

pub mod coordinator;
pub mod error;
pub mod personas;
pub mod provider;
pub mod sequencer;
pub mod stages;
pub mod state_machine;

pub use coordinator::{SessionCoordinator, SessionId};
pub use error::{OrchestratorError, Result};
pub use personas::PersonaStore;
pub use provider::{CompletionProvider, ScriptedProvider};
pub use sequencer::{SequencerConfig, SprintSequencer};
pub use stages::{AgentRole, Stage, StageContext};
pub use state_machine::{PhaseStateMachine, SprintPhase};
