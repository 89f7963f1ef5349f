//! Event types streamed to a sprint observer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sprint_core::ArtifactKind;
use utoipa::ToSchema;
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Observable status of a role agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Thinking,
    Active,
    Done,
}

/// All events a sprint run can emit.
///
/// For one session these are delivered in exactly the order the sequencer
/// emitted them, and the stream ends with exactly one `Complete` or `Error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A role agent changed status
    #[serde(rename = "agent_update")]
    AgentUpdate {
        agent_id: String,
        name: String,
        status: AgentStatus,
        thought: Option<String>,
    },

    /// A stage produced (or overwrote) a named artifact
    #[serde(rename = "artifact")]
    Artifact {
        id: Uuid,
        title: String,
        kind: ArtifactKind,
        preview: String,
        content: String,
        timestamp: DateTime<Utc>,
    },

    /// Progress log line from an agent or the system
    #[serde(rename = "log")]
    Log {
        id: Uuid,
        agent: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// The sprint ran to the end of the phase sequence
    #[serde(rename = "complete")]
    Complete { success: bool },

    /// The sprint failed; no further events follow
    #[serde(rename = "error")]
    Error { message: String },
}

impl Event {
    pub fn agent_update(
        agent_id: impl Into<String>,
        name: impl Into<String>,
        status: AgentStatus,
        thought: Option<String>,
    ) -> Self {
        Self::AgentUpdate {
            agent_id: agent_id.into(),
            name: name.into(),
            status,
            thought,
        }
    }

    pub fn artifact(
        title: impl Into<String>,
        kind: ArtifactKind,
        preview: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Artifact {
            id: Uuid::new_v4(),
            title: title.into(),
            kind,
            preview: preview.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn log(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Log {
            id: Uuid::new_v4(),
            agent: agent.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Whether this event terminates the session's stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Complete { .. } | Event::Error { .. })
    }
}
