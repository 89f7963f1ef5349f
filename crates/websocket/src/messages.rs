use serde::{Deserialize, Serialize};
use uuid::Uuid;

use events::EventEnvelope;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start a sprint for the given goal on this connection.
    Start { goal: String },
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Acknowledges a started sprint with its session id.
    Session { session_id: Uuid },
    Event { envelope: EventEnvelope },
    Pong,
    Error { message: String },
}
