use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::time::interval;

use events::EventEnvelope;
use orchestrator::{SessionCoordinator, SessionId};

use crate::messages::{ClientMessage, ServerMessage};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct WsState {
    pub coordinator: SessionCoordinator,
}

impl WsState {
    pub fn new(coordinator: SessionCoordinator) -> Self {
        Self { coordinator }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<WsState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let (mut sender, mut receiver) = socket.split();

    // Phase one: wait for the client to start a sprint.
    let Some((session_id, events)) = await_start(&mut sender, &mut receiver, &state).await else {
        tracing::debug!("WebSocket closed before a sprint was started");
        return;
    };

    // Phase two: forward the session's events until the stream terminates
    // or the observer goes away.
    forward_events(&mut sender, &mut receiver, events).await;

    // Stop the run at its next boundary. A completed run has already
    // retired its own registry entry, which is fine.
    if state.coordinator.teardown(session_id).is_err() {
        tracing::debug!(session_id = %session_id, "Session already retired");
    }
    tracing::debug!(session_id = %session_id, "WebSocket connection closed");
}

async fn await_start(
    sender: &mut SplitSink<WebSocket, Message>,
    receiver: &mut SplitStream<WebSocket>,
    state: &WsState,
) -> Option<(SessionId, broadcast::Receiver<EventEnvelope>)> {
    let mut heartbeat = interval(HEARTBEAT_INTERVAL);
    heartbeat.reset();

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Default::default())).await.is_err() {
                    return None;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Start { goal }) => {
                                match state.coordinator.create_session(&goal) {
                                    Ok((session_id, events)) => {
                                        let ack = ServerMessage::Session { session_id };
                                        if send_json(sender, &ack).await.is_err() {
                                            // Observer vanished between create and ack.
                                            let _ = state.coordinator.teardown(session_id);
                                            return None;
                                        }
                                        return Some((session_id, events));
                                    }
                                    Err(err) => {
                                        // Rejected start: no session exists, the
                                        // connection stays open for another attempt.
                                        let reply = ServerMessage::Error {
                                            message: err.to_string(),
                                        };
                                        if send_json(sender, &reply).await.is_err() {
                                            return None;
                                        }
                                    }
                                }
                            }
                            Ok(ClientMessage::Ping) => {
                                if send_json(sender, &ServerMessage::Pong).await.is_err() {
                                    return None;
                                }
                            }
                            Err(e) => {
                                let reply = ServerMessage::Error {
                                    message: format!("Invalid message: {e}"),
                                };
                                if send_json(sender, &reply).await.is_err() {
                                    return None;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            return None;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return None,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => return None,
                }
            }
        }
    }
}

async fn forward_events(
    sender: &mut SplitSink<WebSocket, Message>,
    receiver: &mut SplitStream<WebSocket>,
    mut events: broadcast::Receiver<EventEnvelope>,
) {
    let mut heartbeat = interval(HEARTBEAT_INTERVAL);
    heartbeat.reset();

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }

            event = events.recv() => {
                match event {
                    Ok(envelope) => {
                        let terminal = envelope.event.is_terminal();
                        let msg = ServerMessage::Event { envelope };
                        if send_json(sender, &msg).await.is_err() {
                            break;
                        }
                        if terminal {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket observer lagged, missed {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Ping) => {
                                if send_json(sender, &ServerMessage::Pong).await.is_err() {
                                    break;
                                }
                            }
                            Ok(ClientMessage::Start { .. }) => {
                                let reply = ServerMessage::Error {
                                    message: "A sprint is already running on this connection"
                                        .to_string(),
                                };
                                if send_json(sender, &reply).await.is_err() {
                                    break;
                                }
                            }
                            Err(_) => {}
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }
}

async fn send_json(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).unwrap_or_else(|_| {
        r#"{"type":"error","message":"serialization_failed"}"#.to_string()
    });
    sender.send(Message::Text(json.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestrator::{PersonaStore, ScriptedProvider, SequencerConfig};

    #[tokio::test]
    async fn test_ws_state_creation() {
        let coordinator = SessionCoordinator::new(
            Arc::new(ScriptedProvider),
            PersonaStore::new(None),
            SequencerConfig::default(),
        );
        let state = WsState::new(coordinator);
        assert_eq!(state.coordinator.active_count(), 0);
    }

    #[test]
    fn test_heartbeat_interval() {
        assert_eq!(HEARTBEAT_INTERVAL, Duration::from_secs(30));
    }
}
