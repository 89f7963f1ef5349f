//! WebSocket transport for sprint update streams.
//!
//! Thin framing layer over an established connection: a client starts a
//! sprint with a goal, the handler forwards the session's events in
//! emission order and closes after the terminal event.

mod handler;
mod messages;

pub use handler::{ws_handler, WsState};
pub use messages::{ClientMessage, ServerMessage};
