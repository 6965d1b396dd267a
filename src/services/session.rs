//! Session service: connection lifecycle and presence.
//!
//! DESIGN
//! ======
//! A connection is bootstrapped inside one critical section: channel
//! registered, snapshot queued, identity queued, join broadcast queued.
//! Every new client therefore sees `canvas:reset` before anything else,
//! and no append can slip between the snapshot and the registration.
//!
//! Disconnects abandon the author's open stream contexts; views drop their
//! rendering copies when the `user:left` broadcast reaches them. No
//! synthetic `stroke:end` is sent for an abandoned stroke.

use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::protocol::ServerEvent;
use crate::state::{AppState, ConnectedUser};
use crate::stroke::ClientId;

/// Presence palette; each connection gets one entry at accept.
const PRESENCE_PALETTE: [&str; 8] = [
    "#d94b4b", "#4b8bd9", "#4bd98b", "#d9b84b", "#9b4bd9", "#d94bb8", "#4bd9d9", "#8bd94b",
];

/// Pick a presence color for a new connection.
#[must_use]
pub fn pick_color() -> String {
    let idx = rand::rng().random_range(0..PRESENCE_PALETTE.len());
    PRESENCE_PALETTE[idx].to_string()
}

/// Register a connection and queue its bootstrap events: the snapshot first,
/// then its identity, then the join broadcast to everyone.
pub async fn connect(state: &AppState, client_id: ClientId, color: String, tx: mpsc::Sender<ServerEvent>) {
    let mut canvas = state.canvas.write().await;
    canvas.clients.insert(client_id, tx);
    canvas.users.insert(client_id, ConnectedUser { color: color.clone() });

    let snapshot = ServerEvent::CanvasReset { strokes: canvas.history.snapshot() };
    canvas.send_to(client_id, &snapshot);

    let hello = ServerEvent::SessionConnected {
        client_id,
        color: color.clone(),
        background: state.background.clone(),
    };
    canvas.send_to(client_id, &hello);

    let joined = ServerEvent::UserJoined { client_id, color, user_count: canvas.users.len() };
    canvas.broadcast(&joined, None);

    info!(%client_id, clients = canvas.clients.len(), "client connected");
}

/// Remove a connection: drop its channel, abandon its open strokes, and
/// tell the remaining clients.
pub async fn disconnect(state: &AppState, client_id: ClientId) {
    let mut canvas = state.canvas.write().await;
    canvas.clients.remove(&client_id);
    canvas.users.remove(&client_id);

    let abandoned = canvas.relay.abandon(client_id);
    if abandoned > 0 {
        debug!(%client_id, abandoned, "abandoned open strokes on disconnect");
    }

    let left = ServerEvent::UserLeft { client_id, user_count: canvas.users.len() };
    canvas.broadcast(&left, None);

    info!(%client_id, remaining = canvas.clients.len(), "client disconnected");
}

/// Number of connected clients.
pub async fn user_count(state: &AppState) -> usize {
    let canvas = state.canvas.read().await;
    canvas.users.len()
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
