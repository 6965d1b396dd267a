//! WebSocket handler, the only transport into the canvas.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client events → parse + dispatch to the canvas services
//! - Outbound events queued by the services → forward to the socket
//!
//! Dispatch never writes to the socket directly. Everything a client should
//! see, including echoes of its own mutations, is queued on its per-connection
//! channel by the service layer, so the channel order IS the delivery order.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register channel, queue `canvas:reset` + `session:connected`
//! 2. Client sends events → dispatch → services mutate and queue broadcasts
//! 3. Close or error → abandon open strokes, broadcast `user:left`

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::protocol::{ClientEvent, ServerEvent};
use crate::services::{canvas, session};
use crate::state::AppState;
use crate::stroke::{ClientId, Point};

/// Outbound queue depth per connection. A client that falls this far behind
/// starts losing broadcasts and recovers at its next snapshot.
const OUTBOUND_CAPACITY: usize = 256;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    let color = session::pick_color();

    // Per-connection channel; the service layer queues all outbound events here.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerEvent>(OUTBOUND_CAPACITY);

    session::connect(&state, client_id, color, client_tx).await;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        dispatch_event(&state, client_id, &text).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = client_rx.recv() => {
                if send_event(&mut socket, client_id, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    session::disconnect(&state, client_id).await;
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Parse one inbound text message and hand it to the owning service.
///
/// Anything that fails to parse is logged and dropped; a drawing surface has
/// no use for error replies to a peer that sent garbage.
async fn dispatch_event(state: &AppState, client_id: ClientId, text: &str) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: dropping malformed event");
            return;
        }
    };

    if !event.is_stream() {
        info!(%client_id, event = event.name(), "ws: recv");
    }

    match event {
        ClientEvent::StrokeStart { stroke_id, color, width, x, y } => {
            canvas::stream_start(state, client_id, stroke_id, &color, width, Point::new(x, y)).await;
        }
        ClientEvent::StrokePoint { stroke_id, x, y } => {
            canvas::stream_point(state, client_id, stroke_id, Point::new(x, y)).await;
        }
        ClientEvent::StrokeEnd { stroke_id, x, y } => {
            let final_point = match (x, y) {
                (Some(x), Some(y)) => Some(Point::new(x, y)),
                _ => None,
            };
            canvas::stream_end(state, client_id, stroke_id, final_point).await;
        }
        ClientEvent::StrokeAdd { stroke } => {
            canvas::append_stroke(state, client_id, stroke).await;
        }
        ClientEvent::Undo => {
            canvas::undo(state, client_id).await;
        }
        ClientEvent::Redo => {
            canvas::redo(state, client_id).await;
        }
        ClientEvent::CanvasClear => {
            canvas::clear(state, client_id).await;
        }
    }
}

/// Serialize one outbound event onto the socket.
async fn send_event(socket: &mut WebSocket, client_id: ClientId, event: &ServerEvent) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: failed to serialize event");
            return Ok(());
        }
    };

    if !event.is_stream() {
        info!(%client_id, event = event.name(), "ws: send");
    }

    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
