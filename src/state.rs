//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! wraps the one shared canvas: authoritative history, open stream contexts,
//! and the connected clients. Mutations take the write lock, and every
//! broadcast produced by a mutation is queued to the per-client channels
//! before that lock is released; per-channel FIFO delivery then shows every
//! client the same mutation order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};

use crate::history::StrokeHistory;
use crate::protocol::ServerEvent;
use crate::relay::StreamRelay;
use crate::stroke::ClientId;

// =============================================================================
// CANVAS STATE
// =============================================================================

/// Presence info for one connection.
#[derive(Debug, Clone)]
pub struct ConnectedUser {
    /// Assigned presence color (hex).
    pub color: String,
}

/// Live state of the shared canvas.
pub struct CanvasState {
    /// Authoritative stroke sequence and redo buffer.
    pub history: StrokeHistory,
    /// Open streamed-stroke contexts, keyed by (author, stroke id).
    pub relay: StreamRelay,
    /// Connected clients: `client_id` -> sender for outgoing events.
    pub clients: HashMap<ClientId, mpsc::Sender<ServerEvent>>,
    /// Presence info keyed by connection.
    pub users: HashMap<ClientId, ConnectedUser>,
}

impl CanvasState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: StrokeHistory::new(),
            relay: StreamRelay::new(),
            clients: HashMap::new(),
            users: HashMap::new(),
        }
    }

    /// Queue an event to every connected client, optionally excluding one.
    pub fn broadcast(&self, event: &ServerEvent, exclude: Option<ClientId>) {
        for (client_id, tx) in &self.clients {
            if exclude == Some(*client_id) {
                continue;
            }
            // Best-effort: if a client's channel is full, skip it. The
            // client recovers at its next snapshot.
            let _ = tx.try_send(event.clone());
        }
    }

    /// Queue an event to a single client.
    pub fn send_to(&self, client_id: ClientId, event: &ServerEvent) {
        if let Some(tx) = self.clients.get(&client_id) {
            let _ = tx.try_send(event.clone());
        }
    }
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; the canvas itself is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub canvas: Arc<RwLock<CanvasState>>,
    /// Canonical canvas background color. An eraser stroke is this color.
    pub background: String,
}

impl AppState {
    #[must_use]
    pub fn new(background: String) -> Self {
        Self { canvas: Arc::new(RwLock::new(CanvasState::new())), background }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
