//! drawdash: a collaborative drawing canvas with an authoritative stroke
//! history.
//!
//! ARCHITECTURE
//! ============
//! One server process owns the canvas. Clients connect over a websocket,
//! stream in-progress strokes for live preview, and submit finalized strokes
//! for ordered append. Undo and redo are global and tail-based; the server
//! reconciles them by broadcasting full snapshots. Each client keeps an
//! optimistic local mirror (`view::CanvasView`) that converges to the
//! authority through id-based merges and snapshot replacement.

pub mod color;
pub mod history;
pub mod protocol;
pub mod relay;
pub mod routes;
pub mod services;
pub mod state;
pub mod stroke;
pub mod view;
