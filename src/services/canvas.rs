//! Canvas service: the serialized mutation path for the shared history.
//!
//! DESIGN
//! ======
//! Every operation takes the canvas write lock, applies the mutation, and
//! queues the resulting broadcast to all client channels before releasing
//! the lock. Nothing under the lock performs I/O; queueing is `try_send`.
//! Acceptance order is therefore identical to each client's delivery order.
//!
//! ERROR HANDLING
//! ==============
//! Client-visible failure does not exist on this path. Duplicate appends,
//! undo on an empty history, redo with an empty buffer, and stream events
//! for unknown contexts are all absorbed: they get logged and leave the
//! state untouched, with no broadcast.

use tracing::{debug, info, warn};

use crate::color;
use crate::protocol::ServerEvent;
use crate::relay::StreamKey;
use crate::state::{AppState, CanvasState};
use crate::stroke::{ClientId, Point, Stroke, StrokeId, width_is_valid};

// =============================================================================
// OUTCOMES
// =============================================================================

/// What happened to an append attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Stroke accepted and broadcast to every client.
    Appended,
    /// Id already present in history or the redo buffer; ignored.
    Duplicate,
    /// Stroke failed validation; ignored.
    Invalid,
}

/// What happened to an undo/redo attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// History changed; the new snapshot was broadcast.
    Stepped,
    /// Nothing to undo or redo; no broadcast.
    Noop,
}

// =============================================================================
// APPEND / UNDO / REDO / CLEAR
// =============================================================================

/// Append a finalized stroke to the authoritative history.
///
/// The author id on the stroke is overwritten with the sending connection's
/// id; clients cannot claim authorship for each other. On success the stroke
/// is broadcast to ALL clients including the author, whose optimistic copy
/// merges by id.
pub async fn append_stroke(state: &AppState, author: ClientId, mut stroke: Stroke) -> AppendOutcome {
    stroke.author = author;
    stroke.color = color::normalize_hex_color(&stroke.color, color::DEFAULT_PEN);

    if let Err(e) = stroke.validate() {
        warn!(%author, stroke_id = %stroke.id, error = %e, "ignoring invalid stroke");
        return AppendOutcome::Invalid;
    }

    let mut canvas = state.canvas.write().await;
    accept_stroke(&mut canvas, stroke)
}

/// Undo the most recent stroke, regardless of author, and broadcast the new
/// snapshot. An empty history is a quiet no-op: nothing to undo, nothing
/// sent.
pub async fn undo(state: &AppState, requested_by: ClientId) -> StepOutcome {
    let mut canvas = state.canvas.write().await;
    match canvas.history.undo() {
        Some(stroke_id) => {
            canvas.broadcast(&ServerEvent::CanvasReset { strokes: canvas.history.snapshot() }, None);
            info!(%requested_by, %stroke_id, strokes = canvas.history.len(), "stroke undone");
            StepOutcome::Stepped
        }
        None => {
            debug!(%requested_by, "nothing to undo");
            StepOutcome::Noop
        }
    }
}

/// Restore the most recently undone stroke and broadcast the new snapshot.
/// An empty redo buffer is a quiet no-op.
pub async fn redo(state: &AppState, requested_by: ClientId) -> StepOutcome {
    let mut canvas = state.canvas.write().await;
    match canvas.history.redo() {
        Some(stroke_id) => {
            canvas.broadcast(&ServerEvent::CanvasReset { strokes: canvas.history.snapshot() }, None);
            info!(%requested_by, %stroke_id, strokes = canvas.history.len(), "stroke redone");
            StepOutcome::Stepped
        }
        None => {
            debug!(%requested_by, "nothing to redo");
            StepOutcome::Noop
        }
    }
}

/// Wipe the canvas, redo buffer included, and broadcast `canvas:clear` to
/// every client. The clear is its own event, not an empty snapshot; receivers
/// drop their redo candidates and live overlays along with the history.
pub async fn clear(state: &AppState, requested_by: ClientId) {
    let mut canvas = state.canvas.write().await;
    let discarded = canvas.history.clear();
    canvas.broadcast(&ServerEvent::CanvasClear, None);
    info!(%requested_by, discarded, "canvas cleared");
}

// =============================================================================
// STREAMING
// =============================================================================

/// Open a streamed stroke and relay the start to the author's peers.
/// Returns `false` when the parameters were invalid and nothing was opened.
pub async fn stream_start(
    state: &AppState,
    author: ClientId,
    stroke_id: StrokeId,
    color_raw: &str,
    width: f64,
    point: Point,
) -> bool {
    if !width_is_valid(width) || !point.is_finite() {
        warn!(%author, %stroke_id, width, "ignoring stroke start with invalid parameters");
        return false;
    }
    let stroke_color = color::normalize_hex_color(color_raw, color::DEFAULT_PEN);

    let mut canvas = state.canvas.write().await;
    let key = StreamKey { author, stroke: stroke_id };
    if canvas.relay.start(key, stroke_color.clone(), width, point).is_some() {
        debug!(%author, %stroke_id, "restarted an already-open stroke");
    }
    canvas.broadcast(
        &ServerEvent::StrokeStart { author_id: author, stroke_id, color: stroke_color, width, x: point.x, y: point.y },
        Some(author),
    );
    true
}

/// Relay one point of a streamed stroke. A point for an unknown context is
/// dropped without any observable change; returns whether it was relayed.
pub async fn stream_point(state: &AppState, author: ClientId, stroke_id: StrokeId, point: Point) -> bool {
    if !point.is_finite() {
        warn!(%author, %stroke_id, "ignoring non-finite stroke point");
        return false;
    }

    let mut canvas = state.canvas.write().await;
    let key = StreamKey { author, stroke: stroke_id };
    if !canvas.relay.point(key, point) {
        debug!(%author, %stroke_id, "dropping point for unknown stroke");
        return false;
    }
    canvas.broadcast(&ServerEvent::stroke_point(author, stroke_id, point), Some(author));
    true
}

/// Close a streamed stroke: relay the end to peers, then finalize the
/// buffered path into history. This is the streamed path's single finalize
/// trigger. Returns `None` when no context was open for the key.
pub async fn stream_end(
    state: &AppState,
    author: ClientId,
    stroke_id: StrokeId,
    final_point: Option<Point>,
) -> Option<AppendOutcome> {
    if final_point.is_some_and(|p| !p.is_finite()) {
        warn!(%author, %stroke_id, "ignoring stroke end with non-finite point");
        return Some(AppendOutcome::Invalid);
    }

    let mut canvas = state.canvas.write().await;
    let key = StreamKey { author, stroke: stroke_id };
    let Some(open) = canvas.relay.end(key, final_point) else {
        debug!(%author, %stroke_id, "dropping end for unknown stroke");
        return None;
    };

    canvas.broadcast(
        &ServerEvent::StrokeEnd { author_id: author, stroke_id, x: final_point.map(|p| p.x), y: final_point.map(|p| p.y) },
        Some(author),
    );

    let stroke = Stroke { id: stroke_id, author, color: open.color, width: open.width, points: open.points };
    Some(accept_stroke(&mut canvas, stroke))
}

// =============================================================================
// HELPERS
// =============================================================================

/// Append into history and queue the broadcast, inside the caller's critical
/// section.
fn accept_stroke(canvas: &mut CanvasState, stroke: Stroke) -> AppendOutcome {
    let author = stroke.author;
    let stroke_id = stroke.id;
    match canvas.history.append(stroke.clone()) {
        Ok(()) => {
            canvas.broadcast(&ServerEvent::StrokeAdd { stroke }, None);
            info!(%author, %stroke_id, strokes = canvas.history.len(), "stroke appended");
            AppendOutcome::Appended
        }
        Err(e) => {
            warn!(%author, %stroke_id, error = %e, "ignoring duplicate stroke");
            AppendOutcome::Duplicate
        }
    }
}

#[cfg(test)]
#[path = "canvas_test.rs"]
mod tests;
