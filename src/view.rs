//! Client-side canvas view: the optimistic mirror a client renders from.
//!
//! DESIGN
//! ======
//! The view owns no transport. It produces `ClientEvent`s for the embedding
//! client to send and consumes `ServerEvent`s the client receives, keeping
//! three layers a renderer composites in order:
//!
//! 1. `strokes()`: finalized history, last known authoritative order
//! 2. `live_strokes()`: peers' unfinished strokes, relayed point by point
//! 3. `drawing()`: this client's own unfinished stroke
//!
//! Local operations apply immediately so drawing never waits on the network.
//! Convergence is by id: a `stroke:add` replaces any optimistic copy with the
//! same id, and a `canvas:reset` replaces the history wholesale, discarding
//! whatever divergence accumulated. A `canvas:clear` empties every layer, the
//! redo stack included. `can_undo`/`can_redo` are advisory; the authority
//! alone decides whether an `undo`/`redo` does anything.

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;

use std::collections::HashSet;

use uuid::Uuid;

use crate::color::{self, DEFAULT_BACKGROUND, DEFAULT_PEN};
use crate::protocol::{ClientEvent, ServerEvent};
use crate::relay::{OpenStroke, StreamKey, StreamRelay};
use crate::stroke::{ClientId, Point, Stroke, StrokeId, width_is_valid};

/// Connection state as seen by the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Local mirror of one canvas.
#[derive(Debug, Default)]
pub struct CanvasView {
    history: Vec<Stroke>,
    redo_stack: Vec<Stroke>,
    live: StreamRelay,
    drawing: Option<Stroke>,
    client_id: Option<ClientId>,
    background: String,
    status: ConnectionStatus,
    user_count: usize,
}

impl CanvasView {
    #[must_use]
    pub fn new() -> Self {
        Self { background: DEFAULT_BACKGROUND.to_string(), ..Self::default() }
    }

    // =========================================================================
    // LOCAL DRAWING
    // =========================================================================

    /// Open a new stroke under a fresh id. Returns the `stroke:start` to send,
    /// or `None` if a stroke is already open or the parameters are unusable.
    pub fn begin_stroke(&mut self, color: &str, width: f64, at: Point) -> Option<ClientEvent> {
        if self.drawing.is_some() || !width_is_valid(width) || !at.is_finite() {
            return None;
        }

        let stroke = Stroke {
            id: Uuid::new_v4(),
            author: self.client_id.unwrap_or_else(Uuid::nil),
            color: color::normalize_hex_color(color, DEFAULT_PEN),
            width,
            points: vec![at],
        };
        let event = ClientEvent::StrokeStart {
            stroke_id: stroke.id,
            color: stroke.color.clone(),
            width,
            x: at.x,
            y: at.y,
        };
        self.drawing = Some(stroke);
        Some(event)
    }

    /// Extend the open stroke. Returns the `stroke:point` to send.
    pub fn extend_stroke(&mut self, at: Point) -> Option<ClientEvent> {
        if !at.is_finite() {
            return None;
        }
        let drawing = self.drawing.as_mut()?;
        drawing.points.push(at);
        Some(ClientEvent::StrokePoint { stroke_id: drawing.id, x: at.x, y: at.y })
    }

    /// Close the open stroke and append it locally. Returns the `stroke:end`
    /// to send; the authoritative `stroke:add` echo later replaces the
    /// optimistic copy by id.
    pub fn finish_stroke(&mut self, at: Option<Point>) -> Option<ClientEvent> {
        let mut stroke = self.drawing.take()?;
        let final_point = at.filter(|p| p.is_finite());
        if let Some(p) = final_point {
            stroke.points.push(p);
        }
        let event = ClientEvent::StrokeEnd {
            stroke_id: stroke.id,
            x: final_point.map(|p| p.x),
            y: final_point.map(|p| p.y),
        };
        self.apply_add(stroke);
        Some(event)
    }

    // =========================================================================
    // LOCAL UNDO / REDO
    // =========================================================================

    /// Undo the tail stroke locally. Returns the `undo` to send, or `None`
    /// when the local history is empty.
    pub fn undo_local(&mut self) -> Option<ClientEvent> {
        let stroke = self.history.pop()?;
        self.redo_stack.push(stroke);
        Some(ClientEvent::Undo)
    }

    /// Restore the most recently undone stroke locally. Returns the `redo`
    /// to send, or `None` when the local redo stack is empty.
    pub fn redo_local(&mut self) -> Option<ClientEvent> {
        let stroke = self.redo_stack.pop()?;
        self.history.push(stroke);
        Some(ClientEvent::Redo)
    }

    /// Advisory: whether an `undo` is worth sending.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Advisory: whether a `redo` is worth sending.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // =========================================================================
    // SERVER EVENTS
    // =========================================================================

    /// Fold one server event into the view.
    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::StrokeAdd { stroke } => self.apply_add(stroke),
            ServerEvent::CanvasReset { strokes } => self.apply_reset(strokes),
            ServerEvent::StrokeStart { author_id, stroke_id, color, width, x, y } => {
                let key = StreamKey { author: author_id, stroke: stroke_id };
                self.live.start(key, color, width, Point::new(x, y));
            }
            ServerEvent::StrokePoint { author_id, stroke_id, x, y } => {
                let key = StreamKey { author: author_id, stroke: stroke_id };
                self.live.point(key, Point::new(x, y));
            }
            ServerEvent::StrokeEnd { author_id, stroke_id, .. } => {
                // The overlay is done either way: the authoritative stroke:add
                // for this id follows, or the append was refused and nothing
                // does.
                let key = StreamKey { author: author_id, stroke: stroke_id };
                self.live.end(key, None);
            }
            ServerEvent::CanvasClear => self.apply_clear(),
            ServerEvent::SessionConnected { client_id, background, .. } => {
                self.client_id = Some(client_id);
                self.background = background;
                self.status = ConnectionStatus::Connected;
            }
            ServerEvent::UserJoined { user_count, .. } => {
                self.user_count = user_count;
            }
            ServerEvent::UserLeft { client_id, user_count } => {
                // A departed author's open strokes will never finalize; the
                // authority dropped its contexts and we drop ours.
                self.live.abandon(client_id);
                self.user_count = user_count;
            }
        }
    }

    /// Merge one finalized stroke by id: replace an existing copy in place,
    /// otherwise append. Mirrors the authority's rule that every accepted
    /// append empties the redo buffer.
    fn apply_add(&mut self, stroke: Stroke) {
        self.redo_stack.clear();
        if let Some(existing) = self.history.iter_mut().find(|s| s.id == stroke.id) {
            *existing = stroke;
        } else {
            self.history.push(stroke);
        }
    }

    /// Replace the history with an authoritative snapshot.
    ///
    /// The redo stack is reconciled by id so it stays useful across resets:
    /// strokes the snapshot dropped become redo candidates, and strokes it
    /// restored stop being ones. A bootstrap snapshot is the exception: it
    /// arrives before `session:connected` flips the status and carries the
    /// whole truth, possibly a restarted authority's empty history, so it
    /// replaces the redo stack along with everything else.
    fn apply_reset(&mut self, strokes: Vec<Stroke>) {
        if self.status != ConnectionStatus::Connected {
            self.redo_stack.clear();
            self.history = strokes;
            return;
        }
        let incoming: HashSet<StrokeId> = strokes.iter().map(|s| s.id).collect();
        let removed: Vec<Stroke> =
            self.history.drain(..).filter(|s| !incoming.contains(&s.id)).collect();
        self.redo_stack.retain(|s| !incoming.contains(&s.id));
        self.redo_stack.extend(removed);
        self.history = strokes;
    }

    /// Wipe the canvas. Unlike a reset, a clear leaves nothing to redo and
    /// drops the live overlay; only this client's own unfinished stroke
    /// survives, to be finalized onto the blank canvas.
    fn apply_clear(&mut self) {
        self.history.clear();
        self.redo_stack.clear();
        self.live = StreamRelay::new();
    }

    /// Record a transport status change. Dropping to `Disconnected` discards
    /// the in-progress stroke and the live overlay; the next snapshot rebuilds
    /// everything that matters.
    pub fn set_status(&mut self, status: ConnectionStatus) {
        if status == ConnectionStatus::Disconnected {
            self.drawing = None;
            self.live = StreamRelay::new();
        }
        self.status = status;
    }

    // =========================================================================
    // RENDER ACCESS
    // =========================================================================

    /// Finalized strokes in rendering order.
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.history
    }

    /// This client's unfinished stroke, if any.
    #[must_use]
    pub fn drawing(&self) -> Option<&Stroke> {
        self.drawing.as_ref()
    }

    /// Peers' unfinished strokes.
    pub fn live_strokes(&self) -> impl Iterator<Item = (&StreamKey, &OpenStroke)> {
        self.live.iter()
    }

    #[must_use]
    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.user_count
    }

    /// Current canvas background color.
    #[must_use]
    pub fn background(&self) -> &str {
        &self.background
    }

    /// Whether a stroke erases rather than draws on this canvas.
    #[must_use]
    pub fn is_eraser(&self, stroke: &Stroke) -> bool {
        color::is_background(&stroke.color, &self.background)
    }
}
