//! In-progress stroke relay: ephemeral per-stroke point buffers.
//!
//! DESIGN
//! ======
//! Streaming events (`stroke:start` / `stroke:point` / `stroke:end`) pass
//! through here; nothing in this module touches `StrokeHistory`. A context
//! is ephemeral: opened on start, extended point by point, and consumed on
//! end, which yields the completed path for the one authoritative append.
//! A point for a key with no open context is dropped silently; the loss is
//! accepted.
//!
//! The same type serves both sides of the wire. The server's instance is
//! the finalize source; a client's instance holds the rendering contexts
//! for peers' unfinished strokes.

#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;

use std::collections::HashMap;

use crate::stroke::{ClientId, Point, StrokeId};

/// Composite key for an in-progress stroke. Two clients may use the same
/// stroke id without colliding; only the pair identifies a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamKey {
    pub author: ClientId,
    pub stroke: StrokeId,
}

/// Buffered state of one unfinished stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenStroke {
    pub color: String,
    pub width: f64,
    pub points: Vec<Point>,
}

/// Pass-through store of open stroke contexts.
#[derive(Debug, Default)]
pub struct StreamRelay {
    open: HashMap<StreamKey, OpenStroke>,
}

impl StreamRelay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a context with its first point. A second start for the same key
    /// replaces the context; the displaced buffer is returned for the caller
    /// to log.
    pub fn start(&mut self, key: StreamKey, color: String, width: f64, first: Point) -> Option<OpenStroke> {
        self.open.insert(key, OpenStroke { color, width, points: vec![first] })
    }

    /// Append a point to an open context. Returns `false` when no context
    /// exists for the key; the point is dropped.
    pub fn point(&mut self, key: StreamKey, point: Point) -> bool {
        match self.open.get_mut(&key) {
            Some(ctx) => {
                ctx.points.push(point);
                true
            }
            None => false,
        }
    }

    /// Close a context, appending the optional final point, and yield the
    /// buffered stroke. Returns `None` for an unknown key.
    pub fn end(&mut self, key: StreamKey, final_point: Option<Point>) -> Option<OpenStroke> {
        let mut ctx = self.open.remove(&key)?;
        if let Some(p) = final_point {
            ctx.points.push(p);
        }
        Some(ctx)
    }

    /// Drop every open context belonging to `author`. Called on disconnect:
    /// the strokes are abandoned and will never be finalized.
    pub fn abandon(&mut self, author: ClientId) -> usize {
        let before = self.open.len();
        self.open.retain(|key, _| key.author != author);
        before - self.open.len()
    }

    /// Whether a context is open for the key.
    #[must_use]
    pub fn is_open(&self, key: StreamKey) -> bool {
        self.open.contains_key(&key)
    }

    /// The open context for a key, if any.
    #[must_use]
    pub fn get(&self, key: StreamKey) -> Option<&OpenStroke> {
        self.open.get(&key)
    }

    /// Iterate over every open context, for live rendering.
    pub fn iter(&self) -> impl Iterator<Item = (&StreamKey, &OpenStroke)> {
        self.open.iter()
    }

    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}
