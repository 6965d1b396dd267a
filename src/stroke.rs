//! Stroke model: ids, points, and the finalized stroke value.
//!
//! DESIGN
//! ======
//! A stroke is client-identified: the originating client assigns `StrokeId`
//! at `stroke:start`, and that id is the sole correlation and dedup key
//! everywhere (relay contexts, history membership, client-side merges). The
//! server stamps `author` at the connection boundary; whatever a client
//! claims is overwritten.
//!
//! Points are append-only while a stroke is streaming and frozen once it is
//! finalized. A single-point stroke is a dot, and is valid.

#[cfg(test)]
#[path = "stroke_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a stroke, assigned by the originating client.
pub type StrokeId = Uuid;

/// Unique identifier for a connection, assigned by the server at accept.
pub type ClientId = Uuid;

/// A single canvas coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite (no NaN, no infinities).
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A finalized stroke as stored in history and sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Client-assigned identifier; the sole dedup and correlation key.
    pub id: StrokeId,
    /// The connection that drew the stroke, stamped by the server.
    pub author: ClientId,
    /// Canonical `#rrggbb` color. An eraser stroke simply uses the canvas
    /// background color; there is no dedicated eraser kind.
    pub color: String,
    /// Brush width in canvas units. Strictly positive.
    pub width: f64,
    /// Ordered path. At least one point; a single point renders as a dot.
    pub points: Vec<Point>,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum StrokeError {
    #[error("stroke has no points")]
    Empty,
    #[error("stroke width must be positive and finite, got {0}")]
    BadWidth(f64),
    #[error("stroke contains a non-finite coordinate")]
    BadPoint,
}

/// Whether a brush width is usable: finite and strictly positive.
#[must_use]
pub fn width_is_valid(width: f64) -> bool {
    width.is_finite() && width > 0.0
}

impl Stroke {
    /// Validate the invariants every finalized stroke must satisfy.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: missing points, a non-positive
    /// or non-finite width, or a NaN/infinite coordinate.
    pub fn validate(&self) -> Result<(), StrokeError> {
        if self.points.is_empty() {
            return Err(StrokeError::Empty);
        }
        if !width_is_valid(self.width) {
            return Err(StrokeError::BadWidth(self.width));
        }
        if !self.points.iter().all(|p| p.is_finite()) {
            return Err(StrokeError::BadPoint);
        }
        Ok(())
    }
}
