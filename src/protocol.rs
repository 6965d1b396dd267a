//! Wire protocol: tagged JSON events between clients and the authority.
//!
//! DESIGN
//! ======
//! One JSON object per websocket text message, discriminated by `"type"`.
//! Required fields are enforced by deserialization, unknown fields are
//! ignored, and a message that fails to parse is dropped at the boundary
//! with a warning. The protocol has no error events; the server never
//! answers bad input.
//!
//! Client and server vocabularies are separate enums: the server enriches
//! relayed stream events with the author id, and `canvas:reset` plus the
//! presence events exist only in the server's direction.

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use crate::stroke::{ClientId, Point, Stroke, StrokeId};

// =============================================================================
// CLIENT → SERVER
// =============================================================================

/// Events a client may send to the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Open a streamed stroke with its first point.
    #[serde(rename = "stroke:start", rename_all = "camelCase")]
    StrokeStart { stroke_id: StrokeId, color: String, width: f64, x: f64, y: f64 },
    /// Extend a streamed stroke. Unknown ids are dropped by the server.
    #[serde(rename = "stroke:point", rename_all = "camelCase")]
    StrokePoint { stroke_id: StrokeId, x: f64, y: f64 },
    /// Close a streamed stroke, optionally with a final point. This is the
    /// finalize trigger: the server appends the buffered path to history.
    #[serde(rename = "stroke:end", rename_all = "camelCase")]
    StrokeEnd {
        stroke_id: StrokeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<f64>,
    },
    /// Submit a complete stroke without streaming it first.
    #[serde(rename = "stroke:add")]
    StrokeAdd { stroke: Stroke },
    /// Undo the most recent stroke, whoever drew it.
    #[serde(rename = "undo")]
    Undo,
    /// Restore the most recently undone stroke.
    #[serde(rename = "redo")]
    Redo,
    /// Wipe the canvas: history and redo buffer.
    #[serde(rename = "canvas:clear")]
    CanvasClear,
}

impl ClientEvent {
    /// The wire name of this event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::StrokeStart { .. } => "stroke:start",
            Self::StrokePoint { .. } => "stroke:point",
            Self::StrokeEnd { .. } => "stroke:end",
            Self::StrokeAdd { .. } => "stroke:add",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::CanvasClear => "canvas:clear",
        }
    }

    /// Stream events are high-frequency; callers skip logging them.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::StrokeStart { .. } | Self::StrokePoint { .. } | Self::StrokeEnd { .. })
    }
}

// =============================================================================
// SERVER → CLIENTS
// =============================================================================

/// Events the authority sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Relayed stream open, stamped with the author connection.
    #[serde(rename = "stroke:start", rename_all = "camelCase")]
    StrokeStart { author_id: ClientId, stroke_id: StrokeId, color: String, width: f64, x: f64, y: f64 },
    /// Relayed stream point.
    #[serde(rename = "stroke:point", rename_all = "camelCase")]
    StrokePoint { author_id: ClientId, stroke_id: StrokeId, x: f64, y: f64 },
    /// Relayed stream close. The authoritative `stroke:add` for the same id
    /// follows when the append was accepted.
    #[serde(rename = "stroke:end", rename_all = "camelCase")]
    StrokeEnd {
        author_id: ClientId,
        stroke_id: StrokeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<f64>,
    },
    /// A finalized stroke accepted into history. Sent to every connection,
    /// the author included; receivers merge by id.
    #[serde(rename = "stroke:add")]
    StrokeAdd { stroke: Stroke },
    /// Full ordered snapshot. Replaces the receiver's view wholesale. Also
    /// the first event every new connection receives.
    #[serde(rename = "canvas:reset")]
    CanvasReset { strokes: Vec<Stroke> },
    /// The canvas was wiped. Distinct from an empty snapshot: receivers drop
    /// their redo candidates and live overlays too, leaving nothing to redo.
    #[serde(rename = "canvas:clear")]
    CanvasClear,
    /// Identity for a new connection, sent right after its snapshot.
    #[serde(rename = "session:connected", rename_all = "camelCase")]
    SessionConnected { client_id: ClientId, color: String, background: String },
    /// A connection joined the canvas.
    #[serde(rename = "user:joined", rename_all = "camelCase")]
    UserJoined { client_id: ClientId, color: String, user_count: usize },
    /// A connection left the canvas.
    #[serde(rename = "user:left", rename_all = "camelCase")]
    UserLeft { client_id: ClientId, user_count: usize },
}

impl ServerEvent {
    /// The wire name of this event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::StrokeStart { .. } => "stroke:start",
            Self::StrokePoint { .. } => "stroke:point",
            Self::StrokeEnd { .. } => "stroke:end",
            Self::StrokeAdd { .. } => "stroke:add",
            Self::CanvasReset { .. } => "canvas:reset",
            Self::CanvasClear => "canvas:clear",
            Self::SessionConnected { .. } => "session:connected",
            Self::UserJoined { .. } => "user:joined",
            Self::UserLeft { .. } => "user:left",
        }
    }

    /// Stream relays are high-frequency; callers skip logging them.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::StrokeStart { .. } | Self::StrokePoint { .. } | Self::StrokeEnd { .. })
    }

    /// Convenience constructor for relayed stream points.
    #[must_use]
    pub fn stroke_point(author_id: ClientId, stroke_id: StrokeId, point: Point) -> Self {
        Self::StrokePoint { author_id, stroke_id, x: point.x, y: point.y }
    }
}
