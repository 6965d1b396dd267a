//! Authoritative stroke history with a tail-based redo buffer.
//!
//! DESIGN
//! ======
//! `StrokeHistory` is the single source of truth for what is on the canvas.
//! Position in the history vector is z-order: rendering replays it front to
//! back. Undone strokes move onto the redo stack; any fresh append discards
//! that stack entirely.
//!
//! INVARIANTS
//! ==========
//! - A stroke id lives in at most one of history and the redo buffer.
//! - `append` clears the redo buffer.
//! - `undo`/`redo` move exactly one stroke between the two tails; on empty
//!   input they report a no-op and change nothing.
//!
//! Undo is global and tail-based: it removes the most recent stroke
//! regardless of author. Removing an arbitrary stroke by id would be an
//! extension of this type, not a change to these operations.

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;

use std::collections::HashSet;

use crate::stroke::{Stroke, StrokeId};

/// Why an append was refused.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// The id is already present in history or the redo buffer.
    #[error("duplicate stroke id: {0}")]
    DuplicateStroke(StrokeId),
}

/// Server-owned ordered stroke sequence plus redo buffer.
#[derive(Debug, Default)]
pub struct StrokeHistory {
    history: Vec<Stroke>,
    redo: Vec<Stroke>,
    /// Ids present in either vector, for O(1) duplicate checks.
    ids: HashSet<StrokeId>,
}

impl StrokeHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized stroke. Clears the redo buffer on success.
    ///
    /// # Errors
    ///
    /// `DuplicateStroke` if the id is already present in history or the redo
    /// buffer. Duplicates are never fatal; callers log and move on.
    pub fn append(&mut self, stroke: Stroke) -> Result<(), HistoryError> {
        if self.ids.contains(&stroke.id) {
            return Err(HistoryError::DuplicateStroke(stroke.id));
        }
        for undone in self.redo.drain(..) {
            self.ids.remove(&undone.id);
        }
        self.ids.insert(stroke.id);
        self.history.push(stroke);
        Ok(())
    }

    /// Move the most recent stroke onto the redo buffer. Returns the moved
    /// id, or `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<StrokeId> {
        let stroke = self.history.pop()?;
        let id = stroke.id;
        self.redo.push(stroke);
        Some(id)
    }

    /// Move the most recently undone stroke back onto the history tail.
    /// Returns the restored id, or `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<StrokeId> {
        let stroke = self.redo.pop()?;
        let id = stroke.id;
        self.history.push(stroke);
        Some(id)
    }

    /// Ordered copy of the current history, oldest first. This is the
    /// rendering order and the payload of every `canvas:reset`.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Stroke> {
        self.history.clone()
    }

    /// Drop everything: history, redo buffer, and known ids. Returns how
    /// many strokes were discarded.
    pub fn clear(&mut self) -> usize {
        let discarded = self.history.len() + self.redo.len();
        self.history.clear();
        self.redo.clear();
        self.ids.clear();
        discarded
    }

    /// Whether `id` is present in history or the redo buffer.
    #[must_use]
    pub fn contains(&self, id: StrokeId) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Number of strokes waiting in the redo buffer.
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}
