//! Bounded undo/redo stacks of committed-stroke snapshots.

use crate::document::HistorySnapshot;
use std::collections::VecDeque;

/// Default maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Undo/redo history.
///
/// The undo stack holds at most `max_depth` snapshots; pushing onto a full
/// stack evicts the oldest one. The redo stack is unbounded but can never
/// grow past the number of undos performed since the last new action.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<HistorySnapshot>,
    redo_stack: Vec<HistorySnapshot>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create an empty history with the default depth.
    pub fn new() -> Self {
        Self::with_max_depth(MAX_UNDO_HISTORY)
    }

    /// Create an empty history. A depth of zero is treated as one.
    pub fn with_max_depth(max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Get the undo depth limit.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Push a snapshot onto the undo stack, evicting the oldest if full.
    /// Returns true if a snapshot was evicted.
    pub fn push_undo(&mut self, snapshot: HistorySnapshot) -> bool {
        self.undo_stack.push_back(snapshot);

        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
            log::debug!("Undo history full, evicted oldest snapshot");
            return true;
        }
        false
    }

    /// Pop the most recent undo snapshot.
    pub fn pop_undo(&mut self) -> Option<HistorySnapshot> {
        self.undo_stack.pop_back()
    }

    /// Push a snapshot onto the redo stack.
    pub fn push_redo(&mut self, snapshot: HistorySnapshot) {
        self.redo_stack.push(snapshot);
    }

    /// Pop the most recent redo snapshot.
    pub fn pop_redo(&mut self) -> Option<HistorySnapshot> {
        self.redo_stack.pop()
    }

    /// Invalidate redo; called on every new action.
    pub fn clear_redo(&mut self) {
        self.redo_stack.clear();
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo snapshots.
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo snapshots.
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo snapshots from oldest to newest.
    pub fn undo_snapshots(&self) -> impl Iterator<Item = &HistorySnapshot> {
        self.undo_stack.iter()
    }
}
