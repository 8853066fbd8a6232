//! Bounded undo history for edits of the active artifact.
//!
//! The stack always ends with the image currently on display. Pushing past
//! `max_depth` drops the oldest snapshot; undo needs at least two entries so
//! there is a previous state to return to.

use std::collections::VecDeque;

pub const DEFAULT_MAX_DEPTH: usize = 3;

#[derive(Debug, Clone)]
pub struct EditHistory {
    snapshots: VecDeque<Vec<u8>>,
    max_depth: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl EditHistory {
    /// A depth of zero is treated as one.
    pub fn new(max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        Self {
            snapshots: VecDeque::with_capacity(max_depth + 1),
            max_depth,
        }
    }

    pub fn push(&mut self, snapshot: Vec<u8>) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > self.max_depth {
            self.snapshots.pop_front();
        }
    }

    /// Drop the current snapshot and return the one before it.
    ///
    /// With fewer than two entries nothing changes and `None` is returned.
    pub fn undo(&mut self) -> Option<&[u8]> {
        if !self.can_undo() {
            return None;
        }
        self.snapshots.pop_back();
        self.snapshots.back().map(Vec::as_slice)
    }

    pub fn can_undo(&self) -> bool {
        self.snapshots.len() >= 2
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Start a new lineage rooted at `snapshot`.
    pub fn reset_to(&mut self, snapshot: Vec<u8>) {
        self.clear();
        self.push(snapshot);
    }

    pub fn current(&self) -> Option<&[u8]> {
        self.snapshots.back().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
