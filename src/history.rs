//! Append-only revision log.
//!
//! Every committed change pushes a [`HistoryEntry`] pairing a complete board
//! snapshot with metadata about the change that snapshot precedes: the n-th
//! entry holds the board as it existed *before* the n-th committed change.
//! Rollback appends too ([`ChangeKind::HistoryReversed`]); the log is never
//! truncated, so any recorded state stays addressable for preview.

use serde::{Deserialize, Serialize};

use crate::board::Board;

/// What kind of committed change an entry precedes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    AutosaveToggled,
    SaveToFileToggled,
    BoardTitle,
    ColumnAdded,
    ColumnDeleted,
    ColumnTitle,
    ColumnColor,
    TaskAdded,
    TaskDeleted,
    TaskMoved,
    TaskText,
    HistoryReversed,
}

/// A committed change: full pre-change snapshot plus metadata.
///
/// Entries are read-only to consumers and never mutated after being pushed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub change: ChangeKind,
    pub data: Board,
    pub details: String,
}

impl HistoryEntry {
    pub fn new(change: ChangeKind, data: Board, details: impl Into<String>) -> Self {
        Self {
            change,
            data,
            details: details.into(),
        }
    }
}

/// Append-only, chronologically ordered sequence of committed snapshots.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Entries can never be removed or reordered.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Defensive copy of the full log.
    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.clone()
    }
}
