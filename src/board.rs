//! Board document model.
//!
//! A `Board` is the whole document: an ordered sequence of columns, each an
//! ordered sequence of tasks, plus board-level settings and a save
//! timestamp. Column and task ids are ULID strings, unique across the
//! document; sequence index equals display order.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::config::Config;

/// Color given to columns created without an explicit color.
pub const DEFAULT_COLUMN_COLOR: &str = "#dddddd";

/// Title given to boards loaded from documents that omit one.
pub const DEFAULT_BOARD_TITLE: &str = "Untitled Board";

/// Generate a collision-resistant string id for a task or column.
pub fn new_id() -> String {
    Ulid::new().to_string()
}

/// A single piece of free text on the board.
///
/// `id` is immutable once created; `text` is opaque to the core (the view
/// layer may render it as markdown).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub text: String,
}

impl Task {
    /// Create an empty task with a fresh id.
    pub fn new() -> Self {
        Self {
            id: new_id(),
            text: String::new(),
        }
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

/// A named, colored, ordered list of tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub id: String,
    pub title: String,
    pub color: String,
    pub tasks: Vec<Task>,
}

impl Column {
    /// Create an empty column with a fresh id and the default color.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            color: DEFAULT_COLUMN_COLOR.to_string(),
            tasks: Vec::new(),
        }
    }

    /// Index of a task within this column.
    pub(crate) fn task_index(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == task_id)
    }
}

/// The whole document owned by the state core.
///
/// Exactly one live board exists inside a [`crate::BoardState`] at a time:
/// created at construction or on load, replaced wholesale on load/rollback,
/// mutated in place for incremental edits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Board {
    pub title: String,
    pub cols: Vec<Column>,
    pub autosave: bool,
    #[serde(rename = "saveToFile")]
    pub save_to_file: bool,
    /// Milliseconds since the epoch, refreshed right before every save.
    pub timestamp: i64,
}

impl Board {
    /// Create an empty board with default settings.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            cols: Vec::new(),
            autosave: false,
            save_to_file: false,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Create an empty board with settings taken from `config`.
    pub fn from_config(title: impl Into<String>, config: &Config) -> Self {
        let mut board = Self::new(title);
        board.autosave = config.default_autosave;
        board
    }

    /// Content equality, ignoring `timestamp`.
    ///
    /// The timestamp only records when the document was last handed to the
    /// transport; two logically equal boards may differ by it.
    pub fn content_eq(&self, other: &Board) -> bool {
        self.title == other.title
            && self.cols == other.cols
            && self.autosave == other.autosave
            && self.save_to_file == other.save_to_file
    }

    pub(crate) fn column_index(&self, column_id: &str) -> Option<usize> {
        self.cols.iter().position(|col| col.id == column_id)
    }

    pub(crate) fn column_mut(&mut self, column_id: &str) -> Option<&mut Column> {
        self.cols.iter_mut().find(|col| col.id == column_id)
    }

    /// Locate a task anywhere on the board as `(column index, task index)`.
    pub(crate) fn locate_task(&self, task_id: &str) -> Option<(usize, usize)> {
        self.cols.iter().enumerate().find_map(|(col_index, col)| {
            col.task_index(task_id).map(|task_index| (col_index, task_index))
        })
    }
}
