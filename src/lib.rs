//! tabula - board state engine
//!
//! This library is the data/state core behind a kanban-style board editor:
//! it owns the canonical board document, applies mutations requested by a
//! view layer, coalesces rapid-fire text edits into single committed
//! revisions, and keeps an append-only revision log supporting
//! point-in-time preview and rollback. Rendering, drag-and-drop gestures,
//! and editor-host chrome are the embedder's concern.
//!
//! # Core Concepts
//!
//! - **Board / Column / Task**: the document — ordered columns of ordered
//!   free-text tasks, plus board-level settings
//! - **Revision log**: append-only snapshots; rollback is a recorded jump,
//!   never a destructive pop
//! - **Debounced commits**: a typing burst produces one revision and one
//!   save, committed after a quiet period
//! - **Listeners**: synchronous fan-out of change and history notifications
//! - **Transport**: opaque save/load channel to whatever persists documents
//!
//! # Module Organization
//!
//! - `board`: the document model and id generation
//! - `config`: configuration loading from TOML
//! - `debounce`: keyed debounce/coalesce scheduler
//! - `error`: error types and result aliases
//! - `history`: the append-only revision log
//! - `schema`: wire shape and legacy-document normalization
//! - `state`: the state core owning the live board
//! - `transport`: save/load channel trait and implementations
//!
//! # Basic Usage
//!
//! ```
//! use tabula::{Board, BoardState};
//!
//! let state = BoardState::new(Board::new("Sprint 12"));
//! let column = state.add_column();
//! let task = state.add_task(&column).expect("column exists");
//!
//! let board = state.current_board();
//! assert_eq!(board.cols[0].tasks[0].id, task);
//! ```

pub mod board;
pub mod config;
pub mod debounce;
pub mod error;
pub mod history;
pub mod schema;
pub mod state;
pub mod transport;

pub use board::{Board, Column, Task, DEFAULT_COLUMN_COLOR};
pub use config::Config;
pub use error::{Error, Result};
pub use history::{ChangeKind, HistoryEntry};
pub use state::{BoardState, ListenerId};
pub use transport::{BoardTransport, FileTransport, MemoryTransport};
