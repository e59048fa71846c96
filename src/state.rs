//! Board state core.
//!
//! [`BoardState`] owns the one live board, applies every mutation, decides
//! which operations are history-worthy, coalesces text-edit bursts through
//! the [`Debouncer`], and fans out change/history notifications. Handles are
//! cheap to clone and share one interior; every operation is a synchronous
//! lock-mutate-unlock sequence, so mutations never interleave.
//!
//! Unresolved column/task ids are not errors: the operation silently no-ops,
//! leaving state, history, and listeners untouched.
//!
//! The debounced text operations (`change_board_title`,
//! `change_column_title`, `change_task_text`) arm timers on the ambient
//! tokio runtime and must be called from within one. Everything else is
//! runtime-free.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::board::{new_id, Board, Column, Task};
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::history::{ChangeKind, HistoryEntry, HistoryLog};
use crate::schema;
use crate::transport::BoardTransport;

/// Debounce key for board-title edits. Column and task edits key on the
/// column or task id, so independent typing targets coalesce independently.
const BOARD_TITLE_KEY: &str = "board";

/// Opaque handle identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ChangeListener = Arc<dyn Fn(&Board) + Send + Sync>;
type HistoryListener = Arc<dyn Fn(&HistoryEntry) + Send + Sync>;

/// The state core: owns the live board and the revision log.
///
/// Construct one per document; clones are handles onto the same state, which
/// is how timer callbacks and embedders share it. There is deliberately no
/// process-wide instance.
#[derive(Clone)]
pub struct BoardState {
    inner: Arc<Mutex<Inner>>,
    debouncer: Debouncer,
    commit_delay: Duration,
    default_column_color: String,
}

struct Inner {
    board: Board,
    history: HistoryLog,
    /// Original value per debounce key, captured on the first edit since the
    /// last commit. Present means a text transaction is open for that key.
    pending_edits: HashMap<String, String>,
    change_listeners: Vec<(ListenerId, ChangeListener)>,
    history_listeners: Vec<(ListenerId, HistoryListener)>,
    next_listener_id: u64,
    transport: Option<Arc<dyn BoardTransport>>,
}

impl BoardState {
    /// Create a state core owning `board`, with default configuration.
    pub fn new(board: Board) -> Self {
        Self::with_config(board, &Config::default())
    }

    /// Create a state core owning `board`, tuned by `config`.
    pub fn with_config(board: Board, config: &Config) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                board,
                history: HistoryLog::new(),
                pending_edits: HashMap::new(),
                change_listeners: Vec::new(),
                history_listeners: Vec::new(),
                next_listener_id: 0,
                transport: None,
            })),
            debouncer: Debouncer::new(),
            commit_delay: config.commit_delay(),
            default_column_color: config.default_column_color.clone(),
        }
    }

    /// Attach the persistence transport used by `save` and `load`.
    pub fn set_transport(&self, transport: Arc<dyn BoardTransport>) {
        self.lock().transport = Some(transport);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Listener registration
    // =========================================================================

    /// Register a listener fired on every live-board mutation and on
    /// preview/refresh. Returns the id used for removal.
    pub fn add_change_listener(
        &self,
        listener: impl Fn(&Board) + Send + Sync + 'static,
    ) -> ListenerId {
        let mut inner = self.lock();
        let id = ListenerId(inner.next_listener_id);
        inner.next_listener_id += 1;
        inner.change_listeners.push((id, Arc::new(listener)));
        id
    }

    pub fn remove_change_listener(&self, id: ListenerId) {
        self.lock().change_listeners.retain(|(lid, _)| *lid != id);
    }

    /// Register a listener fired only when an entry is appended to the
    /// revision log.
    pub fn add_history_listener(
        &self,
        listener: impl Fn(&HistoryEntry) + Send + Sync + 'static,
    ) -> ListenerId {
        let mut inner = self.lock();
        let id = ListenerId(inner.next_listener_id);
        inner.next_listener_id += 1;
        inner.history_listeners.push((id, Arc::new(listener)));
        id
    }

    pub fn remove_history_listener(&self, id: ListenerId) {
        self.lock().history_listeners.retain(|(lid, _)| *lid != id);
    }

    /// Fan out the live board to change listeners. Listeners run outside the
    /// lock, against a snapshot, so they may re-enter the core.
    fn notify_change(&self) {
        let (listeners, board) = {
            let inner = self.lock();
            (collect(&inner.change_listeners), inner.board.clone())
        };
        for listener in listeners {
            listener(&board);
        }
    }

    fn notify_change_with(&self, board: &Board) {
        let listeners = collect(&self.lock().change_listeners);
        for listener in listeners {
            listener(board);
        }
    }

    fn notify_history(&self, entry: &HistoryEntry) {
        let listeners = collect(&self.lock().history_listeners);
        for listener in listeners {
            listener(entry);
        }
    }

    // =========================================================================
    // Immediate operations
    // =========================================================================

    /// Append a new column titled `"Column {N+1}"` with the default color.
    /// Not history-worthy. Returns the new column's id.
    pub fn add_column(&self) -> String {
        let id = {
            let mut inner = self.lock();
            let column = Column {
                id: new_id(),
                title: format!("Column {}", inner.board.cols.len() + 1),
                color: self.default_column_color.clone(),
                tasks: Vec::new(),
            };
            let id = column.id.clone();
            inner.board.cols.push(column);
            id
        };
        debug!(column = %id, "column added");
        self.notify_change();
        self.autosave();
        id
    }

    /// Remove a column and all its tasks, recording the pre-removal board.
    pub fn remove_column(&self, column_id: &str) {
        let entry = {
            let mut inner = self.lock();
            let Some(index) = inner.board.column_index(column_id) else {
                return;
            };
            let title = inner.board.cols[index].title.clone();
            let snapshot = inner.board.clone();
            inner.board.cols.remove(index);
            let entry = HistoryEntry::new(
                ChangeKind::ColumnDeleted,
                snapshot,
                format!("Deleted column '{title}'"),
            );
            inner.history.push(entry.clone());
            entry
        };
        debug!(column = %column_id, "column removed");
        self.notify_history(&entry);
        self.notify_change();
        self.autosave();
    }

    /// Recolor a column, recording the pre-change board. No-op when the
    /// color is unchanged.
    pub fn change_column_color(&self, column_id: &str, color: &str) {
        let entry = {
            let mut inner = self.lock();
            let Some(index) = inner.board.column_index(column_id) else {
                return;
            };
            if inner.board.cols[index].color == color {
                return;
            }
            let snapshot = inner.board.clone();
            let column = &mut inner.board.cols[index];
            let old = std::mem::replace(&mut column.color, color.to_string());
            let title = column.title.clone();
            let entry = HistoryEntry::new(
                ChangeKind::ColumnColor,
                snapshot,
                format!("Changed color of column '{title}' from '{old}' to '{color}'"),
            );
            inner.history.push(entry.clone());
            entry
        };
        self.notify_history(&entry);
        self.notify_change();
        self.autosave();
    }

    /// Move a column to `new_index`. The final position equals `new_index`
    /// after the column is taken out of its current slot.
    pub fn move_column(&self, column_id: &str, new_index: usize) {
        {
            let mut inner = self.lock();
            let Some(index) = inner.board.column_index(column_id) else {
                return;
            };
            if new_index >= inner.board.cols.len() {
                return;
            }
            let column = inner.board.cols.remove(index);
            inner.board.cols.insert(new_index, column);
        }
        self.notify_change();
        self.autosave();
    }

    /// Insert a new empty task at the front of a column. Returns the new
    /// task's id, or `None` when the column does not resolve.
    pub fn add_task(&self, column_id: &str) -> Option<String> {
        let mut inner = self.lock();
        let Some(column) = inner.board.column_mut(column_id) else {
            return None;
        };
        let task = Task::new();
        let id = task.id.clone();
        column.tasks.insert(0, task);
        drop(inner);

        self.notify_change();
        self.autosave();
        Some(id)
    }

    /// Remove a task. Deleting a task that holds text is history-worthy (and
    /// autosaved); deleting an empty task is not, though the removal still
    /// happens and listeners are still told.
    pub fn remove_task(&self, column_id: &str, task_id: &str) {
        let entry = {
            let mut inner = self.lock();
            let Some(col_index) = inner.board.column_index(column_id) else {
                return;
            };
            let Some(task_index) = inner.board.cols[col_index].task_index(task_id) else {
                return;
            };
            let text = inner.board.cols[col_index].tasks[task_index].text.clone();
            let entry = if text.is_empty() {
                None
            } else {
                let title = inner.board.cols[col_index].title.clone();
                let snapshot = inner.board.clone();
                let entry = HistoryEntry::new(
                    ChangeKind::TaskDeleted,
                    snapshot,
                    format!("Deleted task '{text}' from column '{title}'"),
                );
                inner.history.push(entry.clone());
                Some(entry)
            };
            inner.board.cols[col_index].tasks.remove(task_index);
            entry
        };
        if let Some(entry) = &entry {
            self.notify_history(entry);
        }
        self.notify_change();
        if entry.is_some() {
            self.autosave();
        }
    }

    /// Move a task between positions, possibly across columns.
    ///
    /// `source_index` must address an existing task; `dest_index` may equal
    /// the destination length to append.
    pub fn move_task(
        &self,
        source_col: &str,
        dest_col: &str,
        source_index: usize,
        dest_index: usize,
    ) {
        {
            let mut inner = self.lock();
            let Some(from) = inner.board.column_index(source_col) else {
                return;
            };
            let Some(to) = inner.board.column_index(dest_col) else {
                return;
            };
            if source_index >= inner.board.cols[from].tasks.len() {
                return;
            }
            if dest_index > inner.board.cols[to].tasks.len() {
                return;
            }
            let task = inner.board.cols[from].tasks.remove(source_index);
            // Splice semantics: on a same-column move the removal shortened
            // the list, so a past-the-end destination appends.
            let tasks = &mut inner.board.cols[to].tasks;
            let index = dest_index.min(tasks.len());
            tasks.insert(index, task);
        }
        self.notify_change();
        self.autosave();
    }

    /// Toggle autosave. Not history-worthy and does not itself save.
    pub fn set_autosave(&self, value: bool) {
        {
            let mut inner = self.lock();
            if inner.board.autosave == value {
                return;
            }
            inner.board.autosave = value;
        }
        self.notify_change();
    }

    /// Toggle save-to-file. Not history-worthy and does not itself save.
    pub fn set_save_to_file(&self, value: bool) {
        {
            let mut inner = self.lock();
            if inner.board.save_to_file == value {
                return;
            }
            inner.board.save_to_file = value;
        }
        self.notify_change();
    }

    // =========================================================================
    // Debounced text operations
    // =========================================================================

    /// Retitle the board. The value lands on the live board immediately; the
    /// history entry commits once the burst goes quiet.
    pub fn change_board_title(&self, new_title: &str) {
        let schedule = {
            let mut inner = self.lock();
            let current = inner.board.title.clone();
            let original = inner
                .pending_edits
                .entry(BOARD_TITLE_KEY.to_string())
                .or_insert(current)
                .clone();
            inner.board.title = new_title.to_string();
            new_title != original
        };
        self.notify_change();
        if schedule {
            let state = self.clone();
            self.debouncer.schedule(
                history_key(BOARD_TITLE_KEY),
                self.commit_delay,
                move || state.commit_board_title(),
            );
            self.schedule_autosave(BOARD_TITLE_KEY);
        }
    }

    /// Retitle a column; same commit discipline as [`Self::change_board_title`].
    pub fn change_column_title(&self, column_id: &str, new_title: &str) {
        let schedule = {
            let mut inner = self.lock();
            let Some(index) = inner.board.column_index(column_id) else {
                return;
            };
            let current = inner.board.cols[index].title.clone();
            let original = inner
                .pending_edits
                .entry(column_id.to_string())
                .or_insert(current)
                .clone();
            inner.board.cols[index].title = new_title.to_string();
            new_title != original
        };
        self.notify_change();
        if schedule {
            let state = self.clone();
            let id = column_id.to_string();
            self.debouncer.schedule(
                history_key(column_id),
                self.commit_delay,
                move || state.commit_column_title(&id),
            );
            self.schedule_autosave(column_id);
        }
    }

    /// Edit a task's text; same commit discipline as
    /// [`Self::change_board_title`], keyed on the task id.
    pub fn change_task_text(&self, column_id: &str, task_id: &str, new_text: &str) {
        let schedule = {
            let mut inner = self.lock();
            let Some(col_index) = inner.board.column_index(column_id) else {
                return;
            };
            let Some(task_index) = inner.board.cols[col_index].task_index(task_id) else {
                return;
            };
            let current = inner.board.cols[col_index].tasks[task_index].text.clone();
            let original = inner
                .pending_edits
                .entry(task_id.to_string())
                .or_insert(current)
                .clone();
            inner.board.cols[col_index].tasks[task_index].text = new_text.to_string();
            new_text != original
        };
        self.notify_change();
        if schedule {
            let state = self.clone();
            let id = task_id.to_string();
            self.debouncer.schedule(
                history_key(task_id),
                self.commit_delay,
                move || state.commit_task_text(&id),
            );
            self.schedule_autosave(task_id);
        }
    }

    /// Commit every pending debounced action (history pushes and scheduled
    /// autosaves) immediately, without waiting out the quiet period.
    pub fn flush_edits(&self) {
        self.debouncer.flush_all();
    }

    fn schedule_autosave(&self, key: &str) {
        if !self.lock().board.autosave {
            return;
        }
        let state = self.clone();
        self.debouncer
            .schedule(save_key(key), self.commit_delay, move || state.save());
    }

    fn commit_board_title(&self) {
        let entry = {
            let mut inner = self.lock();
            let Some(original) = inner.pending_edits.remove(BOARD_TITLE_KEY) else {
                return;
            };
            let new_title = inner.board.title.clone();
            let mut snapshot = inner.board.clone();
            snapshot.title = original.clone();
            let entry = HistoryEntry::new(
                ChangeKind::BoardTitle,
                snapshot,
                format!("Renamed board '{original}' to '{new_title}'"),
            );
            inner.history.push(entry.clone());
            entry
        };
        self.notify_history(&entry);
    }

    fn commit_column_title(&self, column_id: &str) {
        let entry = {
            let mut inner = self.lock();
            let Some(original) = inner.pending_edits.remove(column_id) else {
                return;
            };
            // The column may have been deleted while the commit was pending.
            let Some(index) = inner.board.column_index(column_id) else {
                return;
            };
            let new_title = inner.board.cols[index].title.clone();
            let mut snapshot = inner.board.clone();
            snapshot.cols[index].title = original.clone();
            let entry = HistoryEntry::new(
                ChangeKind::ColumnTitle,
                snapshot,
                format!("Renamed column '{original}' to '{new_title}'"),
            );
            inner.history.push(entry.clone());
            entry
        };
        self.notify_history(&entry);
    }

    fn commit_task_text(&self, task_id: &str) {
        let entry = {
            let mut inner = self.lock();
            let Some(original) = inner.pending_edits.remove(task_id) else {
                return;
            };
            // Looked up fresh: the task may have moved columns, or be gone.
            let Some((col_index, task_index)) = inner.board.locate_task(task_id) else {
                return;
            };
            let new_text = inner.board.cols[col_index].tasks[task_index].text.clone();
            let column_title = inner.board.cols[col_index].title.clone();
            let mut snapshot = inner.board.clone();
            snapshot.cols[col_index].tasks[task_index].text = original.clone();
            let entry = HistoryEntry::new(
                ChangeKind::TaskText,
                snapshot,
                format!("Changed task text from '{original}' to '{new_text}' in column '{column_title}'"),
            );
            inner.history.push(entry.clone());
            entry
        };
        self.notify_history(&entry);
    }

    // =========================================================================
    // History operations
    // =========================================================================

    /// Jump the live board back to the state captured by entry `index`.
    ///
    /// Rollback is itself history-worthy: the current board is appended as a
    /// `HistoryReversed` entry first, so the log only ever grows and any
    /// revision stays addressable.
    pub fn roll_back(&self, index: usize) {
        let entry = {
            let mut inner = self.lock();
            let Some(target) = inner.history.get(index) else {
                return;
            };
            let target = target.data.clone();
            let entry = HistoryEntry::new(
                ChangeKind::HistoryReversed,
                inner.board.clone(),
                format!("Rolled back to revision {index}"),
            );
            inner.history.push(entry.clone());
            inner.board = target;
            entry
        };
        debug!(revision = index, "rolled back");
        self.notify_history(&entry);
        self.notify_change();
        self.autosave();
    }

    /// Read-only copy of the full revision log.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock().history.to_vec()
    }

    /// Number of committed revisions.
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Deep copy of the live board.
    pub fn current_board(&self) -> Board {
        self.lock().board.clone()
    }

    /// Show change listeners an arbitrary board (e.g. a historical snapshot)
    /// without touching the live board.
    pub fn preview(&self, board: &Board) {
        self.notify_change_with(board);
    }

    /// Re-show change listeners the live board, ending a preview.
    pub fn refresh(&self) {
        self.notify_change();
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Stamp the document and forward it to the transport, if one is
    /// attached. Fire-and-forget: transport failures stay in the transport.
    pub fn save(&self) {
        let (transport, board) = {
            let mut inner = self.lock();
            inner.board.timestamp = Utc::now().timestamp_millis();
            (inner.transport.clone(), inner.board.clone())
        };
        match transport {
            Some(transport) => transport.save(&board),
            None => debug!("save requested with no transport attached"),
        }
    }

    /// Replace the live board wholesale, notify listeners, and persist.
    pub fn replace_board(&self, board: Board) {
        self.lock().board = board;
        self.notify_change();
        self.save();
    }

    /// Ask the transport for the previously saved document and install it.
    ///
    /// Returns `Ok(false)` when no transport is attached or it has nothing
    /// saved; parse failures surface as errors.
    pub fn load(&self) -> Result<bool> {
        let transport = self.lock().transport.clone();
        let Some(transport) = transport else {
            return Ok(false);
        };
        let Some(document) = transport.load()? else {
            return Ok(false);
        };
        let board = schema::parse_document(&document)?;
        debug!(title = %board.title, "document loaded");
        self.replace_board(board);
        Ok(true)
    }

    fn autosave(&self) {
        let enabled = self.lock().board.autosave;
        if enabled {
            self.save();
        }
    }
}

fn history_key(key: &str) -> String {
    format!("{key}/history")
}

fn save_key(key: &str) -> String {
    format!("{key}/save")
}

fn collect<T: ?Sized>(listeners: &[(ListenerId, Arc<T>)]) -> Vec<Arc<T>> {
    listeners
        .iter()
        .map(|(_, listener)| Arc::clone(listener))
        .collect()
}
