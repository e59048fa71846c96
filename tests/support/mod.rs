//! Shared helpers for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tabula::{Board, BoardState, Column, Task};

/// Build a board from `(column id, title, [(task id, text)])` triples.
pub fn board_with(columns: &[(&str, &str, &[(&str, &str)])]) -> Board {
    let mut board = Board::new("test board");
    for &(id, title, tasks) in columns {
        let mut column = Column::new(title);
        column.id = id.to_string();
        for &(task_id, text) in tasks {
            let mut task = Task::new();
            task.id = task_id.to_string();
            task.text = text.to_string();
            column.tasks.push(task);
        }
        board.cols.push(column);
    }
    board
}

/// Counts change notifications delivered to a listener.
pub struct ChangeCounter {
    count: Arc<AtomicUsize>,
}

impl ChangeCounter {
    pub fn install(state: &BoardState) -> Self {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        state.add_change_listener(move |_| {
            handle.fetch_add(1, Ordering::SeqCst);
        });
        Self { count }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}
