use std::sync::Arc;

use tabula::{BoardState, ChangeKind, MemoryTransport};

mod support;
use support::{board_with, ChangeCounter};

fn state_with_two_revisions() -> BoardState {
    let state = BoardState::new(board_with(&[
        ("c1", "todo", &[("t1", "first")]),
        ("c2", "done", &[]),
    ]));
    state.change_column_color("c1", "#ff0000");
    state.remove_column("c2");
    state
}

#[test]
fn roll_back_restores_content_and_appends() {
    let state = state_with_two_revisions();
    let before_rollback = state.current_board();
    assert_eq!(state.history_len(), 2);

    state.roll_back(0);

    let history = state.history();
    assert_eq!(history.len(), 3, "rollback appends, never truncates");
    assert!(state.current_board().content_eq(&history[0].data));

    let last = &history[2];
    assert_eq!(last.change, ChangeKind::HistoryReversed);
    assert!(last.details.contains('0'));
    // The new entry captured the board as it was just before the jump.
    assert!(last.data.content_eq(&before_rollback));
}

#[test]
fn roll_back_out_of_range_is_a_no_op() {
    let state = state_with_two_revisions();
    let before = state.current_board();

    state.roll_back(2);
    state.roll_back(99);

    assert_eq!(state.history_len(), 2);
    assert!(state.current_board().content_eq(&before));
}

#[test]
fn roll_back_on_empty_history_is_a_no_op() {
    let state = BoardState::new(board_with(&[("c1", "todo", &[])]));
    state.roll_back(0);
    assert_eq!(state.history_len(), 0);
}

#[test]
fn roll_back_is_replayable() {
    let state = state_with_two_revisions();

    // Jump all the way back, then forward again onto revision 1 (the state
    // after the recolor, before the column deletion).
    state.roll_back(0);
    state.roll_back(1);

    let history = state.history();
    assert_eq!(history.len(), 4);
    assert!(state.current_board().content_eq(&history[1].data));
    assert_eq!(state.current_board().cols[0].color, "#ff0000");
    assert_eq!(state.current_board().cols.len(), 2);
}

#[test]
fn nth_entry_holds_the_board_before_the_nth_change() {
    let state = BoardState::new(board_with(&[("c1", "todo", &[])]));

    state.change_column_color("c1", "#111111");
    state.change_column_color("c1", "#222222");
    state.change_column_color("c1", "#333333");

    let history = state.history();
    assert_eq!(history[0].data.cols[0].color, tabula::DEFAULT_COLUMN_COLOR);
    assert_eq!(history[1].data.cols[0].color, "#111111");
    assert_eq!(history[2].data.cols[0].color, "#222222");
    assert_eq!(state.current_board().cols[0].color, "#333333");
}

#[test]
fn roll_back_notifies_and_autosaves() {
    let state = BoardState::new(board_with(&[("c1", "todo", &[])]));
    let transport = Arc::new(MemoryTransport::new());
    state.set_transport(transport.clone());
    state.set_autosave(true);

    state.change_column_color("c1", "#ff0000");
    assert_eq!(transport.save_count(), 1);

    let counter = ChangeCounter::install(&state);
    state.roll_back(0);

    assert_eq!(counter.count(), 1);
    assert_eq!(transport.save_count(), 2);
    assert_eq!(
        transport.last_saved().unwrap().cols[0].color,
        tabula::DEFAULT_COLUMN_COLOR
    );
}
