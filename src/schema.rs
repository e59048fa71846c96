//! Document wire shape and legacy normalization.
//!
//! The strict shape is the serde form of [`Board`]:
//!
//! ```text
//! { title, cols: [{ id, title, color, tasks: [{ id, text }] }],
//!   autosave, saveToFile, timestamp }
//! ```
//!
//! Hosts that persisted earlier versions of the document produce "loose"
//! variants: tasks as bare strings, redundant `ncols`/`ntasks` counters,
//! autosave/saveToFile nested under a `settings` object, missing ids, colors
//! or timestamp. [`parse_document`] repairs all of these into the strict
//! shape without mutating the input; missing optional fields are filled,
//! never rejected.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::board::{new_id, Board, Column, Task, DEFAULT_BOARD_TITLE, DEFAULT_COLUMN_COLOR};
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct LooseBoard {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    cols: Option<Vec<LooseColumn>>,
    #[serde(default)]
    autosave: Option<bool>,
    #[serde(default, rename = "saveToFile")]
    save_to_file: Option<bool>,
    #[serde(default)]
    settings: Option<LooseSettings>,
    #[serde(default)]
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct LooseSettings {
    #[serde(default)]
    autosave: Option<bool>,
    #[serde(default, rename = "saveToFile")]
    save_to_file: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct LooseColumn {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    tasks: Option<Vec<LooseTask>>,
}

/// Legacy documents stored tasks as bare strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LooseTask {
    Text(String),
    Entry {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        text: String,
    },
}

/// Parse a document in either the strict or a loose legacy shape,
/// normalizing it to a [`Board`].
pub fn parse_document(value: &Value) -> Result<Board> {
    let loose: LooseBoard = serde_json::from_value(value.clone())?;
    Ok(normalize(loose))
}

/// Serialize a board to the strict document shape.
pub fn to_document(board: &Board) -> Result<Value> {
    Ok(serde_json::to_value(board)?)
}

/// Serialize a board to the loose legacy shape (bare-string tasks, counts,
/// settings object), for hosts that still persist the old format.
pub fn to_legacy_document(board: &Board) -> Value {
    json!({
        "title": board.title,
        "ncols": board.cols.len(),
        "cols": board
            .cols
            .iter()
            .map(|col| {
                json!({
                    "id": col.id,
                    "title": col.title,
                    "color": col.color,
                    "ntasks": col.tasks.len(),
                    "tasks": col
                        .tasks
                        .iter()
                        .map(|task| Value::String(task.text.clone()))
                        .collect::<Vec<_>>(),
                })
            })
            .collect::<Vec<_>>(),
        "settings": {
            "autosave": board.autosave,
            "saveToFile": board.save_to_file,
        },
    })
}

fn normalize(loose: LooseBoard) -> Board {
    let settings = loose.settings;
    let autosave = loose
        .autosave
        .or_else(|| settings.as_ref().and_then(|s| s.autosave))
        .unwrap_or(false);
    let save_to_file = loose
        .save_to_file
        .or_else(|| settings.as_ref().and_then(|s| s.save_to_file))
        .unwrap_or(false);

    Board {
        title: loose.title.unwrap_or_else(|| DEFAULT_BOARD_TITLE.to_string()),
        cols: loose
            .cols
            .unwrap_or_default()
            .into_iter()
            .map(normalize_column)
            .collect(),
        autosave,
        save_to_file,
        timestamp: loose
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
    }
}

fn normalize_column(loose: LooseColumn) -> Column {
    Column {
        id: loose.id.unwrap_or_else(new_id),
        title: loose.title.unwrap_or_default(),
        color: loose
            .color
            .unwrap_or_else(|| DEFAULT_COLUMN_COLOR.to_string()),
        tasks: loose
            .tasks
            .unwrap_or_default()
            .into_iter()
            .map(normalize_task)
            .collect(),
    }
}

fn normalize_task(loose: LooseTask) -> Task {
    match loose {
        LooseTask::Text(text) => Task { id: new_id(), text },
        LooseTask::Entry { id, text } => Task {
            id: id.unwrap_or_else(new_id),
            text,
        },
    }
}
