//! Persistence transport.
//!
//! The state core treats persistence as an opaque save/load channel: `save`
//! is fire-and-forget (failures are the transport's concern and are logged,
//! never propagated), `load` hands back the previously saved document for
//! normalization. Anything beyond those two calls, including the choice of
//! storage backend, belongs to the host.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use tracing::{debug, warn};

use crate::board::Board;
use crate::error::Result;
use crate::schema;

/// Save/load channel between the state core and a host process.
pub trait BoardTransport: Send + Sync {
    /// Persist a snapshot of the document. Fire-and-forget.
    fn save(&self, board: &Board);

    /// Fetch the previously saved document, if any.
    fn load(&self) -> Result<Option<Value>>;
}

/// JSON-file transport with atomic replace (write temp file, rename).
#[derive(Debug)]
pub struct FileTransport {
    path: PathBuf,
}

impl FileTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, bytes: &[u8]) -> std::io::Result<()> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)
    }
}

impl BoardTransport for FileTransport {
    fn save(&self, board: &Board) {
        let bytes = match serde_json::to_vec_pretty(board) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "failed to serialize board");
                return;
            }
        };
        match self.write_atomic(&bytes) {
            Ok(()) => debug!(path = %self.path.display(), "board saved"),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to write board")
            }
        }
    }

    fn load(&self) -> Result<Option<Value>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

/// In-memory transport recording every save.
///
/// For tests and for embedders that forward documents to a host process
/// themselves.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    saves: Mutex<Vec<Board>>,
    document: Mutex<Option<Value>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the document returned by the next `load`.
    pub fn seed(&self, value: Value) {
        *lock(&self.document) = Some(value);
    }

    /// Boards handed to `save`, oldest first.
    pub fn saved(&self) -> Vec<Board> {
        lock(&self.saves).clone()
    }

    pub fn save_count(&self) -> usize {
        lock(&self.saves).len()
    }

    pub fn last_saved(&self) -> Option<Board> {
        lock(&self.saves).last().cloned()
    }
}

impl BoardTransport for MemoryTransport {
    fn save(&self, board: &Board) {
        lock(&self.saves).push(board.clone());
        match schema::to_document(board) {
            Ok(value) => *lock(&self.document) = Some(value),
            Err(err) => warn!(error = %err, "failed to serialize board"),
        }
    }

    fn load(&self) -> Result<Option<Value>> {
        Ok(lock(&self.document).clone())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_transport_round_trips() {
        let temp = TempDir::new().unwrap();
        let transport = FileTransport::new(temp.path().join("board.json"));

        assert!(transport.load().unwrap().is_none());

        let board = Board::new("persisted");
        transport.save(&board);

        let value = transport.load().unwrap().unwrap();
        let loaded = crate::schema::parse_document(&value).unwrap();
        assert_eq!(loaded, board);
    }

    #[test]
    fn file_transport_replaces_existing_file() {
        let temp = TempDir::new().unwrap();
        let transport = FileTransport::new(temp.path().join("board.json"));

        transport.save(&Board::new("first"));
        transport.save(&Board::new("second"));

        let value = transport.load().unwrap().unwrap();
        assert_eq!(value["title"], "second");
        assert!(!transport.path().with_extension("tmp").exists());
    }

    #[test]
    fn memory_transport_records_saves() {
        let transport = MemoryTransport::new();
        assert_eq!(transport.save_count(), 0);
        assert!(transport.load().unwrap().is_none());

        transport.save(&Board::new("a"));
        transport.save(&Board::new("b"));

        assert_eq!(transport.save_count(), 2);
        assert_eq!(transport.last_saved().unwrap().title, "b");
        assert_eq!(transport.load().unwrap().unwrap()["title"], "b");
    }
}
