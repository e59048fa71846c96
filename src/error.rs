//! Error types for tabula
//!
//! Unresolved board references (a column or task id that no longer resolves)
//! are not errors at this layer: mutating operations validate identifiers
//! first and silently no-op. The variants here cover document parsing,
//! configuration, and persistence I/O.

use thiserror::Error;

/// Main error type for tabula operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for tabula operations
pub type Result<T> = std::result::Result<T, Error>;
