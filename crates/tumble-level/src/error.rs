//! Level error types.

use std::path::PathBuf;

/// Errors that can occur when loading, saving, or validating a level.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// Failed to read the level file from disk.
    #[error("failed to read level {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the level file to disk.
    #[error("failed to write level: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse level: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Failed to serialize the level to RON.
    #[error("failed to serialize level: {0}")]
    SerializeError(#[source] ron::Error),

    /// The level parsed but describes impossible geometry.
    #[error("invalid level: {0}")]
    Invalid(String),
}
