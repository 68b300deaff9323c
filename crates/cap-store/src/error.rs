//! Error types for store operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The requested record or corpus root does not exist.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
    /// A stored record is not valid JSON.
    #[error("record {} is not valid JSON: {source}", path.display())]
    InvalidJson {
        /// Offending record.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// A record could not be serialized for writing.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Chain, signing or canonicalization failure from the core.
    #[error(transparent)]
    Core(#[from] cap_core::CoreError),
}
