//! Archive error types for rv-archive.

use rv_db::error::DatabaseError;
use rv_files::StoreError;
use thiserror::Error;

/// Errors from archive export and import.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive is well-formed but not acceptable here (wrong kind,
    /// unknown format version, no manifests).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The archive could not be decoded or misses an entry it refers to.
    #[error("Corrupt archive: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Files(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ArchiveError {
    pub(crate) fn corrupt(err: impl std::fmt::Display) -> Self {
        Self::Corrupt(err.to_string())
    }
}
