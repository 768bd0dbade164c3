//! Database error types for rv-db.

use rv_core::enums::LockKind;
use rv_core::errors::CoreError;
use rv_files::StoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned data that could not be decoded.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// The referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The object is locked by another user.
    #[error("{kind} {id} is locked by {user_id}")]
    Locked {
        kind: LockKind,
        id: String,
        user_id: String,
    },

    /// The entity is still referenced and cannot be deleted.
    #[error("{entity} {id} is in use: {reason}")]
    InUse {
        entity: &'static str,
        id: String,
        reason: String,
    },

    /// Invalid state encountered (e.g., bad data in DB, nested transaction).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A core type rejected its own contents.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Blob storage failure.
    #[error(transparent)]
    Files(#[from] StoreError),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
