//! Cross-cutting error types for reportvault.
//!
//! Domain-specific errors (`StoreError`, `DatabaseError`, `ArchiveError`) live
//! in their respective crates. This module holds the errors raised by core
//! types themselves.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (schema, layout, constraints).
    #[error("Validation error: {0}")]
    Validation(String),
}
