use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A record points at a blob the backend does not have.
    #[error("Blob {key} is missing from storage")]
    MissingBlob { key: String },

    /// A storage key that is not a lowercase sha256 hex digest.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    Backend(#[from] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
