//! # rv-files
//!
//! Content-addressed blob storage for uploaded images and assets.
//!
//! Blobs are keyed by the sha256 of their content, so storing the same bytes
//! twice yields one blob. The store itself keeps no reference counts: the
//! database decides when a blob is no longer referenced and calls
//! [`FileStore::remove`].
//!
//! Layout inside the backend: `blobs/{key[..2]}/{key}`.

mod error;
mod sanitize;

pub use error::StoreError;
pub use sanitize::{DEFAULT_FILENAME, numbered_filename, sanitize_filename, split_extension};

use std::path::Path;
use std::sync::Arc;

use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use rv_config::{StorageBackend, StorageConfig};
use sha2::{Digest, Sha256};

/// Result of [`FileStore::store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Sanitized file name.
    pub name: String,
    /// sha256 of the sanitized name.
    pub name_hash: String,
    /// Storage key (sha256 of the content).
    pub key: String,
    pub size: usize,
    /// `false` when an identical blob already existed.
    pub created: bool,
}

/// Hex sha256 of `content`; the storage key of a blob.
#[must_use]
pub fn content_key(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Hex sha256 of a sanitized file name.
#[must_use]
pub fn name_hash(name: &str) -> String {
    hex::encode(Sha256::digest(name.as_bytes()))
}

fn is_valid_key(key: &str) -> bool {
    key.len() == 64 && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Blob store over an [`ObjectStore`] backend.
#[derive(Clone)]
pub struct FileStore {
    backend: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("backend", &self.backend.to_string())
            .finish()
    }
}

impl FileStore {
    pub fn new(backend: Arc<dyn ObjectStore>) -> Self {
        Self { backend }
    }

    /// A store that lives in process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    /// A store rooted at `root` on the local filesystem. Creates `root` if needed.
    pub fn local(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        std::fs::create_dir_all(root.as_ref())?;
        let backend = LocalFileSystem::new_with_prefix(root.as_ref())?;
        Ok(Self::new(Arc::new(backend)))
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, StoreError> {
        match config.backend {
            StorageBackend::Local => Self::local(&config.root),
            StorageBackend::Memory => Ok(Self::in_memory()),
        }
    }

    fn blob_path(key: &str) -> Result<ObjectPath, StoreError> {
        if !is_valid_key(key) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(ObjectPath::from(format!("blobs/{}/{key}", &key[..2])))
    }

    /// Store `content` under a sanitized version of `name`.
    ///
    /// Identical content is written once; later calls return the existing key
    /// with `created == false`.
    pub async fn store(&self, name: &str, content: &[u8]) -> Result<StoredFile, StoreError> {
        let name = sanitize_filename(name);
        let key = content_key(content);
        let created = !self.exists(&key).await?;

        if created {
            self.backend
                .put(&Self::blob_path(&key)?, PutPayload::from(content.to_vec()))
                .await?;
            tracing::debug!(%key, size = content.len(), "stored new blob");
        } else {
            tracing::debug!(%key, "blob already stored");
        }

        Ok(StoredFile {
            name_hash: name_hash(&name),
            name,
            key,
            size: content.len(),
            created,
        })
    }

    /// Read the blob stored under `key`.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = Self::blob_path(key)?;
        match self.backend.get(&path).await {
            Ok(result) => Ok(result.bytes().await?.to_vec()),
            Err(object_store::Error::NotFound { .. }) => Err(StoreError::MissingBlob {
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.backend.head(&Self::blob_path(key)?).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Physically delete the blob. Returns `false` if it was already gone.
    pub async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        if !self.exists(key).await? {
            tracing::warn!(%key, "blob to remove is already missing");
            return Ok(false);
        }
        match self.backend.delete(&Self::blob_path(key)?).await {
            Ok(()) => {
                tracing::debug!(%key, "removed blob");
                Ok(true)
            }
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
