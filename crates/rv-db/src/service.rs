//! Service layer tying the database, the blob store, and the clock together.
//!
//! `VaultService` wraps `VaultDb` (raw database access), `FileStore` (blob
//! bytes), and a [`Clock`]. All repo methods are implemented as
//! `impl VaultService`.
//!
//! Blobs whose last record is deleted inside a transaction are queued and
//! released by [`VaultService::commit`]; a rollback drops the queue because
//! the records come back.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rv_config::VaultConfig;
use rv_core::clock::{Clock, SystemClock};
use rv_files::FileStore;

use crate::VaultDb;
use crate::error::DatabaseError;

/// Default lock lifetime when none is configured.
const DEFAULT_LOCK_EXPIRY_SECS: i64 = 90;

pub struct VaultService {
    db: VaultDb,
    files: FileStore,
    clock: Arc<dyn Clock>,
    lock_expiry: Duration,
    /// Blob keys to release once the open transaction commits.
    deferred_blobs: Mutex<Vec<String>>,
}

impl VaultService {
    /// Create a service over a local database and the given blob store.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str, files: FileStore) -> Result<Self, DatabaseError> {
        let db = VaultDb::open_local(db_path).await?;
        Ok(Self::from_db(db, files))
    }

    /// Create a service from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database or the blob store cannot be opened.
    pub async fn from_config(config: &VaultConfig) -> Result<Self, DatabaseError> {
        let files = FileStore::from_config(&config.storage)?;
        let expiry = i64::try_from(config.locks.expiry_secs).map_err(|_| {
            DatabaseError::InvalidState(format!(
                "locks.expiry_secs out of range: {}",
                config.locks.expiry_secs
            ))
        })?;
        let svc = Self::new_local(&config.database.path, files).await?;
        Ok(svc.with_lock_expiry(Duration::seconds(expiry)))
    }

    /// Create from an existing `VaultDb` (for testing).
    #[must_use]
    pub fn from_db(db: VaultDb, files: FileStore) -> Self {
        Self {
            db,
            files,
            clock: Arc::new(SystemClock),
            lock_expiry: Duration::seconds(DEFAULT_LOCK_EXPIRY_SECS),
            deferred_blobs: Mutex::new(Vec::new()),
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn with_lock_expiry(mut self, expiry: Duration) -> Self {
        self.lock_expiry = expiry;
        self
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &VaultDb {
        &self.db
    }

    /// Access the blob store.
    #[must_use]
    pub const fn files(&self) -> &FileStore {
        &self.files
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub const fn lock_expiry(&self) -> Duration {
        self.lock_expiry
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    /// Release blob `key` now, or after commit if a transaction is open.
    pub(crate) async fn release_blob_after_commit(&self, key: &str) -> Result<(), DatabaseError> {
        if self.db.in_transaction() {
            self.deferred().push(key.to_string());
            return Ok(());
        }
        self.release_blob(key).await?;
        Ok(())
    }

    fn deferred(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.deferred_blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Commit the open transaction, then release blobs queued during it.
    ///
    /// A failing release is logged; the committed rows stand.
    pub async fn commit(&self) -> Result<(), DatabaseError> {
        self.db.commit().await?;
        let keys = std::mem::take(&mut *self.deferred());
        if keys.is_empty() {
            return Ok(());
        }
        match self.release_blobs(&keys).await {
            Ok(removed) => tracing::debug!(removed, "released blobs after commit"),
            Err(e) => tracing::warn!(error = %e, "failed to release blobs after commit"),
        }
        Ok(())
    }

    /// Roll back the open transaction and forget queued blob releases.
    pub async fn rollback(&self) -> Result<(), DatabaseError> {
        self.deferred().clear();
        self.db.rollback().await
    }

    /// Commit if `result` is `Ok`, roll back otherwise, and hand `result` back.
    pub async fn finish_transaction<T, E>(&self, result: Result<T, E>) -> Result<T, E>
    where
        E: From<DatabaseError>,
    {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }
}
