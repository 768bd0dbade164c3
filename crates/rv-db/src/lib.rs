//! # rv-db
//!
//! libSQL persistence for reportvault.
//!
//! Holds all relational state: users, finding templates, project types,
//! projects with their members, sections, and findings, uploaded file
//! records, and edit locks. On top of the repositories it implements the
//! delete cascades (linked project types, blob release) and the deep-copy
//! engine.
//!
//! Repositories are `impl VaultService` blocks under [`repos`]; they never open
//! transactions themselves, so callers can group them inside
//! [`VaultDb::begin`] / [`VaultService::finish_transaction`].

pub mod copy;
pub mod delete;
pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod updates;

#[cfg(test)]
mod test_support;

use std::sync::atomic::{AtomicBool, Ordering};

use error::DatabaseError;
use libsql::Builder;
use libsql::params::IntoParams;

pub use service::VaultService;

/// Central database handle.
///
/// Wraps a libSQL database and its single connection. Transactions are
/// explicit `BEGIN`/`COMMIT` on that connection, so every statement issued
/// between [`Self::begin`] and [`Self::commit`] takes part in them.
pub struct VaultDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    in_transaction: AtomicBool,
}

impl VaultDb {
    /// Open a local database at the given path. `":memory:"` opens a
    /// throwaway database.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        if path != ":memory:" {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DatabaseError::Migration(format!("create {}: {e}", parent.display()))
                    })?;
                }
            }
        }

        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let vault_db = Self {
            db,
            conn,
            in_transaction: AtomicBool::new(false),
        };
        vault_db.run_migrations().await?;
        tracing::debug!(%path, "opened database");
        Ok(vault_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Execute a statement, returning the number of changed rows.
    pub async fn execute(&self, sql: &str, params: impl IntoParams) -> Result<u64, DatabaseError> {
        Ok(self.conn.execute(sql, params).await?)
    }

    /// Run a query and return its rows.
    pub async fn query(
        &self,
        sql: &str,
        params: impl IntoParams,
    ) -> Result<libsql::Rows, DatabaseError> {
        Ok(self.conn.query(sql, params).await?)
    }

    /// Run a `SELECT COUNT(*)`-style query returning a single integer.
    pub async fn count(&self, sql: &str, params: impl IntoParams) -> Result<u64, DatabaseError> {
        let mut rows = self.query(sql, params).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let n = row.get::<i64>(0)?;
        u64::try_from(n).map_err(|_| DatabaseError::Query(format!("negative count {n}")))
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"prj-a3f8b2c1d4e5"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(6)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    /// Open a transaction. Nested transactions are rejected.
    pub async fn begin(&self) -> Result<(), DatabaseError> {
        if self.in_transaction.swap(true, Ordering::SeqCst) {
            return Err(DatabaseError::InvalidState(
                "transaction already in progress".into(),
            ));
        }
        if let Err(e) = self.conn.execute("BEGIN", ()).await {
            self.in_transaction.store(false, Ordering::SeqCst);
            return Err(e.into());
        }
        Ok(())
    }

    pub async fn commit(&self) -> Result<(), DatabaseError> {
        let result = self.conn.execute("COMMIT", ()).await;
        self.in_transaction.store(false, Ordering::SeqCst);
        result?;
        Ok(())
    }

    pub async fn rollback(&self) -> Result<(), DatabaseError> {
        let result = self.conn.execute("ROLLBACK", ()).await;
        self.in_transaction.store(false, Ordering::SeqCst);
        result?;
        Ok(())
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction.load(Ordering::SeqCst)
    }

    /// Commit if `result` is `Ok`, roll back otherwise, and hand `result` back.
    ///
    /// A failing rollback is logged; the original error wins.
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
