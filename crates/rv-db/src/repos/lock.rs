//! Edit locks on project types, findings, and report sections.
//!
//! A lock expires `lock_expiry` after it was taken or last refreshed; expired
//! locks count as absent. Expiry is judged against the service clock.

use rv_core::entities::LockInfo;
use rv_core::enums::{LockKind, LockTarget};

use crate::error::DatabaseError;
use crate::helpers::{parse_datetime, parse_enum};
use crate::service::VaultService;

fn row_to_lock(row: &libsql::Row) -> Result<LockInfo, DatabaseError> {
    Ok(LockInfo {
        object_kind: parse_enum(&row.get::<String>(0)?)?,
        object_id: row.get::<String>(1)?,
        user_id: row.get::<String>(2)?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
        expires_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

impl VaultService {
    /// Take or refresh the lock on `target` for `user_id`.
    ///
    /// # Errors
    ///
    /// `DatabaseError::Locked` if another user holds an unexpired lock.
    pub async fn lock(&self, target: &LockTarget, user_id: &str) -> Result<LockInfo, DatabaseError> {
        let now = self.now();
        if let Some(existing) = self.get_lock(target).await? {
            if existing.user_id != user_id {
                return Err(DatabaseError::Locked {
                    kind: target.kind,
                    id: target.id.clone(),
                    user_id: existing.user_id,
                });
            }
        }

        let lock = LockInfo {
            object_kind: target.kind,
            object_id: target.id.clone(),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + self.lock_expiry(),
        };
        self.db()
            .execute(
                "INSERT INTO locks (object_kind, object_id, user_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (object_kind, object_id) DO UPDATE SET
                     user_id = excluded.user_id,
                     created_at = excluded.created_at,
                     expires_at = excluded.expires_at",
                libsql::params![
                    lock.object_kind.as_str(),
                    lock.object_id.as_str(),
                    lock.user_id.as_str(),
                    lock.created_at.to_rfc3339(),
                    lock.expires_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(lock)
    }

    /// Release `user_id`'s lock on `target`. Returns `false` if the user held none.
    pub async fn unlock(&self, target: &LockTarget, user_id: &str) -> Result<bool, DatabaseError> {
        let changed = self
            .db()
            .execute(
                "DELETE FROM locks WHERE object_kind = ?1 AND object_id = ?2 AND user_id = ?3",
                [target.kind.as_str(), target.id.as_str(), user_id],
            )
            .await?;
        Ok(changed > 0)
    }

    /// The unexpired lock on `target`, if any.
    pub async fn get_lock(&self, target: &LockTarget) -> Result<Option<LockInfo>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT object_kind, object_id, user_id, created_at, expires_at
                 FROM locks WHERE object_kind = ?1 AND object_id = ?2",
                [target.kind.as_str(), target.id.as_str()],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let lock = row_to_lock(&row)?;
        if lock.is_expired(self.now()) {
            return Ok(None);
        }
        Ok(Some(lock))
    }

    pub async fn is_locked(&self, target: &LockTarget) -> Result<bool, DatabaseError> {
        Ok(self.get_lock(target).await?.is_some())
    }

    /// Drop every lock of `kind` on the given objects.
    pub(crate) async fn clear_locks(
        &self,
        kind: LockKind,
        ids: &[String],
    ) -> Result<(), DatabaseError> {
        for id in ids {
            self.db()
                .execute(
                    "DELETE FROM locks WHERE object_kind = ?1 AND object_id = ?2",
                    [kind.as_str(), id.as_str()],
                )
                .await?;
        }
        Ok(())
    }
}
