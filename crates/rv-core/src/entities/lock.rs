use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::LockKind;

/// An edit lock held by a user on a project type, finding, or section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockInfo {
    pub object_kind: LockKind,
    pub object_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl LockInfo {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
