use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::LinkedObject;

/// A file record: an image of a project or an asset of a project type.
///
/// Several records may point at the same stored blob (`file`), e.g. after a
/// copy. The blob is removed only when the last record pointing at it goes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    pub id: String,
    pub linked_object: LinkedObject,
    /// Sanitized file name, unique per owner.
    pub name: String,
    /// Hash of `name`; the per-owner identity key.
    pub name_hash: String,
    /// Storage key of the blob holding the content.
    pub file: String,
    pub created_at: DateTime<Utc>,
}
