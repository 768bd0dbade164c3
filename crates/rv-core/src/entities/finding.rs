use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::ProjectType;
use crate::enums::ReviewStatus;
use crate::fields::{FieldData, HandleUndefined, ensure_defined_structure};

/// A finding of a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    pub id: String,
    pub project_id: String,
    /// Stable ordinal id, preserved across export/import and copy.
    pub finding_id: String,
    pub assignee_id: Option<String>,
    /// Best-effort link to the template the finding was created from.
    pub template_id: Option<String>,
    pub status: ReviewStatus,
    pub data: FieldData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Finding {
    /// `data` merged with the project type's finding field defaults.
    #[must_use]
    pub fn data_all(&self, project_type: &ProjectType) -> FieldData {
        ensure_defined_structure(
            &self.data,
            &project_type.finding_fields,
            HandleUndefined::FillDefault,
            true,
        )
    }
}
