use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{ReviewStatus, SourceEnum};
use crate::fields::{
    FieldData, HandleUndefined, ensure_defined_structure, finding_fields_default,
};

/// A reusable finding template.
///
/// Template data is governed by the predefined finding field set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FindingTemplate {
    pub id: String,
    pub language: String,
    pub status: ReviewStatus,
    pub tags: Vec<String>,
    pub data: FieldData,
    pub source: SourceEnum,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FindingTemplate {
    /// `data` merged with field defaults; undefined fields are kept.
    #[must_use]
    pub fn data_all(&self) -> FieldData {
        ensure_defined_structure(
            &self.data,
            &finding_fields_default(),
            HandleUndefined::FillDefault,
            true,
        )
    }
}
