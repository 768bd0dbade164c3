use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{ProjectType, User};
use crate::enums::SourceEnum;
use crate::fields::{FieldData, HandleUndefined, ensure_defined_structure};

/// A pentest project.
///
/// `data` holds the report fields; sections and findings live in their own
/// tables. Members are stored separately as [`ProjectMember`] rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub project_type_id: String,
    pub language: String,
    pub data: FieldData,
    pub source: SourceEnum,
    pub readonly: bool,
    /// Snapshots of users that could not be resolved when the project was imported.
    pub imported_members: Vec<ImportedMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Report data merged with the project type's report field defaults.
    #[must_use]
    pub fn data_all(&self, project_type: &ProjectType) -> FieldData {
        ensure_defined_structure(
            &self.data,
            &project_type.report_fields,
            HandleUndefined::FillDefault,
            true,
        )
    }

    /// The slice of `data_all` that belongs to section `section_id`.
    #[must_use]
    pub fn section_data(&self, project_type: &ProjectType, section_id: &str) -> FieldData {
        let all = self.data_all(project_type);
        project_type
            .section_fields(section_id)
            .iter()
            .filter_map(|field| all.get(field).map(|v| (field.clone(), v.clone())))
            .collect()
    }
}

/// Membership of a user in a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectMember {
    pub user_id: String,
    pub roles: Vec<String>,
}

/// Public profile snapshot of a user that does not exist in this installation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportedMember {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title_before: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub title_after: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl ImportedMember {
    /// Snapshot `user`'s public profile with the given role set.
    #[must_use]
    pub fn from_user(user: &User, roles: Vec<String>) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            mobile: user.mobile.clone(),
            name: Some(user.name()),
            title_before: user.title_before.clone(),
            first_name: user.first_name.clone(),
            middle_name: user.middle_name.clone(),
            last_name: user.last_name.clone(),
            title_after: user.title_after.clone(),
            roles,
        }
    }
}
