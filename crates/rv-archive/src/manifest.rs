//! Manifest documents stored as `{id}.json` at the archive root.
//!
//! Every manifest carries a `format` tag naming the archive kind and its
//! version. Binary payloads live next to the manifests:
//!
//! ```text
//! {template_id}.json
//! {project_type_id}.json
//! {project_type_id}-assets/{name}
//! {project_id}.json                   embeds its project type manifest
//! {project_id}-images/{name}
//! ```

use chrono::{DateTime, Utc};
use rv_core::entities::{FindingTemplate, ImportedMember, ProjectType, UploadedFile};
use rv_core::enums::ReviewStatus;
use rv_core::fields::{FieldData, FieldMap, SectionDefinition};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const FORMAT_TEMPLATES: &str = "templates/v1";
pub const FORMAT_PROJECT_TYPES: &str = "projecttypes/v1";
pub const FORMAT_PROJECTS: &str = "projects/v1";

/// Top-level kind of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    Templates,
    ProjectTypes,
    Projects,
}

impl ArchiveKind {
    #[must_use]
    pub const fn format(self) -> &'static str {
        match self {
            Self::Templates => FORMAT_TEMPLATES,
            Self::ProjectTypes => FORMAT_PROJECT_TYPES,
            Self::Projects => FORMAT_PROJECTS,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Templates => "templates",
            Self::ProjectTypes => "project types",
            Self::Projects => "projects",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[must_use]
pub fn manifest_path(id: &str) -> String {
    format!("{id}.json")
}

#[must_use]
pub fn asset_path(project_type_id: &str, name: &str) -> String {
    format!("{project_type_id}-assets/{name}")
}

#[must_use]
pub fn image_path(project_id: &str, name: &str) -> String {
    format!("{project_id}-images/{name}")
}

/// Just enough of a manifest to check its kind before parsing the rest.
#[derive(Debug, Deserialize)]
pub(crate) struct FormatProbe {
    #[serde(default)]
    pub format: Option<String>,
}

/// Reference to a binary payload entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifest {
    pub name: String,
}

impl From<&UploadedFile> for FileManifest {
    fn from(file: &UploadedFile) -> Self {
        Self {
            name: file.name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateManifest {
    pub format: String,
    pub id: String,
    pub created: DateTime<Utc>,
    pub language: String,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub data: FieldData,
}

impl From<&FindingTemplate> for TemplateManifest {
    fn from(template: &FindingTemplate) -> Self {
        Self {
            format: FORMAT_TEMPLATES.to_string(),
            id: template.id.clone(),
            created: template.created_at,
            language: template.language.clone(),
            status: template.status,
            tags: template.tags.clone(),
            data: template.data.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Project types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTypeManifest {
    pub format: String,
    pub id: String,
    pub created: DateTime<Utc>,
    pub name: String,
    pub language: String,
    pub report_fields: FieldMap,
    pub report_sections: Vec<SectionDefinition>,
    pub finding_fields: FieldMap,
    pub finding_field_order: Vec<String>,
    #[serde(default)]
    pub report_template: String,
    #[serde(default)]
    pub report_styles: String,
    #[serde(default)]
    pub report_preview_data: FieldData,
    #[serde(default)]
    pub assets: Vec<FileManifest>,
}

impl ProjectTypeManifest {
    #[must_use]
    pub fn new(project_type: &ProjectType, assets: &[UploadedFile]) -> Self {
        Self {
            format: FORMAT_PROJECT_TYPES.to_string(),
            id: project_type.id.clone(),
            created: project_type.created_at,
            name: project_type.name.clone(),
            language: project_type.language.clone(),
            report_fields: project_type.report_fields.clone(),
            report_sections: project_type.report_sections.clone(),
            finding_fields: project_type.finding_fields.clone(),
            finding_field_order: project_type.finding_field_order.clone(),
            report_template: project_type.report_template.clone(),
            report_styles: project_type.report_styles.clone(),
            report_preview_data: project_type.report_preview_data.clone(),
            assets: assets.iter().map(FileManifest::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// A report section. `id` is the section id from the project type, not a
/// database id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionManifest {
    pub id: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub assignee: Option<ImportedMember>,
    #[serde(default)]
    pub status: ReviewStatus,
}

/// A finding. `id` is the stable finding id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingManifest {
    pub id: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub assignee: Option<ImportedMember>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(default)]
    pub data: FieldData,
}

/// A project with its embedded project type.
///
/// Users appear as profile snapshots so the importing installation can
/// resolve them or keep the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub format: String,
    pub id: String,
    pub created: DateTime<Utc>,
    pub name: String,
    pub language: String,
    #[serde(default)]
    pub readonly: bool,
    pub project_type: ProjectTypeManifest,
    #[serde(default)]
    pub members: Vec<ImportedMember>,
    #[serde(default)]
    pub imported_members: Vec<ImportedMember>,
    /// Users referenced from `user` fields in report or finding data.
    #[serde(default)]
    pub referenced_users: Vec<ImportedMember>,
    #[serde(default)]
    pub report_data: FieldData,
    #[serde(default)]
    pub sections: Vec<SectionManifest>,
    #[serde(default)]
    pub findings: Vec<FindingManifest>,
    #[serde(default)]
    pub images: Vec<FileManifest>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn paths() {
        assert_eq!(manifest_path("prj-1"), "prj-1.json");
        assert_eq!(asset_path("ptp-1", "logo.png"), "ptp-1-assets/logo.png");
        assert_eq!(image_path("prj-1", "shot.png"), "prj-1-images/shot.png");
    }

    #[test]
    fn template_manifest_tolerates_missing_optional_fields() {
        let manifest: TemplateManifest = serde_json::from_value(json!({
            "format": "templates/v1",
            "id": "tpl-1",
            "created": "2024-01-01T00:00:00Z",
            "language": "de-DE"
        }))
        .unwrap();
        assert_eq!(manifest.status, ReviewStatus::InProgress);
        assert!(manifest.tags.is_empty());
        assert!(manifest.data.is_empty());
    }

    #[test]
    fn probe_reads_only_format() {
        let probe: FormatProbe =
            serde_json::from_value(json!({"format": "projects/v1", "other": 1})).unwrap();
        assert_eq!(probe.format.as_deref(), Some(FORMAT_PROJECTS));

        let probe: FormatProbe = serde_json::from_value(json!({"id": "x"})).unwrap();
        assert_eq!(probe.format, None);
    }
}
