//! Project type repository.

use rv_core::entities::ProjectType;
use rv_core::enums::{LinkedObject, SourceEnum};
use rv_core::fields::{
    FieldData, FieldMap, SectionDefinition, finding_field_order_default, finding_fields_default,
    report_fields_default, report_sections_default,
};
use rv_core::ids::PREFIX_PROJECT_TYPE;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_json, to_json};
use crate::service::VaultService;

const PROJECT_TYPE_COLUMNS: &str = "id, name, language, report_fields, report_sections, \
     finding_fields, finding_field_order, report_template, report_styles, report_preview_data, \
     source, linked_project, created_at, updated_at";

fn row_to_project_type(row: &libsql::Row) -> Result<ProjectType, DatabaseError> {
    Ok(ProjectType {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        language: row.get::<String>(2)?,
        report_fields: parse_json(&row.get::<String>(3)?)?,
        report_sections: parse_json(&row.get::<String>(4)?)?,
        finding_fields: parse_json(&row.get::<String>(5)?)?,
        finding_field_order: parse_json(&row.get::<String>(6)?)?,
        report_template: row.get::<String>(7)?,
        report_styles: row.get::<String>(8)?,
        report_preview_data: parse_json(&row.get::<String>(9)?)?,
        source: parse_enum(&row.get::<String>(10)?)?,
        linked_project: get_opt_string(row, 11)?,
        created_at: parse_datetime(&row.get::<String>(12)?)?,
        updated_at: parse_datetime(&row.get::<String>(13)?)?,
    })
}

/// A project type to create. [`NewProjectType::new`] starts from the
/// predefined field sets.
#[derive(Debug, Clone)]
pub struct NewProjectType {
    pub name: String,
    pub language: String,
    pub report_fields: FieldMap,
    pub report_sections: Vec<SectionDefinition>,
    pub finding_fields: FieldMap,
    pub finding_field_order: Vec<String>,
    pub report_template: String,
    pub report_styles: String,
    pub report_preview_data: FieldData,
}

impl NewProjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: "en-US".into(),
            report_fields: report_fields_default(),
            report_sections: report_sections_default(),
            finding_fields: finding_fields_default(),
            finding_field_order: finding_field_order_default(),
            report_template: String::new(),
            report_styles: String::new(),
            report_preview_data: FieldData::new(),
        }
    }
}

impl VaultService {
    pub async fn create_project_type(
        &self,
        new: NewProjectType,
    ) -> Result<ProjectType, DatabaseError> {
        let now = self.now();
        let project_type = ProjectType {
            id: self.db().generate_id(PREFIX_PROJECT_TYPE).await?,
            name: new.name,
            language: new.language,
            report_fields: new.report_fields,
            report_sections: new.report_sections,
            finding_fields: new.finding_fields,
            finding_field_order: new.finding_field_order,
            report_template: new.report_template,
            report_styles: new.report_styles,
            report_preview_data: new.report_preview_data,
            source: SourceEnum::Created,
            linked_project: None,
            created_at: now,
            updated_at: now,
        };
        self.insert_project_type(&project_type).await?;
        Ok(project_type)
    }

    /// Insert a fully specified project type row.
    ///
    /// # Errors
    ///
    /// `DatabaseError::Core` if the section layout or field order is invalid.
    pub async fn insert_project_type(&self, pt: &ProjectType) -> Result<(), DatabaseError> {
        pt.validate()?;
        self.db()
            .execute(
                &format!(
                    "INSERT INTO project_types ({PROJECT_TYPE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
                ),
                libsql::params![
                    pt.id.as_str(),
                    pt.name.as_str(),
                    pt.language.as_str(),
                    to_json(&pt.report_fields)?,
                    to_json(&pt.report_sections)?,
                    to_json(&pt.finding_fields)?,
                    to_json(&pt.finding_field_order)?,
                    pt.report_template.as_str(),
                    pt.report_styles.as_str(),
                    to_json(&pt.report_preview_data)?,
                    pt.source.as_str(),
                    pt.linked_project.as_deref(),
                    pt.created_at.to_rfc3339(),
                    pt.updated_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Write back the editable columns of `pt` and bump `updated_at`.
    pub async fn save_project_type(&self, pt: &ProjectType) -> Result<ProjectType, DatabaseError> {
        pt.validate()?;
        let changed = self
            .db()
            .execute(
                "UPDATE project_types SET name = ?1, language = ?2, report_fields = ?3,
                     report_sections = ?4, finding_fields = ?5, finding_field_order = ?6,
                     report_template = ?7, report_styles = ?8, report_preview_data = ?9,
                     updated_at = ?10
                 WHERE id = ?11",
                libsql::params![
                    pt.name.as_str(),
                    pt.language.as_str(),
                    to_json(&pt.report_fields)?,
                    to_json(&pt.report_sections)?,
                    to_json(&pt.finding_fields)?,
                    to_json(&pt.finding_field_order)?,
                    pt.report_template.as_str(),
                    pt.report_styles.as_str(),
                    to_json(&pt.report_preview_data)?,
                    self.now().to_rfc3339(),
                    pt.id.as_str(),
                ],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("project type", &pt.id));
        }
        self.get_project_type(&pt.id).await
    }

    pub async fn get_project_type(&self, id: &str) -> Result<ProjectType, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                &format!("SELECT {PROJECT_TYPE_COLUMNS} FROM project_types WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("project type", id))?;
        row_to_project_type(&row)
    }

    pub async fn project_type_exists(&self, id: &str) -> Result<bool, DatabaseError> {
        let n = self
            .db()
            .count("SELECT COUNT(*) FROM project_types WHERE id = ?1", [id])
            .await?;
        Ok(n > 0)
    }

    pub async fn list_project_types(&self) -> Result<Vec<ProjectType>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                &format!("SELECT {PROJECT_TYPE_COLUMNS} FROM project_types ORDER BY created_at, id"),
                (),
            )
            .await?;
        let mut types = Vec::new();
        while let Some(row) = rows.next().await? {
            types.push(row_to_project_type(&row)?);
        }
        Ok(types)
    }

    /// Project types whose `linked_project` is `project_id`.
    pub async fn project_types_linked_to(
        &self,
        project_id: &str,
    ) -> Result<Vec<ProjectType>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                &format!("SELECT {PROJECT_TYPE_COLUMNS} FROM project_types WHERE linked_project = ?1"),
                [project_id],
            )
            .await?;
        let mut types = Vec::new();
        while let Some(row) = rows.next().await? {
            types.push(row_to_project_type(&row)?);
        }
        Ok(types)
    }

    pub async fn set_linked_project(
        &self,
        project_type_id: &str,
        project_id: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .execute(
                "UPDATE project_types SET linked_project = ?1 WHERE id = ?2",
                libsql::params![project_id, project_type_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("project type", project_type_id));
        }
        Ok(())
    }

    /// Number of projects using the project type.
    pub async fn project_type_usage(&self, project_type_id: &str) -> Result<u64, DatabaseError> {
        self.db()
            .count(
                "SELECT COUNT(*) FROM projects WHERE project_type_id = ?1",
                [project_type_id],
            )
            .await
    }

    /// Assets of the project type, ordered by name.
    pub async fn list_assets(
        &self,
        project_type_id: &str,
    ) -> Result<Vec<rv_core::entities::UploadedFile>, DatabaseError> {
        self.list_files(&LinkedObject::ProjectType(project_type_id.to_string()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{create_project_type, test_service};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn create_project_type_roundtrip() {
        let svc = test_service().await;
        let pt = create_project_type(&svc).await;

        assert!(pt.id.starts_with("ptp-"));
        let fetched = svc.get_project_type(&pt.id).await.unwrap();
        assert_eq!(fetched, pt);
        assert!(fetched.report_fields.contains_key("field_user"));
        assert_eq!(
            fetched.report_fields.keys().next().map(String::as_str),
            Some("title"),
            "field order survives storage"
        );
    }

    #[tokio::test]
    async fn save_updates_schema() {
        let svc = test_service().await;
        let mut pt = create_project_type(&svc).await;
        pt.name = "Renamed".into();
        pt.finding_fields.shift_remove("field_list");
        let saved = svc.save_project_type(&pt).await.unwrap();
        assert_eq!(saved.name, "Renamed");
        assert!(!saved.finding_fields.contains_key("field_list"));
    }

    #[tokio::test]
    async fn save_rejects_invalid_layout() {
        let svc = test_service().await;
        let mut pt = create_project_type(&svc).await;
        pt.finding_field_order.push("no_such_field".into());
        let err = svc.save_project_type(&pt).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Core(_)));

        let stored = svc.get_project_type(&pt.id).await.unwrap();
        assert!(!stored.finding_field_order.contains(&"no_such_field".to_string()));
    }

    #[tokio::test]
    async fn assets_are_listed_by_name() {
        let svc = test_service().await;
        let pt = create_project_type(&svc).await;
        let names: Vec<String> = svc
            .list_assets(&pt.id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["file1.png", "file2.png"]);
    }
}
