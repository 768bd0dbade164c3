//! Report section repository.
//!
//! Sections carry assignment and review state only; their data is the slice
//! of the project's report data that belongs to the section's fields.

use rv_core::entities::ReportSection;
use rv_core::enums::LockTarget;
use rv_core::fields::FieldData;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum};
use crate::service::VaultService;
use crate::updates::section::SectionUpdate;

const SECTION_COLUMNS: &str = "id, project_id, section_id, assignee_id, status, created_at, updated_at";

fn row_to_section(row: &libsql::Row) -> Result<ReportSection, DatabaseError> {
    Ok(ReportSection {
        id: row.get::<String>(0)?,
        project_id: row.get::<String>(1)?,
        section_id: row.get::<String>(2)?,
        assignee_id: get_opt_string(row, 3)?,
        status: parse_enum(&row.get::<String>(4)?)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
        updated_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

impl VaultService {
    pub async fn insert_section(&self, section: &ReportSection) -> Result<(), DatabaseError> {
        self.db()
            .execute(
                &format!("INSERT INTO report_sections ({SECTION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
                libsql::params![
                    section.id.as_str(),
                    section.project_id.as_str(),
                    section.section_id.as_str(),
                    section.assignee_id.as_deref(),
                    section.status.as_str(),
                    section.created_at.to_rfc3339(),
                    section.updated_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Sections of a project in creation order.
    pub async fn list_sections(&self, project_id: &str) -> Result<Vec<ReportSection>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                &format!("SELECT {SECTION_COLUMNS} FROM report_sections WHERE project_id = ?1 ORDER BY rowid"),
                [project_id],
            )
            .await?;
        let mut sections = Vec::new();
        while let Some(row) = rows.next().await? {
            sections.push(row_to_section(&row)?);
        }
        Ok(sections)
    }

    pub async fn get_section(&self, id: &str) -> Result<ReportSection, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                &format!("SELECT {SECTION_COLUMNS} FROM report_sections WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("section", id))?;
        row_to_section(&row)
    }

    pub async fn update_section(
        &self,
        id: &str,
        update: SectionUpdate,
    ) -> Result<ReportSection, DatabaseError> {
        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1;

        if let Some(ref assignee) = update.assignee_id {
            sets.push(format!("assignee_id = ?{idx}"));
            params.push(assignee.as_deref().into());
            idx += 1;
        }
        if let Some(status) = update.status {
            sets.push(format!("status = ?{idx}"));
            params.push(status.as_str().into());
            idx += 1;
        }

        if sets.is_empty() {
            return self.get_section(id).await;
        }

        sets.push(format!("updated_at = ?{idx}"));
        params.push(self.now().to_rfc3339().into());
        idx += 1;
        params.push(id.into());

        let sql = format!("UPDATE report_sections SET {} WHERE id = ?{idx}", sets.join(", "));
        let changed = self
            .db()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("section", id));
        }
        self.get_section(id).await
    }

    /// The section's slice of the project's report data, with defaults filled.
    pub async fn section_data(&self, id: &str) -> Result<FieldData, DatabaseError> {
        let section = self.get_section(id).await?;
        let project = self.get_project(&section.project_id).await?;
        let project_type = self.get_project_type(&project.project_type_id).await?;
        Ok(project.section_data(&project_type, &section.section_id))
    }

    /// Merge `patch` into the project's report data, restricted to the
    /// section's fields. Keys outside the section are ignored.
    pub async fn update_section_data(
        &self,
        id: &str,
        patch: &FieldData,
    ) -> Result<FieldData, DatabaseError> {
        let section = self.get_section(id).await?;
        let project = self.get_project(&section.project_id).await?;
        let project_type = self.get_project_type(&project.project_type_id).await?;
        let fields = project_type.section_fields(&section.section_id);

        let restricted: FieldData = patch
            .iter()
            .filter(|(key, _)| fields.contains(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let project = self.update_project_data(&project.id, &restricted).await?;
        Ok(project.section_data(&project_type, &section.section_id))
    }

    /// Whether the section is currently locked.
    pub async fn is_section_locked(&self, id: &str) -> Result<bool, DatabaseError> {
        self.is_locked(&LockTarget::section(id)).await
    }
}
