//! Project repository.

use rv_core::entities::{ImportedMember, Project, ProjectMember, ReportSection};
use rv_core::enums::{LinkedObject, ReviewStatus, SourceEnum};
use rv_core::fields::{FieldData, merge_data};
use rv_core::ids::{PREFIX_PROJECT, PREFIX_SECTION};

use crate::error::DatabaseError;
use crate::helpers::{get_bool, parse_datetime, parse_enum, parse_json, to_json};
use crate::service::VaultService;
use crate::updates::project::ProjectUpdate;

const PROJECT_COLUMNS: &str = "id, name, project_type_id, language, data, source, readonly, \
                               imported_members, created_at, updated_at";

fn row_to_project(row: &libsql::Row) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        project_type_id: row.get::<String>(2)?,
        language: row.get::<String>(3)?,
        data: parse_json(&row.get::<String>(4)?)?,
        source: parse_enum(&row.get::<String>(5)?)?,
        readonly: get_bool(row, 6)?,
        imported_members: parse_json(&row.get::<String>(7)?)?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
        updated_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

impl VaultService {
    /// Create a project of `project_type_id` with the given members.
    ///
    /// One report section is created per section of the project type.
    pub async fn create_project(
        &self,
        name: &str,
        project_type_id: &str,
        members: &[ProjectMember],
    ) -> Result<Project, DatabaseError> {
        let project_type = self.get_project_type(project_type_id).await?;
        let now = self.now();
        let project = Project {
            id: self.db().generate_id(PREFIX_PROJECT).await?,
            name: name.to_string(),
            project_type_id: project_type.id.clone(),
            language: project_type.language.clone(),
            data: FieldData::new(),
            source: SourceEnum::Created,
            readonly: false,
            imported_members: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.insert_project(&project).await?;

        for member in members {
            self.add_member(&project.id, member).await?;
        }
        for definition in &project_type.report_sections {
            self.insert_section(&ReportSection {
                id: self.db().generate_id(PREFIX_SECTION).await?,
                project_id: project.id.clone(),
                section_id: definition.id.clone(),
                assignee_id: None,
                status: ReviewStatus::InProgress,
                created_at: now,
                updated_at: now,
            })
            .await?;
        }

        Ok(project)
    }

    /// Insert a fully specified project row. Members and sections are not touched.
    pub async fn insert_project(&self, project: &Project) -> Result<(), DatabaseError> {
        self.db()
            .execute(
                &format!(
                    "INSERT INTO projects ({PROJECT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                ),
                libsql::params![
                    project.id.as_str(),
                    project.name.as_str(),
                    project.project_type_id.as_str(),
                    project.language.as_str(),
                    to_json(&project.data)?,
                    project.source.as_str(),
                    i64::from(project.readonly),
                    to_json(&project.imported_members)?,
                    project.created_at.to_rfc3339(),
                    project.updated_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get_project(&self, id: &str) -> Result<Project, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("project", id))?;
        row_to_project(&row)
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at, id"),
                (),
            )
            .await?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            projects.push(row_to_project(&row)?);
        }
        Ok(projects)
    }

    pub async fn update_project(
        &self,
        id: &str,
        update: ProjectUpdate,
    ) -> Result<Project, DatabaseError> {
        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1;

        if let Some(ref name) = update.name {
            sets.push(format!("name = ?{idx}"));
            params.push(name.as_str().into());
            idx += 1;
        }
        if let Some(ref language) = update.language {
            sets.push(format!("language = ?{idx}"));
            params.push(language.as_str().into());
            idx += 1;
        }
        if let Some(readonly) = update.readonly {
            sets.push(format!("readonly = ?{idx}"));
            params.push(i64::from(readonly).into());
            idx += 1;
        }

        if sets.is_empty() {
            return self.get_project(id).await;
        }

        sets.push(format!("updated_at = ?{idx}"));
        params.push(self.now().to_rfc3339().into());
        idx += 1;
        params.push(id.into());

        let sql = format!("UPDATE projects SET {} WHERE id = ?{idx}", sets.join(", "));
        let changed = self
            .db()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("project", id));
        }
        self.get_project(id).await
    }

    /// Merge `patch` into the project's report data.
    pub async fn update_project_data(
        &self,
        id: &str,
        patch: &FieldData,
    ) -> Result<Project, DatabaseError> {
        let project = self.get_project(id).await?;
        let data = merge_data(&project.data, patch);
        self.db()
            .execute(
                "UPDATE projects SET data = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![to_json(&data)?, self.now().to_rfc3339(), id],
            )
            .await?;
        self.get_project(id).await
    }

    pub async fn set_imported_members(
        &self,
        id: &str,
        members: &[ImportedMember],
    ) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .execute(
                "UPDATE projects SET imported_members = ?1 WHERE id = ?2",
                libsql::params![to_json(members)?, id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("project", id));
        }
        Ok(())
    }

    /// Images of the project, ordered by name.
    pub async fn list_images(
        &self,
        project_id: &str,
    ) -> Result<Vec<rv_core::entities::UploadedFile>, DatabaseError> {
        self.list_files(&LinkedObject::Project(project_id.to_string()))
            .await
    }
}
