//! Finding template repository.

use rv_core::entities::FindingTemplate;
use rv_core::enums::{ReviewStatus, SourceEnum};
use rv_core::fields::{FieldData, merge_data};
use rv_core::ids::PREFIX_TEMPLATE;

use crate::error::DatabaseError;
use crate::helpers::{parse_datetime, parse_enum, parse_json, to_json};
use crate::service::VaultService;

const TEMPLATE_COLUMNS: &str = "id, language, status, tags, data, source, created_at, updated_at";

fn row_to_template(row: &libsql::Row) -> Result<FindingTemplate, DatabaseError> {
    Ok(FindingTemplate {
        id: row.get::<String>(0)?,
        language: row.get::<String>(1)?,
        status: parse_enum(&row.get::<String>(2)?)?,
        tags: parse_json(&row.get::<String>(3)?)?,
        data: parse_json(&row.get::<String>(4)?)?,
        source: parse_enum(&row.get::<String>(5)?)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        updated_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

#[derive(Debug, Clone, Default)]
pub struct NewTemplate {
    pub language: String,
    pub tags: Vec<String>,
    pub data: FieldData,
}

impl VaultService {
    pub async fn create_template(&self, new: NewTemplate) -> Result<FindingTemplate, DatabaseError> {
        let now = self.now();
        let template = FindingTemplate {
            id: self.db().generate_id(PREFIX_TEMPLATE).await?,
            language: new.language,
            status: ReviewStatus::InProgress,
            tags: new.tags,
            data: new.data,
            source: SourceEnum::Created,
            created_at: now,
            updated_at: now,
        };
        self.insert_template(&template).await?;
        Ok(template)
    }

    /// Insert a fully specified template row (id, source, and timestamps as given).
    pub async fn insert_template(&self, template: &FindingTemplate) -> Result<(), DatabaseError> {
        self.db()
            .execute(
                &format!("INSERT INTO finding_templates ({TEMPLATE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                libsql::params![
                    template.id.as_str(),
                    template.language.as_str(),
                    template.status.as_str(),
                    to_json(&template.tags)?,
                    to_json(&template.data)?,
                    template.source.as_str(),
                    template.created_at.to_rfc3339(),
                    template.updated_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get_template(&self, id: &str) -> Result<FindingTemplate, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                &format!("SELECT {TEMPLATE_COLUMNS} FROM finding_templates WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("finding template", id))?;
        row_to_template(&row)
    }

    pub async fn template_exists(&self, id: &str) -> Result<bool, DatabaseError> {
        let n = self
            .db()
            .count("SELECT COUNT(*) FROM finding_templates WHERE id = ?1", [id])
            .await?;
        Ok(n > 0)
    }

    pub async fn list_templates(&self) -> Result<Vec<FindingTemplate>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                &format!("SELECT {TEMPLATE_COLUMNS} FROM finding_templates ORDER BY created_at, id"),
                (),
            )
            .await?;
        let mut templates = Vec::new();
        while let Some(row) = rows.next().await? {
            templates.push(row_to_template(&row)?);
        }
        Ok(templates)
    }

    /// Merge `patch` into the template's data.
    pub async fn update_template_data(
        &self,
        id: &str,
        patch: &FieldData,
    ) -> Result<FindingTemplate, DatabaseError> {
        let template = self.get_template(id).await?;
        let data = merge_data(&template.data, patch);
        self.db()
            .execute(
                "UPDATE finding_templates SET data = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![to_json(&data)?, self.now().to_rfc3339(), id],
            )
            .await?;
        self.get_template(id).await
    }

    pub async fn set_template_status(
        &self,
        id: &str,
        status: ReviewStatus,
    ) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .execute(
                "UPDATE finding_templates SET status = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![status.as_str(), self.now().to_rfc3339(), id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("finding template", id));
        }
        Ok(())
    }

    /// Delete a template. Findings created from it keep their data and lose
    /// the reference.
    pub async fn delete_template(&self, id: &str) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .execute("DELETE FROM finding_templates WHERE id = ?1", [id])
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("finding template", id));
        }
        tracing::info!(template = %id, "deleted finding template");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{create_template, data, test_service};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn create_template_roundtrip() {
        let svc = test_service().await;
        let template = create_template(&svc).await;

        assert!(template.id.starts_with("tpl-"));
        assert_eq!(template.source, SourceEnum::Created);
        let fetched = svc.get_template(&template.id).await.unwrap();
        assert_eq!(fetched, template);
        assert!(svc.template_exists(&template.id).await.unwrap());
    }

    #[tokio::test]
    async fn data_all_fills_finding_defaults() {
        let svc = test_service().await;
        let template = create_template(&svc).await;
        let all = template.data_all();
        assert_eq!(all["title"], json!("Template Title"));
        assert_eq!(all["cvss"], json!("n/a"));
        assert_eq!(all["undefined_field"], json!("test"));
    }

    #[tokio::test]
    async fn update_data_merges() {
        let svc = test_service().await;
        let template = create_template(&svc).await;
        let updated = svc
            .update_template_data(&template.id, &data(json!({"title": "New"})))
            .await
            .unwrap();
        assert_eq!(updated.data["title"], json!("New"));
        assert_eq!(updated.data["description"], json!("Template Description"));
    }

    #[tokio::test]
    async fn delete_template_twice() {
        let svc = test_service().await;
        let template = create_template(&svc).await;
        svc.delete_template(&template.id).await.unwrap();
        assert!(!svc.template_exists(&template.id).await.unwrap());
        assert!(svc.delete_template(&template.id).await.is_err());
    }
}
