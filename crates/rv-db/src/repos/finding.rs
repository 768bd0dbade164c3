//! Finding repository.

use rv_core::entities::Finding;
use rv_core::enums::{LockTarget, ReviewStatus};
use rv_core::fields::{FieldData, merge_data};
use rv_core::ids::PREFIX_FINDING;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_json, to_json};
use crate::service::VaultService;
use crate::updates::finding::FindingUpdate;

const FINDING_COLUMNS: &str = "id, project_id, finding_id, assignee_id, template_id, status, \
                               data, created_at, updated_at";

fn row_to_finding(row: &libsql::Row) -> Result<Finding, DatabaseError> {
    Ok(Finding {
        id: row.get::<String>(0)?,
        project_id: row.get::<String>(1)?,
        finding_id: row.get::<String>(2)?,
        assignee_id: get_opt_string(row, 3)?,
        template_id: get_opt_string(row, 4)?,
        status: parse_enum(&row.get::<String>(5)?)?,
        data: parse_json(&row.get::<String>(6)?)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

impl VaultService {
    /// Create a finding with a fresh stable `finding_id`.
    pub async fn create_finding(
        &self,
        project_id: &str,
        data: FieldData,
        template_id: Option<&str>,
    ) -> Result<Finding, DatabaseError> {
        let mut rows = self
            .db()
            .query("SELECT lower(hex(randomblob(8)))", ())
            .await?;
        let finding_id = rows
            .next()
            .await?
            .ok_or(DatabaseError::NoResult)?
            .get::<String>(0)?;

        let now = self.now();
        let finding = Finding {
            id: self.db().generate_id(PREFIX_FINDING).await?,
            project_id: project_id.to_string(),
            finding_id,
            assignee_id: None,
            template_id: template_id.map(String::from),
            status: ReviewStatus::InProgress,
            data,
            created_at: now,
            updated_at: now,
        };
        self.insert_finding(&finding).await?;
        Ok(finding)
    }

    /// Insert a fully specified finding row.
    pub async fn insert_finding(&self, finding: &Finding) -> Result<(), DatabaseError> {
        self.db()
            .execute(
                &format!("INSERT INTO findings ({FINDING_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
                libsql::params![
                    finding.id.as_str(),
                    finding.project_id.as_str(),
                    finding.finding_id.as_str(),
                    finding.assignee_id.as_deref(),
                    finding.template_id.as_deref(),
                    finding.status.as_str(),
                    to_json(&finding.data)?,
                    finding.created_at.to_rfc3339(),
                    finding.updated_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get_finding(&self, id: &str) -> Result<Finding, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                &format!("SELECT {FINDING_COLUMNS} FROM findings WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("finding", id))?;
        row_to_finding(&row)
    }

    /// Findings of a project ordered by their stable `finding_id`.
    pub async fn list_findings(&self, project_id: &str) -> Result<Vec<Finding>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                &format!("SELECT {FINDING_COLUMNS} FROM findings WHERE project_id = ?1 ORDER BY finding_id"),
                [project_id],
            )
            .await?;
        let mut findings = Vec::new();
        while let Some(row) = rows.next().await? {
            findings.push(row_to_finding(&row)?);
        }
        Ok(findings)
    }

    pub async fn update_finding(
        &self,
        id: &str,
        update: FindingUpdate,
    ) -> Result<Finding, DatabaseError> {
        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1;

        if let Some(ref assignee) = update.assignee_id {
            sets.push(format!("assignee_id = ?{idx}"));
            params.push(assignee.as_deref().into());
            idx += 1;
        }
        if let Some(ref template) = update.template_id {
            sets.push(format!("template_id = ?{idx}"));
            params.push(template.as_deref().into());
            idx += 1;
        }
        if let Some(status) = update.status {
            sets.push(format!("status = ?{idx}"));
            params.push(status.as_str().into());
            idx += 1;
        }

        if sets.is_empty() {
            return self.get_finding(id).await;
        }

        sets.push(format!("updated_at = ?{idx}"));
        params.push(self.now().to_rfc3339().into());
        idx += 1;
        params.push(id.into());

        let sql = format!("UPDATE findings SET {} WHERE id = ?{idx}", sets.join(", "));
        let changed = self
            .db()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("finding", id));
        }
        self.get_finding(id).await
    }

    /// Merge `patch` into the finding's data.
    pub async fn update_finding_data(
        &self,
        id: &str,
        patch: &FieldData,
    ) -> Result<Finding, DatabaseError> {
        let finding = self.get_finding(id).await?;
        let data = merge_data(&finding.data, patch);
        self.db()
            .execute(
                "UPDATE findings SET data = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![to_json(&data)?, self.now().to_rfc3339(), id],
            )
            .await?;
        self.get_finding(id).await
    }

    pub async fn delete_finding(&self, id: &str) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .execute("DELETE FROM findings WHERE id = ?1", [id])
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("finding", id));
        }
        self.db()
            .execute(
                "DELETE FROM locks WHERE object_kind = 'finding' AND object_id = ?1",
                [id],
            )
            .await?;
        Ok(())
    }

    /// Whether the finding is currently locked.
    pub async fn is_finding_locked(&self, id: &str) -> Result<bool, DatabaseError> {
        self.is_locked(&LockTarget::finding(id)).await
    }
}
