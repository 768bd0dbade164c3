//! Delete cascades.
//!
//! Deleting a project removes its members, sections, findings (via foreign
//! keys), its images and its locks, and then handles project types whose
//! `linked_project` is the deleted project: a type no other project uses is
//! deleted as well, a type still in use only loses the back-reference.
//!
//! Blobs of deleted file records are released after the transaction
//! committed, and only if no other record still points at them.

use rv_core::enums::{LinkedObject, LockKind};

use crate::error::DatabaseError;
use crate::service::VaultService;

impl VaultService {
    /// Delete a project and everything it exclusively owns.
    pub async fn delete_project(&self, id: &str) -> Result<(), DatabaseError> {
        self.db().begin().await?;
        let result = self.delete_project_rows(id).await;
        let keys = self.finish_transaction(result).await?;
        let removed = self.release_blobs(&keys).await?;
        tracing::info!(project = %id, blobs_removed = removed, "deleted project");
        Ok(())
    }

    /// Delete a project type with its assets.
    ///
    /// # Errors
    ///
    /// `DatabaseError::InUse` if a project still uses the type.
    pub async fn delete_project_type(&self, id: &str) -> Result<(), DatabaseError> {
        self.db().begin().await?;
        let result = self.delete_unused_project_type_rows(id).await;
        let keys = self.finish_transaction(result).await?;
        let removed = self.release_blobs(&keys).await?;
        tracing::info!(project_type = %id, blobs_removed = removed, "deleted project type");
        Ok(())
    }

    async fn delete_project_rows(&self, id: &str) -> Result<Vec<String>, DatabaseError> {
        // Fails with NotFound before anything is touched.
        self.get_project(id).await?;

        let section_ids: Vec<String> = self
            .list_sections(id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        let finding_ids: Vec<String> = self
            .list_findings(id)
            .await?
            .into_iter()
            .map(|f| f.id)
            .collect();
        self.clear_locks(LockKind::Section, &section_ids).await?;
        self.clear_locks(LockKind::Finding, &finding_ids).await?;

        let mut keys = self
            .delete_files_of(&LinkedObject::Project(id.to_string()))
            .await?;
        self.db()
            .execute("DELETE FROM projects WHERE id = ?1", [id])
            .await?;

        for project_type in self.project_types_linked_to(id).await? {
            if self.project_type_usage(&project_type.id).await? > 0 {
                self.set_linked_project(&project_type.id, None).await?;
                tracing::debug!(
                    project_type = %project_type.id,
                    "linked project deleted; project type still in use, unlinked"
                );
            } else {
                keys.extend(self.delete_project_type_rows(&project_type.id).await?);
                tracing::debug!(
                    project_type = %project_type.id,
                    "linked project deleted; project type deleted"
                );
            }
        }

        Ok(keys)
    }

    async fn delete_unused_project_type_rows(&self, id: &str) -> Result<Vec<String>, DatabaseError> {
        self.get_project_type(id).await?;
        let usage = self.project_type_usage(id).await?;
        if usage > 0 {
            return Err(DatabaseError::InUse {
                entity: "project type",
                id: id.to_string(),
                reason: format!("used by {usage} project(s)"),
            });
        }
        self.delete_project_type_rows(id).await
    }

    async fn delete_project_type_rows(&self, id: &str) -> Result<Vec<String>, DatabaseError> {
        self.clear_locks(LockKind::ProjectType, &[id.to_string()])
            .await?;
        let keys = self
            .delete_files_of(&LinkedObject::ProjectType(id.to_string()))
            .await?;
        self.db()
            .execute("DELETE FROM project_types WHERE id = ?1", [id])
            .await?;
        Ok(keys)
    }
}
