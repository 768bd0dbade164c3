//! Deep copy of projects and project types.
//!
//! A copy gets fresh identities for every row, `source = created`, no
//! readonly flag, and no locks. File records are duplicated but point at the
//! same blobs, so bytes are shared and stay alive as long as either side
//! references them.

use rv_core::entities::{Finding, Project, ProjectType, ReportSection};
use rv_core::enums::{LinkedObject, SourceEnum};
use rv_core::ids::{PREFIX_FINDING, PREFIX_PROJECT, PREFIX_PROJECT_TYPE, PREFIX_SECTION};

use crate::error::DatabaseError;
use crate::service::VaultService;

fn copy_name(name: &str) -> String {
    format!("{name} (Copy)")
}

impl VaultService {
    /// Copy a project with its members, sections, findings, and images.
    ///
    /// The copy uses the same project type as the original.
    pub async fn copy_project(&self, id: &str) -> Result<Project, DatabaseError> {
        self.db().begin().await?;
        let result = self.copy_project_rows(id).await;
        let copy = self.finish_transaction(result).await?;
        tracing::info!(source = %id, copy = %copy.id, "copied project");
        Ok(copy)
    }

    /// Copy a project type with its assets. `linked_project` is kept.
    pub async fn copy_project_type(&self, id: &str) -> Result<ProjectType, DatabaseError> {
        self.db().begin().await?;
        let result = self.copy_project_type_rows(id).await;
        let copy = self.finish_transaction(result).await?;
        tracing::info!(source = %id, copy = %copy.id, "copied project type");
        Ok(copy)
    }

    async fn copy_project_rows(&self, id: &str) -> Result<Project, DatabaseError> {
        let original = self.get_project(id).await?;
        let now = self.now();
        let copy = Project {
            id: self.db().generate_id(PREFIX_PROJECT).await?,
            name: copy_name(&original.name),
            source: SourceEnum::Created,
            readonly: false,
            created_at: now,
            updated_at: now,
            ..original.clone()
        };
        self.insert_project(&copy).await?;

        for member in self.list_members(id).await? {
            self.add_member(&copy.id, &member).await?;
        }

        for section in self.list_sections(id).await? {
            self.insert_section(&ReportSection {
                id: self.db().generate_id(PREFIX_SECTION).await?,
                project_id: copy.id.clone(),
                created_at: now,
                updated_at: now,
                ..section
            })
            .await?;
        }

        for finding in self.list_findings(id).await? {
            self.insert_finding(&Finding {
                id: self.db().generate_id(PREFIX_FINDING).await?,
                project_id: copy.id.clone(),
                created_at: now,
                updated_at: now,
                ..finding
            })
            .await?;
        }

        let owner = LinkedObject::Project(copy.id.clone());
        for image in self.list_images(id).await? {
            self.link_file(&owner, &image.name, &image.file).await?;
        }

        Ok(copy)
    }

    async fn copy_project_type_rows(&self, id: &str) -> Result<ProjectType, DatabaseError> {
        let original = self.get_project_type(id).await?;
        let now = self.now();
        let copy = ProjectType {
            id: self.db().generate_id(PREFIX_PROJECT_TYPE).await?,
            name: copy_name(&original.name),
            source: SourceEnum::Created,
            created_at: now,
            updated_at: now,
            ..original.clone()
        };
        self.insert_project_type(&copy).await?;

        let owner = LinkedObject::ProjectType(copy.id.clone());
        for asset in self.list_assets(id).await? {
            self.link_file(&owner, &asset.name, &asset.file).await?;
        }

        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::helpers::{
        create_project, create_project_type, create_template, create_user, test_service,
    };
    use crate::updates::finding::FindingUpdateBuilder;
    use crate::updates::project::ProjectUpdateBuilder;
    use pretty_assertions::assert_eq;
    use rv_core::enums::{LockTarget, SourceEnum};

    #[tokio::test]
    async fn copy_project_resets_state_and_shares_blobs() {
        let svc = test_service().await;
        let user = create_user(&svc, "alice").await;
        let pt = create_project_type(&svc).await;
        let project = create_project(&svc, &pt, &[&user]).await;
        svc.update_project(&project.id, ProjectUpdateBuilder::new().readonly(true).build())
            .await
            .unwrap();
        let template = create_template(&svc).await;
        let finding = svc.list_findings(&project.id).await.unwrap().remove(0);
        svc.update_finding(
            &finding.id,
            FindingUpdateBuilder::new()
                .assignee(Some(user.id.clone()))
                .template(Some(template.id.clone()))
                .build(),
        )
        .await
        .unwrap();
        let section = svc.list_sections(&project.id).await.unwrap().remove(0);
        svc.lock(&LockTarget::finding(&finding.id), &user.id).await.unwrap();
        svc.lock(&LockTarget::section(&section.id), &user.id).await.unwrap();

        let original = svc.get_project(&project.id).await.unwrap();
        let copy = svc.copy_project(&project.id).await.unwrap();

        assert_ne!(copy.id, original.id);
        assert!(copy.name.contains(&original.name));
        assert_eq!(copy.source, SourceEnum::Created);
        assert!(!copy.readonly);
        assert_eq!(copy.language, original.language);
        assert_eq!(copy.project_type_id, original.project_type_id);
        assert_eq!(copy.imported_members, original.imported_members);
        assert_eq!(copy.data_all(&pt), original.data_all(&pt));
        assert_eq!(
            svc.list_members(&copy.id).await.unwrap(),
            svc.list_members(&original.id).await.unwrap()
        );

        let sections = svc.list_sections(&original.id).await.unwrap();
        let copied_sections = svc.list_sections(&copy.id).await.unwrap();
        assert_eq!(sections.len(), copied_sections.len());
        for (o, c) in sections.iter().zip(&copied_sections) {
            assert_ne!(o.id, c.id);
            assert_eq!(o.section_id, c.section_id);
            assert_eq!(o.assignee_id, c.assignee_id);
            assert!(!svc.is_section_locked(&c.id).await.unwrap());
        }

        let findings = svc.list_findings(&original.id).await.unwrap();
        let copied_findings = svc.list_findings(&copy.id).await.unwrap();
        assert_eq!(findings.len(), copied_findings.len());
        for (o, c) in findings.iter().zip(&copied_findings) {
            assert_ne!(o.id, c.id);
            assert_eq!(o.finding_id, c.finding_id);
            assert_eq!(o.assignee_id, c.assignee_id);
            assert_eq!(o.template_id, c.template_id);
            assert_eq!(o.data, c.data);
            assert!(!svc.is_finding_locked(&c.id).await.unwrap());
        }

        // The source keeps its locks.
        assert!(svc.is_finding_locked(&finding.id).await.unwrap());
        assert!(svc.is_section_locked(&section.id).await.unwrap());

        let images = svc.list_images(&original.id).await.unwrap();
        let copied_images = svc.list_images(&copy.id).await.unwrap();
        assert_eq!(images.len(), copied_images.len());
        for (o, c) in images.iter().zip(&copied_images) {
            assert_ne!(o.id, c.id);
            assert_eq!(o.name, c.name);
            assert_eq!(o.file, c.file);
        }
    }

    #[tokio::test]
    async fn copied_images_survive_original_deletion() {
        let svc = test_service().await;
        let pt = create_project_type(&svc).await;
        let project = create_project(&svc, &pt, &[]).await;
        let copy = svc.copy_project(&project.id).await.unwrap();
        let images = svc.list_images(&project.id).await.unwrap();

        svc.delete_project(&project.id).await.unwrap();

        for image in &images {
            assert!(svc.files().exists(&image.file).await.unwrap());
        }
        for image in svc.list_images(&copy.id).await.unwrap() {
            assert!(!svc.read_file(&image).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn copy_project_type_keeps_schema_and_link() {
        let svc = test_service().await;
        let user = create_user(&svc, "alice").await;
        let pt = create_project_type(&svc).await;
        let project = create_project(&svc, &pt, &[]).await;
        svc.set_linked_project(&pt.id, Some(&project.id)).await.unwrap();
        svc.lock(&LockTarget::project_type(&pt.id), &user.id).await.unwrap();
        let original = svc.get_project_type(&pt.id).await.unwrap();

        let copy = svc.copy_project_type(&pt.id).await.unwrap();

        assert_ne!(copy.id, original.id);
        assert!(copy.name.contains(&original.name));
        assert_eq!(copy.source, SourceEnum::Created);
        assert!(!svc.is_locked(&LockTarget::project_type(&copy.id)).await.unwrap());
        assert_eq!(copy.language, original.language);
        assert_eq!(copy.linked_project, original.linked_project);
        assert_eq!(copy.report_template, original.report_template);
        assert_eq!(copy.report_styles, original.report_styles);
        assert_eq!(copy.report_preview_data, original.report_preview_data);
        assert_eq!(copy.report_fields, original.report_fields);
        assert_eq!(copy.report_sections, original.report_sections);
        assert_eq!(copy.finding_fields, original.finding_fields);
        assert_eq!(copy.finding_field_order, original.finding_field_order);

        let assets = svc.list_assets(&original.id).await.unwrap();
        let copied = svc.list_assets(&copy.id).await.unwrap();
        for (o, c) in assets.iter().zip(&copied) {
            assert_ne!(o.id, c.id);
            assert_eq!(o.name, c.name);
            assert_eq!(svc.read_file(o).await.unwrap(), svc.read_file(c).await.unwrap());
        }
    }

    #[tokio::test]
    async fn copied_assets_survive_original_deletion() {
        let svc = test_service().await;
        let pt = create_project_type(&svc).await;
        let copy = svc.copy_project_type(&pt.id).await.unwrap();
        let assets = svc.list_assets(&pt.id).await.unwrap();

        svc.delete_project_type(&pt.id).await.unwrap();

        for asset in &assets {
            assert!(svc.files().exists(&asset.file).await.unwrap());
        }
        assert_eq!(svc.list_assets(&copy.id).await.unwrap().len(), 2);
    }
}
