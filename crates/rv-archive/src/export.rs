//! Export: walk the object graph and plan archive entries.
//!
//! All database reads happen before the stream is returned. The stream itself
//! only reads blobs, so nothing is mutated during export.

use std::collections::{HashMap, HashSet};

use rv_core::entities::{FindingTemplate, ImportedMember, Project, ProjectType};
use rv_core::fields::collect_user_references;

use crate::Archiver;
use crate::codec::{self, ArchiveStream, PlannedEntry};
use crate::error::ArchiveError;
use crate::manifest::{
    FORMAT_PROJECTS, FileManifest, FindingManifest, ProjectManifest, ProjectTypeManifest,
    SectionManifest, TemplateManifest, asset_path, image_path, manifest_path,
};

/// Entries of one archive. Manifests come first, payloads after them, and a
/// payload path is written once even if several manifests refer to it.
#[derive(Default)]
struct ExportPlan {
    manifests: Vec<PlannedEntry>,
    payloads: Vec<PlannedEntry>,
    payload_paths: HashSet<String>,
}

impl ExportPlan {
    fn manifest(&mut self, id: &str, manifest: &impl serde::Serialize) -> Result<(), ArchiveError> {
        self.manifests
            .push(PlannedEntry::json(manifest_path(id), manifest)?);
        Ok(())
    }

    fn payload(&mut self, path: String, key: &str) {
        if self.payload_paths.insert(path.clone()) {
            self.payloads.push(PlannedEntry::blob(path, key));
        }
    }

    fn into_entries(self) -> Vec<PlannedEntry> {
        let mut entries = self.manifests;
        entries.extend(self.payloads);
        entries
    }
}

impl Archiver<'_> {
    // Async like the other exports, though templates own no files.
    #[allow(clippy::unused_async)]
    pub async fn export_templates(
        &self,
        templates: &[FindingTemplate],
    ) -> Result<ArchiveStream, ArchiveError> {
        let mut plan = ExportPlan::default();
        for template in templates {
            plan.manifest(&template.id, &TemplateManifest::from(template))?;
        }
        tracing::info!(count = templates.len(), "exporting templates");
        Ok(self.encode(plan))
    }

    /// Export project types together with their assets.
    pub async fn export_project_types(
        &self,
        project_types: &[ProjectType],
    ) -> Result<ArchiveStream, ArchiveError> {
        let mut plan = ExportPlan::default();
        for project_type in project_types {
            let manifest = self.project_type_manifest(project_type, &mut plan).await?;
            plan.manifest(&project_type.id, &manifest)?;
        }
        tracing::info!(count = project_types.len(), "exporting project types");
        Ok(self.encode(plan))
    }

    /// Export projects with sections, findings, images, and their embedded
    /// project type (including its assets).
    pub async fn export_projects(&self, projects: &[Project]) -> Result<ArchiveStream, ArchiveError> {
        let mut plan = ExportPlan::default();
        let mut users = UserSnapshots::default();
        for project in projects {
            let manifest = self.project_manifest(project, &mut plan, &mut users).await?;
            plan.manifest(&project.id, &manifest)?;
        }
        tracing::info!(count = projects.len(), "exporting projects");
        Ok(self.encode(plan))
    }

    fn encode(&self, plan: ExportPlan) -> ArchiveStream {
        codec::encode(plan.into_entries(), self.svc.files().clone(), &self.config)
    }

    async fn project_type_manifest(
        &self,
        project_type: &ProjectType,
        plan: &mut ExportPlan,
    ) -> Result<ProjectTypeManifest, ArchiveError> {
        let assets = self.svc.list_assets(&project_type.id).await?;
        for asset in &assets {
            plan.payload(asset_path(&project_type.id, &asset.name), &asset.file);
        }
        Ok(ProjectTypeManifest::new(project_type, &assets))
    }

    async fn project_manifest(
        &self,
        project: &Project,
        plan: &mut ExportPlan,
        users: &mut UserSnapshots,
    ) -> Result<ProjectManifest, ArchiveError> {
        let project_type = self.svc.get_project_type(&project.project_type_id).await?;
        let project_type_manifest = self.project_type_manifest(&project_type, plan).await?;

        let mut members = Vec::new();
        for member in self.svc.list_members(&project.id).await? {
            if let Some(snapshot) = users.get(self, &member.user_id).await? {
                members.push(ImportedMember {
                    roles: member.roles,
                    ..snapshot
                });
            }
        }

        let mut sections = Vec::new();
        for section in self.svc.list_sections(&project.id).await? {
            sections.push(SectionManifest {
                id: section.section_id,
                created: section.created_at,
                assignee: users.get_opt(self, section.assignee_id.as_deref()).await?,
                status: section.status,
            });
        }

        let mut referenced = collect_user_references(&project.data, &project_type.report_fields);
        let mut findings = Vec::new();
        for finding in self.svc.list_findings(&project.id).await? {
            for id in collect_user_references(&finding.data, &project_type.finding_fields) {
                if !referenced.contains(&id) {
                    referenced.push(id);
                }
            }
            findings.push(FindingManifest {
                id: finding.finding_id,
                created: finding.created_at,
                assignee: users.get_opt(self, finding.assignee_id.as_deref()).await?,
                template: finding.template_id,
                status: finding.status,
                data: finding.data,
            });
        }

        let mut referenced_users = Vec::new();
        for id in &referenced {
            if let Some(snapshot) = users.get(self, id).await? {
                referenced_users.push(snapshot);
            }
        }

        let mut images = Vec::new();
        for image in self.svc.list_images(&project.id).await? {
            plan.payload(image_path(&project.id, &image.name), &image.file);
            images.push(FileManifest::from(&image));
        }

        Ok(ProjectManifest {
            format: FORMAT_PROJECTS.to_string(),
            id: project.id.clone(),
            created: project.created_at,
            name: project.name.clone(),
            language: project.language.clone(),
            readonly: project.readonly,
            project_type: project_type_manifest,
            members,
            imported_members: project.imported_members.clone(),
            referenced_users,
            report_data: project.data.clone(),
            sections,
            findings,
            images,
        })
    }
}

/// Profile snapshots (without roles) of users looked up during one export.
#[derive(Default)]
struct UserSnapshots {
    cache: HashMap<String, Option<ImportedMember>>,
}

impl UserSnapshots {
    /// Snapshot of user `id`, or `None` if no such user exists.
    async fn get(
        &mut self,
        archiver: &Archiver<'_>,
        id: &str,
    ) -> Result<Option<ImportedMember>, ArchiveError> {
        if let Some(cached) = self.cache.get(id) {
            return Ok(cached.clone());
        }
        let snapshot = archiver
            .svc
            .find_user(id, None)
            .await?
            .map(|user| ImportedMember::from_user(&user, Vec::new()));
        self.cache.insert(id.to_string(), snapshot.clone());
        Ok(snapshot)
    }

    async fn get_opt(
        &mut self,
        archiver: &Archiver<'_>,
        id: Option<&str>,
    ) -> Result<Option<ImportedMember>, ArchiveError> {
        match id {
            Some(id) => self.get(archiver, id).await,
            None => Ok(None),
        }
    }
}
