//! Import: decode an archive and rebuild its documents.
//!
//! Each import runs in one transaction. Blobs written by a failed import are
//! released after the rollback, so nothing is left behind.
//!
//! References are resolved against this installation:
//! - users by id, then by email; unresolved users become `imported_members`
//!   snapshots and their assignee fields are cleared. `user` fields are
//!   rewritten to the local id of a resolved user
//! - finding templates by id; unresolved references are cleared
//! - the embedded project type is always re-created, linked to the new project

use std::collections::HashMap;
use std::io::Read;

use rv_core::entities::{
    Finding, FindingTemplate, ImportedMember, Project, ProjectMember, ProjectType, ReportSection,
};
use rv_core::enums::{LinkedObject, ReviewStatus, SourceEnum};
use rv_core::fields::rewrite_user_references;
use rv_core::ids::{
    PREFIX_FINDING, PREFIX_PROJECT, PREFIX_PROJECT_TYPE, PREFIX_SECTION, PREFIX_TEMPLATE,
};
use rv_db::VaultService;
use serde::de::DeserializeOwned;

use crate::Archiver;
use crate::codec::{self, ArchiveContents};
use crate::error::ArchiveError;
use crate::manifest::{
    ArchiveKind, FormatProbe, ProjectManifest, ProjectTypeManifest, TemplateManifest, asset_path,
    image_path,
};

impl Archiver<'_> {
    /// Import every template of a templates archive.
    pub async fn import_templates(
        &self,
        reader: impl Read + Send + 'static,
    ) -> Result<Vec<FindingTemplate>, ArchiveError> {
        let (contents, manifests) =
            self.read::<TemplateManifest>(reader, ArchiveKind::Templates).await?;
        let mut session = ImportSession::new(self.svc, &contents);

        self.svc.db().begin().await?;
        let result = session.templates(&manifests).await;
        let templates = session.finish(result).await?;
        tracing::info!(count = templates.len(), "imported templates");
        Ok(templates)
    }

    /// Import every project type of a project types archive, with assets.
    pub async fn import_project_types(
        &self,
        reader: impl Read + Send + 'static,
    ) -> Result<Vec<ProjectType>, ArchiveError> {
        let (contents, manifests) =
            self.read::<ProjectTypeManifest>(reader, ArchiveKind::ProjectTypes).await?;
        let mut session = ImportSession::new(self.svc, &contents);

        self.svc.db().begin().await?;
        let result = session.project_types(&manifests).await;
        let project_types = session.finish(result).await?;
        tracing::info!(count = project_types.len(), "imported project types");
        Ok(project_types)
    }

    /// Import every project of a projects archive.
    pub async fn import_projects(
        &self,
        reader: impl Read + Send + 'static,
    ) -> Result<Vec<Project>, ArchiveError> {
        let (contents, manifests) = self.read::<ProjectManifest>(reader, ArchiveKind::Projects).await?;
        let mut session = ImportSession::new(self.svc, &contents);

        self.svc.db().begin().await?;
        let result = session.projects(&manifests).await;
        let projects = session.finish(result).await?;
        tracing::info!(count = projects.len(), "imported projects");
        Ok(projects)
    }

    /// Decode on the blocking pool, then check and parse the manifests.
    async fn read<T: DeserializeOwned>(
        &self,
        reader: impl Read + Send + 'static,
        kind: ArchiveKind,
    ) -> Result<(ArchiveContents, Vec<T>), ArchiveError> {
        let max_entry_bytes = self.config.max_entry_bytes;
        let contents = tokio::task::spawn_blocking(move || codec::decode(reader, max_entry_bytes))
            .await
            .map_err(|e| ArchiveError::Io(std::io::Error::other(e)))??;
        let manifests = parse_manifests(&contents, kind)?;
        Ok((contents, manifests))
    }
}

/// Parse all manifests, rejecting archives of another kind.
fn parse_manifests<T: DeserializeOwned>(
    contents: &ArchiveContents,
    kind: ArchiveKind,
) -> Result<Vec<T>, ArchiveError> {
    if contents.manifests().is_empty() {
        return Err(ArchiveError::Validation(format!(
            "archive contains no {kind} manifests"
        )));
    }

    let mut manifests = Vec::with_capacity(contents.manifests().len());
    for (path, bytes) in contents.manifests() {
        let probe: FormatProbe = serde_json::from_slice(bytes)
            .map_err(|e| ArchiveError::Corrupt(format!("{path}: {e}")))?;
        let format = probe.format.unwrap_or_default();
        if format != kind.format() {
            return Err(ArchiveError::Validation(format!(
                "{path}: expected {} archive, found format {format:?}",
                kind.format()
            )));
        }
        manifests.push(
            serde_json::from_slice(bytes)
                .map_err(|e| ArchiveError::Corrupt(format!("{path}: {e}")))?,
        );
    }
    Ok(manifests)
}

/// Add `member` to `list`, merging roles if the id is already present.
fn add_imported_member(list: &mut Vec<ImportedMember>, member: ImportedMember) {
    if let Some(existing) = list.iter_mut().find(|m| m.id == member.id) {
        for role in member.roles {
            if !existing.roles.contains(&role) {
                existing.roles.push(role);
            }
        }
    } else {
        list.push(member);
    }
}

// ---------------------------------------------------------------------------
// ImportSession
// ---------------------------------------------------------------------------

struct ImportSession<'a> {
    svc: &'a VaultService,
    contents: &'a ArchiveContents,
    /// Blobs this import wrote that did not exist before.
    new_blobs: Vec<String>,
}

impl<'a> ImportSession<'a> {
    const fn new(svc: &'a VaultService, contents: &'a ArchiveContents) -> Self {
        Self {
            svc,
            contents,
            new_blobs: Vec::new(),
        }
    }

    /// Commit on success. On failure roll back and release new blobs.
    async fn finish<T>(self, result: Result<T, ArchiveError>) -> Result<T, ArchiveError> {
        match self.svc.finish_transaction(result).await {
            Ok(value) => Ok(value),
            Err(e) => {
                match self.svc.release_blobs(&self.new_blobs).await {
                    Ok(removed) => {
                        tracing::warn!(error = %e, blobs_removed = removed, "import rolled back");
                    }
                    Err(release_err) => {
                        tracing::error!(error = %release_err, "failed to release blobs of failed import");
                    }
                }
                Err(e)
            }
        }
    }

    async fn attach_file(
        &mut self,
        owner: &LinkedObject,
        path: &str,
        name: &str,
    ) -> Result<(), ArchiveError> {
        let stored = self.svc.files().store(name, self.contents.file(path)?).await?;
        if stored.created {
            self.new_blobs.push(stored.key.clone());
        }
        self.svc.link_file(owner, name, &stored.key).await?;
        Ok(())
    }

    // -- templates ----------------------------------------------------------

    async fn templates(
        &self,
        manifests: &[TemplateManifest],
    ) -> Result<Vec<FindingTemplate>, ArchiveError> {
        let mut templates = Vec::with_capacity(manifests.len());
        for manifest in manifests {
            let template = FindingTemplate {
                id: self.svc.db().generate_id(PREFIX_TEMPLATE).await?,
                language: manifest.language.clone(),
                status: manifest.status,
                tags: manifest.tags.clone(),
                data: manifest.data.clone(),
                source: SourceEnum::Imported,
                created_at: manifest.created,
                updated_at: self.svc.now(),
            };
            self.svc.insert_template(&template).await?;
            tracing::debug!(original = %manifest.id, id = %template.id, "imported template");
            templates.push(template);
        }
        Ok(templates)
    }

    // -- project types ------------------------------------------------------

    async fn project_types(
        &mut self,
        manifests: &[ProjectTypeManifest],
    ) -> Result<Vec<ProjectType>, ArchiveError> {
        let mut project_types = Vec::with_capacity(manifests.len());
        for manifest in manifests {
            project_types.push(self.project_type(manifest, SourceEnum::Imported).await?);
        }
        Ok(project_types)
    }

    async fn project_type(
        &mut self,
        manifest: &ProjectTypeManifest,
        source: SourceEnum,
    ) -> Result<ProjectType, ArchiveError> {
        let project_type = ProjectType {
            id: self.svc.db().generate_id(PREFIX_PROJECT_TYPE).await?,
            name: manifest.name.clone(),
            language: manifest.language.clone(),
            report_fields: manifest.report_fields.clone(),
            report_sections: manifest.report_sections.clone(),
            finding_fields: manifest.finding_fields.clone(),
            finding_field_order: manifest.finding_field_order.clone(),
            report_template: manifest.report_template.clone(),
            report_styles: manifest.report_styles.clone(),
            report_preview_data: manifest.report_preview_data.clone(),
            source,
            linked_project: None,
            created_at: manifest.created,
            updated_at: self.svc.now(),
        };
        project_type
            .validate()
            .map_err(|e| ArchiveError::Validation(format!("project type {}: {e}", manifest.id)))?;
        self.svc.insert_project_type(&project_type).await?;

        let owner = LinkedObject::ProjectType(project_type.id.clone());
        for asset in &manifest.assets {
            self.attach_file(&owner, &asset_path(&manifest.id, &asset.name), &asset.name)
                .await?;
        }
        tracing::debug!(
            original = %manifest.id,
            id = %project_type.id,
            assets = manifest.assets.len(),
            "imported project type"
        );
        Ok(project_type)
    }

    // -- projects -----------------------------------------------------------

    async fn projects(&mut self, manifests: &[ProjectManifest]) -> Result<Vec<Project>, ArchiveError> {
        let mut projects = Vec::with_capacity(manifests.len());
        for manifest in manifests {
            projects.push(self.project(manifest).await?);
        }
        Ok(projects)
    }

    async fn project(&mut self, manifest: &ProjectManifest) -> Result<Project, ArchiveError> {
        let project_type = self
            .project_type(&manifest.project_type, SourceEnum::ImportedDependency)
            .await?;
        let now = self.svc.now();

        let mut imported_members = Vec::new();
        for member in &manifest.imported_members {
            add_imported_member(&mut imported_members, member.clone());
        }

        // User fields point at local ids where the user resolves; unknown
        // users keep their archived id and are kept as snapshots.
        let mut user_ids = HashMap::new();
        for user in &manifest.referenced_users {
            match self.resolve_user(user).await? {
                Some(local) if local != user.id => {
                    user_ids.insert(user.id.clone(), local);
                }
                Some(_) => {}
                None => add_imported_member(&mut imported_members, user.clone()),
            }
        }

        let mut report_data = manifest.report_data.clone();
        rewrite_user_references(&mut report_data, &project_type.report_fields, &user_ids);

        let project = Project {
            id: self.svc.db().generate_id(PREFIX_PROJECT).await?,
            name: manifest.name.clone(),
            project_type_id: project_type.id.clone(),
            language: manifest.language.clone(),
            data: report_data,
            source: SourceEnum::Imported,
            readonly: manifest.readonly,
            imported_members: Vec::new(),
            created_at: manifest.created,
            updated_at: now,
        };
        self.svc.insert_project(&project).await?;
        self.svc
            .set_linked_project(&project_type.id, Some(&project.id))
            .await?;

        for member in &manifest.members {
            match self.resolve_user(member).await? {
                Some(user_id) => {
                    self.svc
                        .add_member(
                            &project.id,
                            &ProjectMember {
                                user_id,
                                roles: member.roles.clone(),
                            },
                        )
                        .await?;
                }
                None => add_imported_member(&mut imported_members, member.clone()),
            }
        }

        for section in &manifest.sections {
            let assignee_id = self
                .resolve_assignee(section.assignee.as_ref(), &mut imported_members)
                .await?;
            self.svc
                .insert_section(&ReportSection {
                    id: self.svc.db().generate_id(PREFIX_SECTION).await?,
                    project_id: project.id.clone(),
                    section_id: section.id.clone(),
                    assignee_id,
                    status: section.status,
                    created_at: section.created,
                    updated_at: now,
                })
                .await?;
        }
        // Sections the archive did not carry still exist in the project type.
        for definition in &project_type.report_sections {
            if !manifest.sections.iter().any(|s| s.id == definition.id) {
                self.svc
                    .insert_section(&ReportSection {
                        id: self.svc.db().generate_id(PREFIX_SECTION).await?,
                        project_id: project.id.clone(),
                        section_id: definition.id.clone(),
                        assignee_id: None,
                        status: ReviewStatus::default(),
                        created_at: now,
                        updated_at: now,
                    })
                    .await?;
            }
        }

        for finding in &manifest.findings {
            let assignee_id = self
                .resolve_assignee(finding.assignee.as_ref(), &mut imported_members)
                .await?;
            let template_id = match &finding.template {
                Some(id) if self.svc.template_exists(id).await? => Some(id.clone()),
                Some(id) => {
                    tracing::warn!(finding = %finding.id, template = %id, "finding template not found; reference cleared");
                    None
                }
                None => None,
            };
            let mut data = finding.data.clone();
            rewrite_user_references(&mut data, &project_type.finding_fields, &user_ids);
            self.svc
                .insert_finding(&Finding {
                    id: self.svc.db().generate_id(PREFIX_FINDING).await?,
                    project_id: project.id.clone(),
                    finding_id: finding.id.clone(),
                    assignee_id,
                    template_id,
                    status: finding.status,
                    data,
                    created_at: finding.created,
                    updated_at: now,
                })
                .await?;
        }

        let owner = LinkedObject::Project(project.id.clone());
        for image in &manifest.images {
            self.attach_file(&owner, &image_path(&manifest.id, &image.name), &image.name)
                .await?;
        }

        if !imported_members.is_empty() {
            self.svc
                .set_imported_members(&project.id, &imported_members)
                .await?;
        }

        tracing::debug!(
            original = %manifest.id,
            id = %project.id,
            sections = manifest.sections.len(),
            findings = manifest.findings.len(),
            images = manifest.images.len(),
            imported_members = imported_members.len(),
            "imported project"
        );
        Ok(self.svc.get_project(&project.id).await?)
    }

    /// Id of the local user matching `snapshot`, if any.
    async fn resolve_user(&self, snapshot: &ImportedMember) -> Result<Option<String>, ArchiveError> {
        let user = self
            .svc
            .find_user(&snapshot.id, snapshot.email.as_deref())
            .await?;
        if user.is_none() {
            tracing::warn!(user = %snapshot.id, "user not found; keeping profile snapshot");
        }
        Ok(user.map(|u| u.id))
    }

    async fn resolve_assignee(
        &self,
        snapshot: Option<&ImportedMember>,
        imported_members: &mut Vec<ImportedMember>,
    ) -> Result<Option<String>, ArchiveError> {
        let Some(snapshot) = snapshot else {
            return Ok(None);
        };
        let resolved = self.resolve_user(snapshot).await?;
        if resolved.is_none() {
            add_imported_member(
                imported_members,
                ImportedMember {
                    roles: Vec::new(),
                    ..snapshot.clone()
                },
            );
        }
        Ok(resolved)
    }
}
