use std::path::{Path, PathBuf};

use anyhow::Context;
use futures_util::TryStreamExt;
use rv_archive::ArchiveStream;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::cli::{DocumentKind, GlobalFlags};
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ExportSummary<'a> {
    kind: &'static str,
    ids: &'a [String],
    path: String,
    bytes: u64,
}

pub async fn handle(
    kind: DocumentKind,
    ids: &[String],
    path: &Path,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    let archiver = ctx.archiver();

    let stream = match kind {
        DocumentKind::Templates => {
            let mut templates = Vec::with_capacity(ids.len());
            for id in ids {
                templates.push(svc.get_template(id).await?);
            }
            archiver.export_templates(&templates).await?
        }
        DocumentKind::ProjectTypes => {
            let mut project_types = Vec::with_capacity(ids.len());
            for id in ids {
                project_types.push(svc.get_project_type(id).await?);
            }
            archiver.export_project_types(&project_types).await?
        }
        DocumentKind::Projects => {
            let mut projects = Vec::with_capacity(ids.len());
            for id in ids {
                projects.push(svc.get_project(id).await?);
            }
            archiver.export_projects(&projects).await?
        }
    };

    let bytes = write_archive(stream, path).await?;

    output(
        &ExportSummary {
            kind: kind_label(kind),
            ids,
            path: path.display().to_string(),
            bytes,
        },
        flags.format,
    )
}

/// Write `stream` to `path` through a `.partial` sibling, renamed into place
/// once the whole archive is written. A failed export leaves no file behind.
async fn write_archive(mut stream: ArchiveStream, path: &Path) -> anyhow::Result<u64> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    let result = async {
        let mut file = tokio::fs::File::create(&partial)
            .await
            .with_context(|| format!("failed to create {}", partial.display()))?;
        let mut bytes = 0u64;
        while let Some(chunk) = stream.try_next().await? {
            file.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
        }
        file.flush().await?;
        anyhow::Ok(bytes)
    }
    .await;

    match result {
        Ok(bytes) => {
            tokio::fs::rename(&partial, path)
                .await
                .with_context(|| format!("failed to move archive to {}", path.display()))?;
            Ok(bytes)
        }
        Err(e) => {
            if let Err(remove_err) = tokio::fs::remove_file(&partial).await {
                tracing::warn!(error = %remove_err, path = %partial.display(), "failed to remove partial archive");
            }
            Err(e)
        }
    }
}

pub const fn kind_label(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Templates => "templates",
        DocumentKind::ProjectTypes => "project-types",
        DocumentKind::Projects => "projects",
    }
}
