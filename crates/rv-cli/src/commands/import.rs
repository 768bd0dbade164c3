use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::cli::{DocumentKind, GlobalFlags};
use crate::commands::export::kind_label;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct Imported {
    id: String,
    name: Option<String>,
    source: rv_core::enums::SourceEnum,
}

#[derive(Debug, Serialize)]
struct ImportSummary {
    kind: &'static str,
    imported: Vec<Imported>,
}

pub async fn handle(
    kind: DocumentKind,
    path: &Path,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let archiver = ctx.archiver();

    let imported = match kind {
        DocumentKind::Templates => archiver
            .import_templates(reader)
            .await?
            .into_iter()
            .map(|t| Imported {
                name: t.data.get("title").and_then(|v| v.as_str()).map(String::from),
                id: t.id,
                source: t.source,
            })
            .collect(),
        DocumentKind::ProjectTypes => archiver
            .import_project_types(reader)
            .await?
            .into_iter()
            .map(|pt| Imported {
                id: pt.id,
                name: Some(pt.name),
                source: pt.source,
            })
            .collect(),
        DocumentKind::Projects => archiver
            .import_projects(reader)
            .await?
            .into_iter()
            .map(|p| Imported {
                id: p.id,
                name: Some(p.name),
                source: p.source,
            })
            .collect(),
    };

    output(
        &ImportSummary {
            kind: kind_label(kind),
            imported,
        },
        flags.format,
    )
}
