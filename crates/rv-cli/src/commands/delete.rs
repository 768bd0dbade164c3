use serde::Serialize;

use crate::cli::{DeleteKind, GlobalFlags};
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct Deleted<'a> {
    kind: &'static str,
    id: &'a str,
    deleted: bool,
}

pub async fn handle(
    kind: DeleteKind,
    id: &str,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    let label = match kind {
        DeleteKind::Project => {
            svc.delete_project(id).await?;
            "project"
        }
        DeleteKind::ProjectType => {
            svc.delete_project_type(id).await?;
            "project-type"
        }
        DeleteKind::Template => {
            svc.delete_template(id).await?;
            "template"
        }
        DeleteKind::User => {
            svc.delete_user(id).await?;
            "user"
        }
    };

    output(
        &Deleted {
            kind: label,
            id,
            deleted: true,
        },
        flags.format,
    )
}
