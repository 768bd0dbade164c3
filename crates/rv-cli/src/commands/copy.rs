use crate::cli::{CopyKind, GlobalFlags};
use crate::context::AppContext;
use crate::output::output;

pub async fn handle(
    kind: CopyKind,
    id: &str,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match kind {
        CopyKind::Project => {
            let copy = ctx.service.copy_project(id).await?;
            output(&copy, flags.format)
        }
        CopyKind::ProjectType => {
            let copy = ctx.service.copy_project_type(id).await?;
            output(&copy, flags.format)
        }
    }
}
