use crate::cli::{Commands, GlobalFlags};
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Export { kind, ids, output } => {
            commands::export::handle(kind, &ids, &output, ctx, flags).await
        }
        Commands::Import { kind, file } => commands::import::handle(kind, &file, ctx, flags).await,
        Commands::Copy { kind, id } => commands::copy::handle(kind, &id, ctx, flags).await,
        Commands::Delete { kind, id } => commands::delete::handle(kind, &id, ctx, flags).await,
    }
}
