use anyhow::Context;
use rv_archive::Archiver;
use rv_config::VaultConfig;
use rv_db::VaultService;

use crate::cli::GlobalFlags;

/// Loaded configuration and the opened vault.
pub struct AppContext {
    pub config: VaultConfig,
    pub service: VaultService,
}

impl AppContext {
    pub async fn init(flags: &GlobalFlags) -> anyhow::Result<Self> {
        let mut config = VaultConfig::load_with_dotenv().context("failed to load configuration")?;
        if let Some(path) = &flags.database {
            config.database.path.clone_from(path);
        }
        tracing::debug!(
            database = %config.database.path,
            storage = %config.storage.backend,
            "opening vault"
        );

        let service = VaultService::from_config(&config)
            .await
            .with_context(|| format!("failed to open vault at {}", config.database.path))?;
        Ok(Self { config, service })
    }

    #[must_use]
    pub fn archiver(&self) -> Archiver<'_> {
        Archiver::new(&self.service).with_config(self.config.archive.clone())
    }
}
