//! # rv-config
//!
//! Layered configuration loading for reportvault using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`REPORTVAULT_*` prefix, `__` as separator)
//! 2. Project-level `.reportvault/config.toml`
//! 3. User-level `~/.config/reportvault/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! `REPORTVAULT_DATABASE__PATH` -> `database.path`,
//! `REPORTVAULT_ARCHIVE__CHUNK_SIZE` -> `archive.chunk_size`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use rv_config::VaultConfig;
//!
//! let config = VaultConfig::load_with_dotenv().expect("config");
//! println!("database at {}", config.database.path);
//! ```

mod archive;
mod database;
mod error;
mod locks;
mod storage;

pub use archive::ArchiveConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use locks::LocksConfig;
pub use storage::{StorageBackend, StorageConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VaultConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub locks: LocksConfig,
}

impl VaultConfig {
    /// Load configuration from all sources (TOML files + environment variables)
    /// and validate it.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env` from the current directory (if any), then [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests and the CLI can layer extra providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".reportvault/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("REPORTVAULT_").split("__"))
    }

    /// Reject values the codec or lock layer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.archive.compression_level > 9 {
            return Err(ConfigError::InvalidValue {
                field: "archive.compression_level".into(),
                reason: format!("{} is outside 0..=9", self.archive.compression_level),
            });
        }
        if self.archive.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "archive.chunk_size".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.archive.max_entry_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "archive.max_entry_bytes".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.database.path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("reportvault").join("config.toml"))
    }
}
