//! # rv-archive
//!
//! Portable archives of finding templates, project types, and projects.
//!
//! An archive is a gzip-compressed tar file holding one JSON manifest per
//! exported document plus the binary files it owns (see [`manifest`]).
//! Export streams the archive in chunks; import decodes it, checks that its
//! kind matches the entry point, and rebuilds the documents inside one
//! database transaction.
//!
//! ```no_run
//! # async fn demo(svc: &rv_db::VaultService) -> Result<(), rv_archive::ArchiveError> {
//! use futures_util::TryStreamExt;
//!
//! let archiver = rv_archive::Archiver::new(svc);
//! let templates = svc.list_templates().await?;
//! let bytes: Vec<u8> = archiver.export_templates(&templates).await?.try_concat().await?;
//! let imported = archiver.import_templates(std::io::Cursor::new(bytes)).await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
mod export;
mod import;
pub mod manifest;

pub use codec::ArchiveStream;
pub use error::ArchiveError;
pub use manifest::ArchiveKind;

use rv_config::ArchiveConfig;
use rv_db::VaultService;

/// Export and import entry points over one [`VaultService`].
pub struct Archiver<'a> {
    svc: &'a VaultService,
    config: ArchiveConfig,
}

impl<'a> Archiver<'a> {
    #[must_use]
    pub fn new(svc: &'a VaultService) -> Self {
        Self {
            svc,
            config: ArchiveConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ArchiveConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ArchiveConfig {
        &self.config
    }
}
