use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub mod global;

pub use global::{GlobalFlags, OutputFormat};

/// Top-level CLI parser for the `rvault` binary.
#[derive(Debug, Parser)]
#[command(name = "rvault", version, about = "reportvault - pentest report archives")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database path, overriding `database.path` from configuration
    #[arg(long, global = true)]
    pub database: Option<String>,
}

impl Cli {
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            database: self.database.clone(),
        }
    }
}

/// Kinds of exportable documents.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum DocumentKind {
    Templates,
    ProjectTypes,
    Projects,
}

/// Kinds of documents that can be deep-copied.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CopyKind {
    Project,
    ProjectType,
}

/// Kinds of objects that can be deleted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum DeleteKind {
    Project,
    ProjectType,
    Template,
    User,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Export documents into a .tar.gz archive.
    Export {
        kind: DocumentKind,
        /// Document id (repeatable)
        #[arg(long = "id", required = true)]
        ids: Vec<String>,
        /// Archive file to write
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Import every document of an archive.
    Import { kind: DocumentKind, file: PathBuf },
    /// Deep-copy a project or project type.
    Copy { kind: CopyKind, id: String },
    /// Delete an object and everything it owns.
    Delete { kind: DeleteKind, id: String },
}
