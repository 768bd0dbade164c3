//! Provenance, review status, and ownership enums for reportvault.
//!
//! All enums serialize in the form stored in SQL and written to archives.
//! `as_str()` returns exactly that form so repos can bind it directly.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// SourceEnum
// ---------------------------------------------------------------------------

/// Provenance of a top-level document.
///
/// ```text
/// created              natively created or copied in this installation
/// imported             created from an archive import
/// imported_dependency  embedded dependency re-created while importing its parent
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceEnum {
    #[default]
    Created,
    Imported,
    ImportedDependency,
}

impl SourceEnum {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Imported => "imported",
            Self::ImportedDependency => "imported_dependency",
        }
    }
}

impl fmt::Display for SourceEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReviewStatus
// ---------------------------------------------------------------------------

/// Review status of templates, findings, and report sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewStatus {
    #[default]
    InProgress,
    ReadyForReview,
    NeedsImprovement,
    Finished,
}

impl ReviewStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in-progress",
            Self::ReadyForReview => "ready-for-review",
            Self::NeedsImprovement => "needs-improvement",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LinkedObject
// ---------------------------------------------------------------------------

/// Kind of object an uploaded file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkedKind {
    /// Images uploaded to a project.
    Project,
    /// Assets uploaded to a project type.
    ProjectType,
}

impl LinkedKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::ProjectType => "project_type",
        }
    }
}

impl fmt::Display for LinkedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner of an uploaded file: either a project (images) or a project type (assets).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LinkedObject {
    Project(String),
    ProjectType(String),
}

impl LinkedObject {
    #[must_use]
    pub const fn kind(&self) -> LinkedKind {
        match self {
            Self::Project(_) => LinkedKind::Project,
            Self::ProjectType(_) => LinkedKind::ProjectType,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Project(id) | Self::ProjectType(id) => id,
        }
    }

    /// Rebuild from the `(linked_kind, linked_id)` column pair.
    #[must_use]
    pub fn from_parts(kind: LinkedKind, id: String) -> Self {
        match kind {
            LinkedKind::Project => Self::Project(id),
            LinkedKind::ProjectType => Self::ProjectType(id),
        }
    }
}

impl fmt::Display for LinkedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

// ---------------------------------------------------------------------------
// LockKind
// ---------------------------------------------------------------------------

/// Kinds of objects that can be locked for editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockKind {
    ProjectType,
    Finding,
    Section,
}

impl LockKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProjectType => "project_type",
            Self::Finding => "finding",
            Self::Section => "section",
        }
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lockable object, identified by kind and database id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockTarget {
    pub kind: LockKind,
    pub id: String,
}

impl LockTarget {
    #[must_use]
    pub fn project_type(id: &str) -> Self {
        Self {
            kind: LockKind::ProjectType,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn finding(id: &str) -> Self {
        Self {
            kind: LockKind::Finding,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn section(id: &str) -> Self {
        Self {
            kind: LockKind::Section,
            id: id.to_string(),
        }
    }
}
