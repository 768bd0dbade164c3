use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::ReviewStatus;

/// A report section of a project.
///
/// Sections carry assignment and review state. Their data is the slice of the
/// project's report data belonging to the section's fields, see
/// [`crate::entities::Project::section_data`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportSection {
    pub id: String,
    pub project_id: String,
    /// Stable id from the project type's section definitions (e.g. `"scope"`).
    pub section_id: String,
    pub assignee_id: Option<String>,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
