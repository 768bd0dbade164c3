//! Entity structs for all reportvault domain objects.
//!
//! Each entity maps to a table in the libSQL database. All structs derive
//! `Serialize` and `Deserialize` for JSON roundtrip.

mod file;
mod finding;
mod lock;
mod project;
mod project_type;
mod section;
mod template;
mod user;

pub use file::UploadedFile;
pub use finding::Finding;
pub use lock::LockInfo;
pub use project::{ImportedMember, Project, ProjectMember};
pub use project_type::ProjectType;
pub use section::ReportSection;
pub use template::FindingTemplate;
pub use user::User;
