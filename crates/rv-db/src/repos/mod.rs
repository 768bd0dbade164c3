//! Repository modules implementing persistence for all reportvault entities.
//!
//! Each module adds methods to `VaultService` via `impl VaultService` blocks.
//! None of them opens a transaction; multi-step operations (import, copy,
//! delete) wrap them in one.

pub mod file;
pub mod finding;
pub mod lock;
pub mod member;
pub mod project;
pub mod project_type;
pub mod section;
pub mod template;
pub mod user;
