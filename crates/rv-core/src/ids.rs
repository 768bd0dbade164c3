//! ID prefix constants.
//!
//! IDs are generated by the database layer as `{prefix}-{16 hex chars}`.

pub const PREFIX_USER: &str = "usr";
pub const PREFIX_TEMPLATE: &str = "tpl";
pub const PREFIX_PROJECT_TYPE: &str = "ptp";
pub const PREFIX_PROJECT: &str = "prj";
pub const PREFIX_SECTION: &str = "sec";
pub const PREFIX_FINDING: &str = "fnd";
pub const PREFIX_FILE: &str = "fil";

/// All prefixes, used by tests that exercise ID generation.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_USER,
    PREFIX_TEMPLATE,
    PREFIX_PROJECT_TYPE,
    PREFIX_PROJECT,
    PREFIX_SECTION,
    PREFIX_FINDING,
    PREFIX_FILE,
];
