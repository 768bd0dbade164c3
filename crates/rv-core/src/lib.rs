//! # rv-core
//!
//! Core types, custom-field schema handling, and error types for reportvault.
//!
//! This crate provides the foundational types shared across all reportvault crates:
//! - Entity structs for projects, project types, finding templates and their dependents
//! - Provenance, review-status, and linked-object enums
//! - The custom-field definition tree and `ensure_defined_structure`
//! - Predefined report/finding field sets
//! - ID prefix constants
//! - An injectable clock for time-sensitive code paths
//! - Cross-cutting error types

pub mod clock;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod fields;
pub mod ids;
