#![deny(missing_docs)]

//! # Entity Schemas
//!
//! Loading and normalization of entity schema documents.
//!
//! - **raw**: serde mirror of the on-disk document, extension keys included.
//! - **descriptor**: the validated `EntityDescriptor` every renderer consumes.
//! - **loader**: reading, legacy normalization and exhaustive validation.

/// On-disk schema shapes.
pub mod raw;

/// Validated entity model.
pub mod descriptor;

/// Reading and normalization.
pub mod loader;

pub use descriptor::{
    CustomEndpoint, DeletionConstraint, EntityDescriptor, EntityKind, EntitySummary, HttpMethod,
    MatchStrategy, PropertySpec, SearchField,
};
pub use loader::{entity_name_from_path, is_schema_file, load_schema, normalize, read_raw};
