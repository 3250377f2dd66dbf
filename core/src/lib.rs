#![deny(missing_docs)]

//! # crudgen Core
//!
//! Schema-driven CRUD generator for graph-database backends.
//!
//! One JSON/YAML schema per entity becomes a model, a service and a set of
//! Actix Web routes. Shared documents (collection config, route/model/service
//! registries, router config) are patched additively so runs are idempotent.

/// Shared error types.
pub mod error;

/// Entity and field naming rules.
pub mod naming;

/// Schema type -> Rust type mapping.
pub mod type_mapping;

/// Schema loading and validation.
pub mod schema;

/// Output tree layout.
pub mod config;

/// `collections.json` maintenance.
pub mod collections;

/// Artifact rendering.
pub mod render;

/// Custom endpoint injection.
pub mod inject;

/// Registry patching.
pub mod registry;

/// Per-entity and batch orchestration.
pub mod pipeline;

/// Strategy Pattern Interfaces.
pub mod strategies;

mod fs_util;

pub use collections::{sync_collection_config, CollectionConfig, GraphEdge, SyncOutcome};
pub use config::GeneratorConfig;
pub use error::{AppError, AppResult};
pub use inject::fragments::{FragmentContext, FragmentKind, FragmentStore};
pub use inject::{inject_custom_endpoints, EndpointReport, InjectionOutcome};
pub use pipeline::{
    discover_schemas, BatchReport, EntityFailure, EntityReport, Generator, Stage, StageError,
};
pub use registry::{patch_registries, RegistryReport};
pub use render::{render_artifacts, ArtifactKind, GeneratedArtifact};
pub use schema::{load_schema, EntityDescriptor, EntityKind};
pub use strategies::{ActixStrategy, BackendStrategy};
pub use type_mapping::{JsonToRustMapper, JsonType, TypeMapper};
