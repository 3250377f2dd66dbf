#![deny(missing_docs)]

//! # Registry Patching
//!
//! Keeps the shared documents that wire generated entities into the host
//! application up to date:
//!
//! - `routes/mod.rs` declares every route module and mounts its `config`.
//! - `models/mod.rs` declares every model module and re-exports its types.
//! - `services/mod.rs` declares every service module and re-exports the service.
//! - `routes/entity_router.json` holds one summary per entity.
//!
//! Patching is additive and idempotent: running it twice for the same entity
//! leaves every document byte-identical.

pub mod document;
pub mod router_config;

pub use document::{InsertOutcome, RegistryDocument, RegistryLayout};

use crate::config::GeneratorConfig;
use crate::error::{AppError, AppResult};
use crate::fs_util::write_if_changed;
use crate::naming;
use crate::render::model::exported_types;
use crate::render::service::service_type;
use crate::schema::EntityDescriptor;
use document::{MODEL_INDEX, ROUTER_REGISTRY, SERVICE_INDEX};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Outcome of patching one registry document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPatch {
    /// Document name, e.g. `router registry`.
    pub document: &'static str,
    /// Module declaration outcome.
    pub import: InsertOutcome,
    /// Entry outcome.
    pub entry: InsertOutcome,
}

/// Outcome of patching every shared document for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryReport {
    /// One patch per registry document.
    pub patches: Vec<RegistryPatch>,
    /// Whether the router config file changed.
    pub router_config_changed: bool,
}

fn patch_document(
    path: &Path,
    layout: &'static RegistryLayout,
    import_line: &str,
    key: &str,
    entry_line: &str,
) -> AppResult<RegistryPatch> {
    let mut doc = if path.exists() {
        RegistryDocument::parse(layout, &fs::read_to_string(path)?)
    } else {
        debug!("Creating {} at {}", layout.name, path.display());
        RegistryDocument::new(layout)
    };

    let import = doc.ensure_import(import_line);
    let entry = doc.ensure_entry(key, entry_line);
    write_if_changed(path, &doc.render()).map_err(|e| AppError::registry_write(path, e))?;

    for (what, outcome) in [("module", import), ("entry", entry)] {
        match outcome {
            InsertOutcome::Inserted => info!("Added {} '{}' to {}", what, key, layout.name),
            InsertOutcome::AlreadyPresent => {
                info!("Skipped {} '{}': already present in {}", what, key, layout.name)
            }
        }
    }

    Ok(RegistryPatch {
        document: layout.name,
        import,
        entry,
    })
}

/// Patches the router registry, both indexes and the router config for `entity`.
pub fn patch_registries(config: &GeneratorConfig, entity: &EntityDescriptor) -> AppResult<RegistryReport> {
    let e = &entity.entity_name;
    let mut patches = Vec::new();

    let route_mod = naming::route_module(e);
    let route_ident = naming::rust_ident(&route_mod);
    patches.push(patch_document(
        &config.router_registry_path(),
        &ROUTER_REGISTRY,
        &format!("pub mod {};", route_ident),
        &route_mod,
        &format!("{}::config::<D>(cfg);", route_ident),
    )?);

    let model_mod = naming::model_module(e);
    let model_ident = naming::rust_ident(&model_mod);
    patches.push(patch_document(
        &config.model_index_path(),
        &MODEL_INDEX,
        &format!("pub mod {};", model_ident),
        &model_mod,
        &format!(
            "pub use {}::{{{}}};",
            model_ident,
            exported_types(entity).join(", ")
        ),
    )?);

    let service_mod = naming::service_module(e);
    let service_ident = naming::rust_ident(&service_mod);
    patches.push(patch_document(
        &config.service_index_path(),
        &SERVICE_INDEX,
        &format!("pub mod {};", service_ident),
        &service_mod,
        &format!("pub use {}::{};", service_ident, service_type(entity)),
    )?);

    let router_config_changed =
        router_config::merge_router_config(&config.router_config_path(), entity)?;

    Ok(RegistryReport {
        patches,
        router_config_changed,
    })
}
