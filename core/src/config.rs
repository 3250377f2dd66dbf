#![deny(missing_docs)]

//! # Generator Configuration
//!
//! Where generated artifacts, shared documents and custom fragments live.
//! The CLI fills this from flags and environment variables.

use crate::render::ArtifactKind;
use std::path::{Path, PathBuf};

/// Default output tree root.
pub const DEFAULT_OUTPUT_DIR: &str = "backend";
/// Default custom fragment directory.
pub const DEFAULT_FRAGMENTS_DIR: &str = "templates/custom";
/// Default schema directory for batch mode.
pub const DEFAULT_SCHEMAS_DIR: &str = "schemas";

/// Paths used by a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Root of the generated tree (`models/`, `services/`, `routes/`, `config/`).
    pub output_dir: PathBuf,
    /// Directory holding custom endpoint fragment templates.
    pub fragments_dir: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            fragments_dir: PathBuf::from(DEFAULT_FRAGMENTS_DIR),
        }
    }
}

impl GeneratorConfig {
    /// Creates a config rooted at `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>, fragments_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            fragments_dir: fragments_dir.into(),
        }
    }

    /// `models/`
    pub fn models_dir(&self) -> PathBuf {
        self.output_dir.join("models")
    }

    /// `services/`
    pub fn services_dir(&self) -> PathBuf {
        self.output_dir.join("services")
    }

    /// `routes/`
    pub fn routes_dir(&self) -> PathBuf {
        self.output_dir.join("routes")
    }

    /// `config/collections.json`
    pub fn collections_path(&self) -> PathBuf {
        self.output_dir.join("config").join("collections.json")
    }

    /// Router registry, `routes/mod.rs`.
    pub fn router_registry_path(&self) -> PathBuf {
        self.routes_dir().join("mod.rs")
    }

    /// Router config, `routes/entity_router.json`.
    pub fn router_config_path(&self) -> PathBuf {
        self.routes_dir().join("entity_router.json")
    }

    /// Schema-package index, `models/mod.rs`.
    pub fn model_index_path(&self) -> PathBuf {
        self.models_dir().join("mod.rs")
    }

    /// Service index, `services/mod.rs`.
    pub fn service_index_path(&self) -> PathBuf {
        self.services_dir().join("mod.rs")
    }

    /// Shared runtime support for services, `services/support.rs`.
    pub fn support_path(&self) -> PathBuf {
        self.services_dir().join("support.rs")
    }

    /// Path of one generated artifact.
    pub fn artifact_path(&self, kind: ArtifactKind, entity_name: &str) -> PathBuf {
        let dir = match kind {
            ArtifactKind::Model => self.models_dir(),
            ArtifactKind::Service => self.services_dir(),
            ArtifactKind::Route => self.routes_dir(),
        };
        dir.join(kind.file_name(entity_name))
    }

    /// Fragments directory.
    pub fn fragments_dir(&self) -> &Path {
        &self.fragments_dir
    }
}
