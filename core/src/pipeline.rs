#![deny(missing_docs)]

//! # Generation Pipeline
//!
//! Runs one entity through
//! `LoadSchema -> Validate -> SyncCollectionConfig -> RenderArtifacts -> InjectCustom -> PatchRegistry`.
//! A failure stops that entity and is reported with the stage it happened in;
//! shared documents already written by earlier stages stay written.
//!
//! Batch mode walks a schema directory in file-name order and keeps going
//! past per-entity failures.

use crate::collections::{sync_collection_config, SyncOutcome};
use crate::config::GeneratorConfig;
use crate::error::{AppError, AppResult};
use crate::fs_util::write_if_changed;
use crate::inject::fragments::FragmentStore;
use crate::inject::{inject_custom_endpoints, EndpointReport};
use crate::registry::{patch_registries, RegistryReport};
use crate::render::support::render_support;
use crate::render::{render_artifacts, GeneratedArtifact};
use crate::schema::{entity_name_from_path, is_schema_file, normalize, read_raw};
use crate::strategies::{ActixStrategy, BackendStrategy};
use derive_more::Display;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, info_span};
use walkdir::WalkDir;

/// Pipeline stages, in execution order.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Read and parse the schema document.
    #[display("load schema")]
    LoadSchema,
    /// Normalize and validate into an `EntityDescriptor`.
    #[display("validate")]
    Validate,
    /// Add the collection to `collections.json`.
    #[display("sync collection config")]
    SyncCollectionConfig,
    /// Render and write the model, service and route files.
    #[display("render artifacts")]
    RenderArtifacts,
    /// Splice custom endpoint fragments into the rendered files.
    #[display("inject custom endpoints")]
    InjectCustom,
    /// Patch the registries and the router config.
    #[display("patch registry")]
    PatchRegistry,
    /// Finished.
    #[display("done")]
    Done,
}

/// An error tagged with the stage that produced it.
#[derive(Debug, Display)]
#[display("{stage} failed: {error}")]
pub struct StageError {
    /// Failing stage.
    pub stage: Stage,
    /// Underlying error.
    pub error: AppError,
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// What generating one entity produced.
#[derive(Debug, Clone)]
pub struct EntityReport {
    /// Entity name.
    pub entity_name: String,
    /// Artifact files written (or already up to date).
    pub artifacts: Vec<PathBuf>,
    /// Collection config changes.
    pub collections: SyncOutcome,
    /// Custom endpoint outcomes.
    pub endpoints: Vec<EndpointReport>,
    /// Registry outcomes.
    pub registry: RegistryReport,
    /// Always `Stage::Done` for a returned report.
    pub stage: Stage,
}

/// One entity that failed during a batch.
#[derive(Debug)]
pub struct EntityFailure {
    /// Schema file that failed.
    pub schema_path: PathBuf,
    /// Stage the failure happened in.
    pub stage: Stage,
    /// The error.
    pub error: AppError,
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Entities generated successfully, in processing order.
    pub succeeded: Vec<EntityReport>,
    /// Entities that failed, in processing order.
    pub failed: Vec<EntityFailure>,
}

impl BatchReport {
    /// Number of schemas processed.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Schema files directly inside `dir`, sorted by file name.
pub fn discover_schemas(dir: &Path) -> AppResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AppError::General(format!(
            "schema directory not found: {}",
            dir.display()
        )));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| AppError::General(format!("walking {}: {}", dir.display(), e)))?;
        if entry.file_type().is_file() && is_schema_file(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Drives generation for single schemas and schema directories.
pub struct Generator<S: BackendStrategy = ActixStrategy> {
    config: GeneratorConfig,
    strategy: S,
    fragments: FragmentStore,
}

impl Generator<ActixStrategy> {
    /// A generator emitting Actix Web routes.
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_strategy(config, ActixStrategy)
    }
}

impl<S: BackendStrategy> Generator<S> {
    /// A generator using a custom backend strategy.
    pub fn with_strategy(config: GeneratorConfig, strategy: S) -> Self {
        let fragments = FragmentStore::new(config.fragments_dir());
        Self {
            config,
            strategy,
            fragments,
        }
    }

    /// Paths this generator writes to.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates one entity from its schema file.
    pub fn generate(&self, schema_path: &Path) -> Result<EntityReport, StageError> {
        let span = info_span!("entity", schema = %schema_path.display());
        let _enter = span.enter();
        let at = |stage: Stage| move |error: AppError| StageError { stage, error };

        let entity_name = entity_name_from_path(schema_path).map_err(at(Stage::LoadSchema))?;
        let raw = read_raw(schema_path).map_err(at(Stage::LoadSchema))?;
        debug!(entity = %entity_name, "Loaded schema");

        let entity = normalize(&entity_name, raw, schema_path).map_err(at(Stage::Validate))?;

        let collections = sync_collection_config(&self.config.collections_path(), &entity)
            .map_err(at(Stage::SyncCollectionConfig))?;

        let mut artifacts =
            render_artifacts(&entity, &self.strategy).map_err(at(Stage::RenderArtifacts))?;

        let endpoints =
            inject_custom_endpoints(&entity, &self.fragments, &self.strategy, &mut artifacts)
                .map_err(at(Stage::InjectCustom))?;

        let written = self
            .write_artifacts(&artifacts)
            .map_err(at(Stage::RenderArtifacts))?;

        let registry =
            patch_registries(&self.config, &entity).map_err(at(Stage::PatchRegistry))?;

        info!(entity = %entity.entity_name, edge = entity.is_edge(), "Generated entity");
        Ok(EntityReport {
            entity_name: entity.entity_name,
            artifacts: written,
            collections,
            endpoints,
            registry,
            stage: Stage::Done,
        })
    }

    fn write_artifacts(&self, artifacts: &[GeneratedArtifact]) -> AppResult<Vec<PathBuf>> {
        let support = self.config.support_path();
        if write_if_changed(&support, &render_support())? {
            debug!("Wrote {}", support.display());
        }

        let mut paths = Vec::new();
        for artifact in artifacts {
            let path = self.config.artifact_path(artifact.kind, &artifact.entity_name);
            if write_if_changed(&path, &artifact.content)? {
                info!("Wrote {} {}", artifact.kind, path.display());
            } else {
                debug!("{} {} is up to date", artifact.kind, path.display());
            }
            paths.push(path);
        }
        Ok(paths)
    }

    /// Generates every schema in `dir`, continuing past failures.
    ///
    /// Errors only when the directory cannot be read; an empty directory
    /// yields an empty report.
    pub fn generate_batch(&self, dir: &Path) -> AppResult<BatchReport> {
        let schemas = discover_schemas(dir)?;
        info!("Found {} schema(s) in {}", schemas.len(), dir.display());

        let mut report = BatchReport::default();
        for path in schemas {
            match self.generate(&path) {
                Ok(entity) => report.succeeded.push(entity),
                Err(StageError { stage, error }) => {
                    error!(schema = %path.display(), %stage, "Generation failed: {}", error);
                    report.failed.push(EntityFailure {
                        schema_path: path,
                        stage,
                        error,
                    });
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_discover_schemas_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("team.schema.json"), "{}").unwrap();
        fs::write(dir.path().join("league.schema.yaml"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/player.schema.json"), "{}").unwrap();

        let found = discover_schemas(dir.path()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["league.schema.yaml", "team.schema.json"]);
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        assert!(discover_schemas(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_stage_error_display() {
        let err = StageError {
            stage: Stage::Validate,
            error: AppError::General("boom".into()),
        };
        assert!(err.to_string().starts_with("validate failed: "));
    }

    #[test]
    fn test_failure_reports_stage() {
        let dir = tempdir().unwrap();
        let schemas = dir.path().join("schemas");
        fs::create_dir(&schemas).unwrap();
        fs::write(schemas.join("broken.schema.json"), "{ nope").unwrap();
        fs::write(schemas.join("invalid.schema.json"), r#"{"title": "x"}"#).unwrap();

        let config = GeneratorConfig::new(dir.path().join("out"), dir.path().join("frags"));
        let generator = Generator::new(config);
        let report = generator.generate_batch(&schemas).unwrap();
        assert_eq!(report.total(), 2);
        let stages: Vec<Stage> = report.failed.iter().map(|f| f.stage).collect();
        assert_eq!(stages, vec![Stage::LoadSchema, Stage::Validate]);
    }
}
