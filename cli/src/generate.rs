#![deny(missing_docs)]

//! # Generate Command
//!
//! Single-entity and batch generation on top of `crudgen_core::Generator`.
//!
//! Single mode propagates the first failure. Batch mode logs failures, keeps
//! going and prints a summary; it only fails when there was nothing to do.

use crate::error::{CliError, CliResult};
use crudgen_core::config::{DEFAULT_FRAGMENTS_DIR, DEFAULT_OUTPUT_DIR, DEFAULT_SCHEMAS_DIR};
use crudgen_core::{BatchReport, EntityReport, Generator, GeneratorConfig, InjectionOutcome};
use std::path::{Path, PathBuf};

/// Arguments shared by both modes.
#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Entity schema to generate (e.g. schemas/team.schema.json).
    #[clap(value_name = "SCHEMA", required_unless_present = "all")]
    pub schema: Option<PathBuf>,

    /// Generate every schema in DIR instead of a single file.
    #[clap(
        long,
        value_name = "DIR",
        num_args = 0..=1,
        default_missing_value = DEFAULT_SCHEMAS_DIR,
        conflicts_with = "schema"
    )]
    pub all: Option<PathBuf>,

    /// Root of the generated tree.
    #[clap(long, env = "CRUDGEN_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Directory holding custom endpoint fragments.
    #[clap(long, env = "CRUDGEN_FRAGMENTS_DIR", default_value = DEFAULT_FRAGMENTS_DIR)]
    pub fragments_dir: PathBuf,
}

impl GenerateArgs {
    fn config(&self) -> GeneratorConfig {
        GeneratorConfig::new(&self.output_dir, &self.fragments_dir)
    }
}

/// Runs whichever mode the arguments select.
pub fn execute(args: &GenerateArgs) -> CliResult<()> {
    let generator = Generator::new(args.config());

    match (&args.all, &args.schema) {
        (Some(dir), _) => {
            let report = generate_all(&generator, dir)?;
            print_batch_summary(&report);
            Ok(())
        }
        (None, Some(schema)) => {
            let report = generator.generate(schema)?;
            print_entity(&report);
            Ok(())
        }
        (None, None) => Err(CliError::NoSchemas(PathBuf::from(DEFAULT_SCHEMAS_DIR))),
    }
}

/// Batch generation; an empty directory is an error.
pub fn generate_all(generator: &Generator, dir: &Path) -> CliResult<BatchReport> {
    let report = generator.generate_batch(dir)?;
    if report.total() == 0 {
        return Err(CliError::NoSchemas(dir.to_path_buf()));
    }
    Ok(report)
}

fn print_entity(report: &EntityReport) {
    println!("Generated {}", report.entity_name);
    for path in &report.artifacts {
        println!("  {}", path.display());
    }
    for endpoint in &report.endpoints {
        if endpoint.service != InjectionOutcome::AlreadyPresent
            || endpoint.route != InjectionOutcome::AlreadyPresent
        {
            println!(
                "  custom {}: service {}, route {}",
                endpoint.name, endpoint.service, endpoint.route
            );
        }
    }
}

fn print_batch_summary(report: &BatchReport) {
    for entity in &report.succeeded {
        print_entity(entity);
    }
    for failure in &report.failed {
        println!(
            "Failed {} at {}: {}",
            failure.schema_path.display(),
            failure.stage,
            failure.error
        );
    }
    println!(
        "{} of {} schema(s) generated, {} failed.",
        report.succeeded.len(),
        report.total(),
        report.failed.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TEAM: &str = r#"{
  "title": "Team",
  "properties": { "name": { "type": "string" } },
  "required": ["name"]
}"#;

    fn args(root: &Path) -> GenerateArgs {
        GenerateArgs {
            schema: None,
            all: Some(root.join("schemas")),
            output_dir: root.join("backend"),
            fragments_dir: root.join("fragments"),
        }
    }

    #[test]
    fn test_batch_with_no_schemas_fails() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("schemas")).unwrap();

        let err = execute(&args(dir.path())).unwrap_err();
        assert!(matches!(err, CliError::NoSchemas(_)));
    }

    #[test]
    fn test_batch_continues_past_failures() {
        let dir = tempdir().unwrap();
        let schemas = dir.path().join("schemas");
        fs::create_dir(&schemas).unwrap();
        fs::write(schemas.join("broken.schema.json"), "{").unwrap();
        fs::write(schemas.join("team.schema.json"), TEAM).unwrap();

        execute(&args(dir.path())).unwrap();
        assert!(dir.path().join("backend/models/team.rs").exists());
    }

    #[test]
    fn test_single_schema_failure_propagates() {
        let dir = tempdir().unwrap();
        let schema = dir.path().join("broken.schema.json");
        fs::write(&schema, "{").unwrap();

        let mut args = args(dir.path());
        args.all = None;
        args.schema = Some(schema);
        assert!(matches!(execute(&args), Err(CliError::Stage(_))));
    }
}
