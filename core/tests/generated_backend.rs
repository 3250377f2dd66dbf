//! Builds a generated backend inside a host crate and runs its tests.
//!
//! The host crate under `tests/fixtures/host` declares the generated modules
//! and drives the `team` service against an in-memory `Database`. Run with
//! `cargo test -p crudgen-core -- --ignored`.

use crudgen_core::{Generator, GeneratorConfig};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;
use walkdir::WalkDir;

const TEAM: &str = r#"{
  "title": "Team",
  "properties": {
    "name": { "type": "string" },
    "league_id": { "type": "string" },
    "season": { "type": "integer" },
    "founded": { "type": "string", "format": "date" },
    "tags": { "type": "array", "items": { "type": "string" } }
  },
  "required": ["name", "league_id", "season"],
  "x-unique-combinations": [["season", "league_id"]],
  "x-search-fields": ["name", "league_id", "season", "tags"],
  "x-deletion-constraints": [{ "collection": "team_match", "field": "_from" }]
}"#;

const MATCH: &str = r#"{
  "title": "Match",
  "properties": {
    "kickoff": { "type": "string", "format": "date-time" },
    "venue": { "type": "string" }
  },
  "required": ["kickoff"]
}"#;

const TEAM_MATCH: &str = r#"{
  "title": "TeamMatch",
  "properties": {
    "_from": { "type": "string" },
    "_to": { "type": "string" },
    "home": { "type": "boolean" }
  },
  "x-connects": ["team", "match"]
}"#;

fn copy_tree(from: &Path, to: &Path) {
    for entry in WalkDir::new(from) {
        let entry = entry.unwrap();
        let target = to.join(entry.path().strip_prefix(from).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

#[test]
#[ignore = "compiles the generated backend and fetches its dependencies"]
fn generated_backend_builds_and_passes_its_runtime_tests() {
    let dir = tempdir().unwrap();
    let host = dir.path().join("host");
    copy_tree(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/host"), &host);

    let schemas = dir.path().join("schemas");
    let fragments = dir.path().join("templates/custom");
    fs::create_dir_all(&schemas).unwrap();
    fs::create_dir_all(&fragments).unwrap();
    for (entity, content) in [("team", TEAM), ("match", MATCH), ("team_match", TEAM_MATCH)] {
        fs::write(schemas.join(format!("{}.schema.json", entity)), content).unwrap();
    }

    let generator = Generator::new(GeneratorConfig::new(host.join("src"), fragments));
    let report = generator.generate_batch(&schemas).unwrap();
    assert!(report.failed.is_empty(), "{:?}", report.failed);
    assert_eq!(report.succeeded.len(), 3);

    let output = Command::new(env!("CARGO"))
        .args(["test", "--quiet"])
        .current_dir(&host)
        .env("CARGO_TARGET_DIR", dir.path().join("target"))
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}
