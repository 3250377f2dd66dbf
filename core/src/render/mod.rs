#![deny(missing_docs)]

//! # Artifact Rendering
//!
//! Produces the three per-entity source files from an `EntityDescriptor`:
//!
//! - **model**: request/response types with serde and OpenAPI derives.
//! - **service**: data-access operations against a caller-owned database handle.
//! - **route**: HTTP handlers and the entity's route configuration.
//!
//! plus the shared `support` module every generated service depends on.
//!
//! Rendering is pure: the same descriptor always yields byte-identical text.
//! Every artifact is re-parsed before it is handed back so syntax errors in
//! generated code surface as render errors instead of broken files.

pub mod model;
pub mod route;
pub mod service;
pub mod support;

use crate::error::{AppError, AppResult};
use crate::schema::EntityDescriptor;
use crate::strategies::BackendStrategy;
use crate::type_mapping::JsonToRustMapper;
use ra_ap_edition::Edition;
use ra_ap_syntax::SourceFile;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

/// Bookkeeping timestamps added to stored records unless the schema declares them.
pub(crate) const TIMESTAMP_FIELDS: [&str; 2] = ["created_at", "updated_at"];

/// Header line stamped on every generated file.
pub const GENERATED_HEADER: &str = "// @generated by crudgen. Custom endpoints are injected from fragment templates.";

/// The kinds of per-entity artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// `models/<entity>.rs`
    Model,
    /// `services/<entity>_service.rs`
    Service,
    /// `routes/<entity>_routes.rs`
    Route,
}

impl ArtifactKind {
    /// All kinds in render order.
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Model, ArtifactKind::Service, ArtifactKind::Route];

    /// File name of this artifact for `entity_name`.
    pub fn file_name(&self, entity_name: &str) -> String {
        match self {
            ArtifactKind::Model => format!("{}.rs", entity_name),
            ArtifactKind::Service => format!("{}_service.rs", entity_name),
            ArtifactKind::Route => format!("{}_routes.rs", entity_name),
        }
    }
}

impl Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Model => write!(f, "model"),
            ArtifactKind::Service => write!(f, "service"),
            ArtifactKind::Route => write!(f, "route"),
        }
    }
}

/// One rendered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    /// Which artifact this is.
    pub kind: ArtifactKind,
    /// Owning entity.
    pub entity_name: String,
    /// Full file content.
    pub content: String,
}

/// Renders model, service and route artifacts for one entity.
pub fn render_artifacts(
    entity: &EntityDescriptor,
    strategy: &impl BackendStrategy,
) -> AppResult<Vec<GeneratedArtifact>> {
    let mapper = JsonToRustMapper;
    ArtifactKind::ALL
        .iter()
        .map(|kind| {
            let content = match kind {
                ArtifactKind::Model => model::render_model(entity, &mapper),
                ArtifactKind::Service => service::render_service(entity),
                ArtifactKind::Route => route::render_routes(entity, &mapper, strategy),
            };
            verify_syntax(&kind.file_name(&entity.entity_name), &content)?;
            Ok(GeneratedArtifact {
                kind: *kind,
                entity_name: entity.entity_name.clone(),
                content,
            })
        })
        .collect()
}

/// Fails with a render error when `content` does not parse as a Rust source file.
pub fn verify_syntax(label: &str, content: &str) -> AppResult<()> {
    let parse = SourceFile::parse(content, Edition::Edition2021);
    if !parse.errors().is_empty() {
        let errs: Vec<String> = parse.errors().into_iter().map(|e| e.to_string()).collect();
        return Err(AppError::Render(format!(
            "generated {} does not parse: {}",
            label,
            errs.join(", ")
        )));
    }
    Ok(())
}

/// Collects `use` items and renders them grouped per module path.
///
/// Items are deduplicated, so two mapped types needing `serde_json::Value`
/// produce a single import.
#[derive(Debug, Default)]
pub(crate) struct Imports {
    modules: BTreeMap<String, BTreeSet<String>>,
}

impl Imports {
    /// Adds an item path like `chrono::Utc`.
    pub(crate) fn add(&mut self, path: &str) {
        let (module, item) = match path.rsplit_once("::") {
            Some((m, i)) => (m.to_string(), i.to_string()),
            None => (String::new(), path.to_string()),
        };
        self.modules.entry(module).or_default().insert(item);
    }

    /// Adds every path in `paths`.
    pub(crate) fn extend<'a>(&mut self, paths: impl IntoIterator<Item = &'a str>) {
        for path in paths {
            self.add(path);
        }
    }

    /// One `use` line per module, sorted, followed by a blank line.
    pub(crate) fn render(&self) -> String {
        let mut code = String::new();
        for (module, items) in &self.modules {
            let mut items: Vec<&str> = items.iter().map(String::as_str).collect();
            // rustfmt order: `self`, then functions and modules, then types
            items.sort_by_key(|i| (*i != "self", i.starts_with(char::is_uppercase), *i));
            let target = match items.as_slice() {
                [single] => single.to_string(),
                many => format!("{{{}}}", many.join(", ")),
            };
            if module.is_empty() {
                code.push_str(&format!("use {};\n", target));
            } else {
                code.push_str(&format!("use {}::{};\n", module, target));
            }
        }
        code.push('\n');
        code
    }
}

/// Renders `text` as `///` lines at the given indentation.
pub(crate) fn doc_comment(text: &str, indent: &str) -> String {
    let mut code = String::new();
    for line in text.trim().lines() {
        let line = line.trim_end();
        if line.is_empty() {
            code.push_str(&format!("{}///\n", indent));
        } else {
            code.push_str(&format!("{}/// {}\n", indent, line));
        }
    }
    code
}

/// Module-level header shared by all artifacts.
pub(crate) fn file_header(summary: &str) -> String {
    format!("{}\n\n//! {}\n\n", GENERATED_HEADER, summary)
}

/// Quotes `s` as a Rust string literal.
pub(crate) fn string_literal(s: &str) -> String {
    format!("{:?}", s)
}
