//! # Fragment Templates
//!
//! Locates and renders the user-written templates behind custom endpoints.
//!
//! For an endpoint `recalculate` on entity `team` the store looks, in order, at
//! `<root>/team/recalculate.<suffix>` and `<root>/recalculate.<suffix>`, where
//! the suffix is `rs.jinja` for service methods and `route.jinja` for route
//! handlers. Templates are rendered with minijinja against a
//! [`FragmentContext`].

use crate::error::AppResult;
use crate::naming;
use crate::schema::{CustomEndpoint, EntityDescriptor, EntitySummary};
use minijinja::Environment;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Which half of an endpoint a fragment implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// A method injected into the service impl block.
    ServiceMethod,
    /// A handler appended to the route file.
    RouteHandler,
}

impl FragmentKind {
    /// File suffix of this kind of fragment.
    pub fn suffix(&self) -> &'static str {
        match self {
            FragmentKind::ServiceMethod => "rs.jinja",
            FragmentKind::RouteHandler => "route.jinja",
        }
    }
}

/// Values available to fragment templates.
#[derive(Debug, Clone, Serialize)]
pub struct FragmentContext<'a> {
    /// Entity summary (`entity.pascal_name`, `entity.is_edge`, ...).
    pub entity: EntitySummary,
    /// Storage collection name.
    pub collection: String,
    /// Generated service type, e.g. `TeamService`.
    pub service: String,
    /// Stored model type, e.g. `Team`.
    pub model: String,
    /// Model module path, e.g. `crate::models::team`.
    pub model_path: String,
    /// The endpoint being injected.
    pub endpoint: &'a CustomEndpoint,
    /// Route handler name, e.g. `team_recalculate`.
    pub handler_name: String,
}

impl<'a> FragmentContext<'a> {
    /// Builds the context for one endpoint of `entity`.
    pub fn new(entity: &EntityDescriptor, endpoint: &'a CustomEndpoint) -> Self {
        Self {
            entity: entity.summary(),
            collection: entity.collection_name(),
            service: crate::render::service::service_type(entity),
            model: entity.pascal_name(),
            model_path: format!(
                "crate::models::{}",
                naming::rust_ident(&naming::model_module(&entity.entity_name))
            ),
            endpoint,
            handler_name: endpoint.handler_name(&entity.entity_name),
        }
    }
}

/// Fragment lookup and rendering rooted at one directory.
pub struct FragmentStore {
    root: PathBuf,
    env: Environment<'static>,
}

impl FragmentStore {
    /// Creates a store reading templates below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_filter("pascal", |s: String| naming::to_pascal_case(&s));
        env.add_filter("camel", |s: String| naming::to_camel_case(&s));
        Self {
            root: root.into(),
            env,
        }
    }

    /// Directory templates are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Finds the fragment for an endpoint, preferring the entity-specific one.
    pub fn locate(&self, entity_name: &str, endpoint_name: &str, kind: FragmentKind) -> Option<PathBuf> {
        let file_name = format!("{}.{}", endpoint_name, kind.suffix());
        [
            self.root.join(entity_name).join(&file_name),
            self.root.join(&file_name),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }

    /// Renders the template at `path`.
    pub fn render(&self, path: &Path, context: &FragmentContext<'_>) -> AppResult<String> {
        let source = fs::read_to_string(path)?;
        let name = path.display().to_string();
        let template = self.env.template_from_named_str(&name, &source)?;
        Ok(template.render(context)?)
    }
}
