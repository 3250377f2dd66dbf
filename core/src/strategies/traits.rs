#![deny(missing_docs)]

//! # Backend Strategy Trait
//!
//! Defines the interface required to generate route code for a specific web
//! framework. The route renderer and the custom endpoint injector only talk to
//! this trait; framework syntax lives in the implementations.

use crate::schema::HttpMethod;

/// One route bound inside an entity scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBinding {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Path relative to the entity prefix (`""` for the prefix itself).
    pub path: String,
    /// Handler function name.
    pub handler: String,
}

impl RouteBinding {
    /// Creates a binding.
    pub fn new(method: HttpMethod, path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            handler: handler.into(),
        }
    }
}

/// Success statuses emitted by generated handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// 200
    Ok,
    /// 201
    Created,
}

/// A strategy trait for decoupling framework-specific code generation.
///
/// Implementors define how to generate imports, handler signatures, extractors
/// and route registrations for a specific backend.
pub trait BackendStrategy {
    // --- Scaffolding ---

    /// Item paths every generated route file imports (e.g. `actix_web::web`).
    fn route_imports(&self) -> Vec<&'static str>;

    /// Generates a handler function signature, up to and including the opening brace.
    ///
    /// # Arguments
    ///
    /// * `func_name` - The name of the function.
    /// * `args` - Argument declarations (e.g. `key: web::Path<String>`).
    fn handler_signature(&self, func_name: &str, args: &[String]) -> String;

    /// Expression that borrows the database handle inside a handler.
    fn database_handle(&self) -> &'static str;

    /// Wraps `expr` into the handler's success value.
    fn respond(&self, status: ResponseStatus, expr: &str) -> String;

    // --- Extractors ---

    /// Argument declaration for the shared database handle.
    fn database_extractor(&self) -> String;

    /// Type string for path parameter extraction.
    fn path_extractor(&self, inner_types: &[&str]) -> String;

    /// Type string for typed query extraction.
    fn query_extractor(&self, inner_type: &str) -> String;

    /// Type string for JSON body extraction.
    fn body_extractor(&self, body_type: &str) -> String;

    // --- Routing ---

    /// Generates the public configuration function registering `bindings` under `prefix`.
    ///
    /// The custom route hook named `custom_fn` must be registered before any
    /// binding so that parameterised paths cannot shadow custom routes.
    fn scope_config(&self, prefix: &str, custom_fn: &str, bindings: &[RouteBinding]) -> String;

    /// Generates the (initially empty) function custom routes are injected into.
    fn custom_routes_scaffold(&self, custom_fn: &str) -> String;

    /// Generates one registration statement placed inside the custom route hook.
    fn route_registration_statement(&self, binding: &RouteBinding) -> String;
}
