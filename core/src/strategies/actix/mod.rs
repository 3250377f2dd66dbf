#![deny(missing_docs)]

//! # Actix Strategy Module
//!
//! Implementation of `BackendStrategy` for the Actix Web framework.
//! Relies on submodules for extractors, registration and scaffolding.

pub mod extractors;
pub mod registration;
pub mod scaffolding;

use crate::strategies::traits::{ResponseStatus, RouteBinding};
use crate::strategies::BackendStrategy;

/// Strategy for generating Actix Web compatible code.
pub struct ActixStrategy;

impl BackendStrategy for ActixStrategy {
    // --- Scaffolding ---

    fn route_imports(&self) -> Vec<&'static str> {
        scaffolding::route_imports()
    }

    fn handler_signature(&self, func_name: &str, args: &[String]) -> String {
        scaffolding::handler_signature(func_name, args)
    }

    fn database_handle(&self) -> &'static str {
        "db.get_ref()"
    }

    fn respond(&self, status: ResponseStatus, expr: &str) -> String {
        scaffolding::respond(status, expr)
    }

    // --- Extractors ---

    fn database_extractor(&self) -> String {
        extractors::database_extractor()
    }

    fn path_extractor(&self, inner_types: &[&str]) -> String {
        extractors::path_extractor(inner_types)
    }

    fn query_extractor(&self, inner_type: &str) -> String {
        extractors::query_extractor(inner_type)
    }

    fn body_extractor(&self, body_type: &str) -> String {
        extractors::body_extractor(body_type)
    }

    // --- Routing ---

    fn scope_config(&self, prefix: &str, custom_fn: &str, bindings: &[RouteBinding]) -> String {
        registration::scope_config(prefix, custom_fn, bindings)
    }

    fn custom_routes_scaffold(&self, custom_fn: &str) -> String {
        registration::custom_routes_scaffold(custom_fn)
    }

    fn route_registration_statement(&self, binding: &RouteBinding) -> String {
        registration::route_registration_statement(binding)
    }
}
