#![deny(missing_docs)]

//! # Route Registration
//!
//! Logic for generating the scope configuration function, the custom route
//! hook and the `cfg.route(...)` statements injected into it.

use crate::strategies::actix::scaffolding::HANDLER_GENERICS;
use crate::strategies::traits::RouteBinding;

fn route_builder(binding: &RouteBinding) -> String {
    format!(
        "web::{}().to({}::<D>)",
        binding.method.as_str(),
        binding.handler
    )
}

/// Generates `pub fn config`, which mounts every binding under `prefix`.
pub fn scope_config(prefix: &str, custom_fn: &str, bindings: &[RouteBinding]) -> String {
    let mut code = String::new();
    code.push_str(&format!(
        "/// Registers the routes mounted under `{}`.\n",
        prefix
    ));
    code.push_str(&format!(
        "pub fn config{}(cfg: &mut web::ServiceConfig) {{\n",
        HANDLER_GENERICS
    ));
    code.push_str("    cfg.service(\n");
    code.push_str(&format!("        web::scope(\"{}\")\n", prefix));
    code.push_str(&format!("            .configure({}::<D>)", custom_fn));
    for binding in bindings {
        code.push_str(&format!(
            "\n            .route(\"{}\", {})",
            binding.path,
            route_builder(binding)
        ));
    }
    code.push_str(",\n    );\n}\n");
    code
}

/// Generates the empty hook custom route registrations are injected into.
pub fn custom_routes_scaffold(custom_fn: &str) -> String {
    format!(
        "/// Custom endpoint routes, registered ahead of the parameterised routes.\n\
         #[allow(unused_variables)]\n\
         fn {}{}(cfg: &mut web::ServiceConfig) {{\n}}\n",
        custom_fn, HANDLER_GENERICS
    )
}

/// Generates one registration statement for the custom route hook.
pub fn route_registration_statement(binding: &RouteBinding) -> String {
    format!(
        "\n    cfg.route(\"{}\", {});",
        binding.path,
        route_builder(binding)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::HttpMethod;

    #[test]
    fn test_registration_statement() {
        let binding = RouteBinding::new(HttpMethod::Post, "/recalculate", "team_recalculate");
        assert_eq!(
            route_registration_statement(&binding),
            "\n    cfg.route(\"/recalculate\", web::post().to(team_recalculate::<D>));"
        );
    }

    #[test]
    fn test_scope_config_registers_hook_first() {
        let bindings = vec![
            RouteBinding::new(HttpMethod::Get, "", "team_list"),
            RouteBinding::new(HttpMethod::Get, "/{key}", "team_get"),
        ];
        let code = scope_config("/team", "custom_routes", &bindings);
        let hook = code.find(".configure(custom_routes::<D>)").unwrap();
        let list = code.find(".route(\"\", web::get().to(team_list::<D>))").unwrap();
        let get = code.find(".route(\"/{key}\", web::get().to(team_get::<D>))").unwrap();
        assert!(hook < list && list < get);
        assert!(code.contains("web::scope(\"/team\")"));
    }

    #[test]
    fn test_custom_routes_scaffold_is_empty() {
        let code = custom_routes_scaffold("custom_routes");
        assert!(code.ends_with("(cfg: &mut web::ServiceConfig) {\n}\n"));
    }
}
