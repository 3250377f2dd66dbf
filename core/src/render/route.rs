//! # Route Rendering
//!
//! Emits `routes/<entity>_routes.rs`: a list query type, the scope
//! configuration, the empty custom route hook and one handler per standard
//! operation. Framework syntax comes from the `BackendStrategy`.

use crate::naming;
use crate::render::{doc_comment, file_header, service::service_type, string_literal, Imports};
use crate::schema::{EntityDescriptor, HttpMethod, MatchStrategy};
use crate::strategies::{BackendStrategy, ResponseStatus, RouteBinding};
use crate::type_mapping::TypeMapper;

/// Name of the hook function custom routes are registered in.
pub const CUSTOM_ROUTES_FN: &str = "custom_routes";

/// URL prefix of an entity's routes.
pub fn route_prefix(entity: &EntityDescriptor) -> String {
    format!("/{}", entity.collection_name())
}

/// The standard route table, in registration order.
///
/// Fixed segments (`/from/...`, `/to/...`) precede `/{key}` so they are never
/// captured as a key.
pub fn standard_bindings(entity: &EntityDescriptor) -> Vec<RouteBinding> {
    let e = &entity.entity_name;
    let mut bindings = vec![
        RouteBinding::new(HttpMethod::Post, "", format!("{}_create", e)),
        RouteBinding::new(HttpMethod::Get, "", format!("{}_list", e)),
    ];
    if entity.is_edge() {
        bindings.push(RouteBinding::new(
            HttpMethod::Get,
            "/from/{from_key}",
            format!("{}_list_by_from", e),
        ));
        bindings.push(RouteBinding::new(
            HttpMethod::Get,
            "/to/{to_key}",
            format!("{}_list_by_to", e),
        ));
        bindings.push(RouteBinding::new(
            HttpMethod::Get,
            "/from/{from_key}/to/{to_key}",
            format!("{}_list_by_from_and_to", e),
        ));
    }
    bindings.push(RouteBinding::new(HttpMethod::Get, "/{key}", format!("{}_get", e)));
    bindings.push(RouteBinding::new(HttpMethod::Patch, "/{key}", format!("{}_update", e)));
    bindings.push(RouteBinding::new(HttpMethod::Delete, "/{key}", format!("{}_delete", e)));
    bindings
}

fn list_query_struct(entity: &EntityDescriptor, mapper: &impl TypeMapper) -> String {
    let mut code = String::new();
    code.push_str(&format!(
        "/// Query string accepted by the `{}` list routes.\n",
        entity.entity_name
    ));
    code.push_str("#[derive(Debug, Deserialize)]\n");
    code.push_str(&format!("pub struct {}ListQuery {{\n", entity.pascal_name()));
    code.push_str("    /// Page size.\n    pub limit: Option<u64>,\n");
    code.push_str("    /// Records to skip.\n    pub offset: Option<u64>,\n");
    for field in &entity.search_fields {
        let ty = entity
            .property(&field.name)
            .map(|p| mapper.map_query(&p.primitive_type).ty)
            .unwrap_or_else(|| "String".to_string());
        let docs = match field.strategy {
            MatchStrategy::Substring => format!("Case-insensitive substring filter on `{}`.", field.name),
            MatchStrategy::Exact => format!("Exact filter on `{}`.", field.name),
        };
        code.push_str(&doc_comment(&docs, "    "));
        code.push_str(&format!(
            "    pub {}: Option<{}>,\n",
            naming::rust_ident(&field.name),
            ty
        ));
    }
    code.push_str("}\n\n");
    code
}

struct HandlerWriter<'s, S: BackendStrategy> {
    strategy: &'s S,
    service: String,
    code: String,
}

impl<'s, S: BackendStrategy> HandlerWriter<'s, S> {
    fn handler(&mut self, docs: &str, name: &str, args: &[String], body: &[String], status: ResponseStatus, result: &str) {
        self.code.push_str(&doc_comment(docs, ""));
        self.code.push_str(&self.strategy.handler_signature(name, args));
        for line in body {
            self.code.push_str(&format!("    {}\n", line));
        }
        self.code.push_str(&format!("    {}\n", self.strategy.respond(status, result)));
        self.code.push_str("}\n\n");
    }

    fn service_call(&self, call: &str) -> String {
        format!(
            "{}::new({}).{}?",
            self.service,
            self.strategy.database_handle(),
            call
        )
    }
}

/// Renders the route artifact.
pub fn render_routes(
    entity: &EntityDescriptor,
    mapper: &impl TypeMapper,
    strategy: &impl BackendStrategy,
) -> String {
    let e = &entity.entity_name;
    let pascal = entity.pascal_name();
    let service = service_type(entity);
    let list_query = format!("{}ListQuery", pascal);
    let has_search = !entity.search_fields.is_empty();

    let mut imports = Imports::default();
    imports.extend(strategy.route_imports());
    imports.extend([
        "crate::services::support::Database",
        "crate::services::support::ServiceError",
        "serde::Deserialize",
    ]);
    let model_path = format!(
        "crate::models::{}",
        naming::rust_ident(&naming::model_module(e))
    );
    imports.add(&format!("{}::{}Create", model_path, pascal));
    imports.add(&format!("{}::{}Update", model_path, pascal));
    imports.add(&format!(
        "crate::services::{}::{}",
        naming::rust_ident(&naming::service_module(e)),
        service
    ));
    if has_search {
        imports.extend(["serde_json::json", "serde_json::Map"]);
    }

    let mut code = file_header(&format!("HTTP routes for the `{}` entity.", e));
    code.push_str(&imports.render());
    code.push_str(&list_query_struct(entity, mapper));
    code.push_str(&strategy.scope_config(
        &route_prefix(entity),
        CUSTOM_ROUTES_FN,
        &standard_bindings(entity),
    ));
    code.push('\n');
    code.push_str(&strategy.custom_routes_scaffold(CUSTOM_ROUTES_FN));
    code.push('\n');

    let db = strategy.database_extractor();
    let key_arg = format!("key: {}", strategy.path_extractor(&["String"]));
    let query_arg = format!("query: {}", strategy.query_extractor(&list_query));
    let mut w = HandlerWriter {
        strategy,
        service,
        code: String::new(),
    };

    w.handler(
        &format!("Creates a `{}` record.", e),
        &format!("{}_create", e),
        &[db.clone(), format!("payload: {}", strategy.body_extractor(&format!("{}Create", pascal)))],
        &[format!("let created = {};", w.service_call("create(payload.into_inner())"))],
        ResponseStatus::Created,
        "created",
    );

    let mut list_body = vec!["let query = query.into_inner();".to_string()];
    let list_docs;
    if has_search {
        list_docs = format!(
            "Lists `{}` records, filtered by any search parameters present.",
            e
        );
        list_body.push("let mut filters = Map::new();".to_string());
        for field in &entity.search_fields {
            list_body.push(format!(
                "if let Some(value) = query.{} {{",
                naming::rust_ident(&field.name)
            ));
            list_body.push(format!(
                "    filters.insert({}.to_string(), json!(value));",
                string_literal(&field.name)
            ));
            list_body.push("}".to_string());
        }
        list_body.push(format!(
            "let items = {};",
            w.service_call("search(filters, query.limit, query.offset)")
        ));
    } else {
        list_docs = format!("Lists `{}` records.", e);
        list_body.push(format!(
            "let items = {};",
            w.service_call("list(query.limit, query.offset)")
        ));
    }
    w.handler(
        &list_docs,
        &format!("{}_list", e),
        &[db.clone(), query_arg.clone()],
        &list_body,
        ResponseStatus::Ok,
        "items",
    );

    if let Some((from, to)) = entity.connected_entities() {
        w.handler(
            &format!("Lists `{}` edges leaving a `{}` record.", e, from),
            &format!("{}_list_by_from", e),
            &[
                db.clone(),
                format!("from_key: {}", strategy.path_extractor(&["String"])),
                query_arg.clone(),
            ],
            &[format!(
                "let items = {};",
                w.service_call("list_by_from(&from_key, query.limit, query.offset)")
            )],
            ResponseStatus::Ok,
            "items",
        );
        w.handler(
            &format!("Lists `{}` edges arriving at a `{}` record.", e, to),
            &format!("{}_list_by_to", e),
            &[
                db.clone(),
                format!("to_key: {}", strategy.path_extractor(&["String"])),
                query_arg.clone(),
            ],
            &[format!(
                "let items = {};",
                w.service_call("list_by_to(&to_key, query.limit, query.offset)")
            )],
            ResponseStatus::Ok,
            "items",
        );
        w.handler(
            &format!("Lists `{}` edges between a `{}` and a `{}` record.", e, from, to),
            &format!("{}_list_by_from_and_to", e),
            &[
                db.clone(),
                format!("path: {}", strategy.path_extractor(&["String", "String"])),
                query_arg.clone(),
            ],
            &[
                "let (from_key, to_key) = path.into_inner();".to_string(),
                format!(
                    "let items = {};",
                    w.service_call(
                        "list_by_from_and_to(&from_key, &to_key, query.limit, query.offset)"
                    )
                ),
            ],
            ResponseStatus::Ok,
            "items",
        );
    }

    w.handler(
        &format!("Fetches one `{}` record.", e),
        &format!("{}_get", e),
        &[db.clone(), key_arg.clone()],
        &[format!("let item = {};", w.service_call("get(&key)"))],
        ResponseStatus::Ok,
        "item",
    );
    w.handler(
        &format!("Applies a partial update to a `{}` record.", e),
        &format!("{}_update", e),
        &[
            db.clone(),
            key_arg.clone(),
            format!("payload: {}", strategy.body_extractor(&format!("{}Update", pascal))),
        ],
        &[format!(
            "let updated = {};",
            w.service_call("update(&key, payload.into_inner())")
        )],
        ResponseStatus::Ok,
        "updated",
    );
    w.handler(
        &format!("Deletes a `{}` record.", e),
        &format!("{}_delete", e),
        &[db, key_arg],
        &[format!("let deleted = {};", w.service_call("delete(&key)"))],
        ResponseStatus::Ok,
        "deleted",
    );

    code.push_str(w.code.trim_end());
    code.push('\n');
    code
}
