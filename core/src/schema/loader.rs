//! # Schema Loader
//!
//! Reads an entity schema from disk and normalizes it into an [`EntityDescriptor`].
//!
//! Loading is split in two so the pipeline can tell a document that could not be
//! read (`read_raw`) from one that was read but is invalid (`normalize`).

use crate::error::{AppError, AppResult};
use crate::naming;
use crate::schema::descriptor::{
    CustomEndpoint, DeletionConstraint, EntityDescriptor, EntityKind, HttpMethod, MatchStrategy,
    PropertySpec, SearchField,
};
use crate::schema::raw::{RawEndpoint, RawSchema};
use crate::type_mapping::{Format, JsonType};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::debug;

/// File name suffixes recognised as entity schemas.
pub const SCHEMA_SUFFIXES: &[&str] = &[".schema.json", ".schema.yaml", ".schema.yml"];

/// Field names generated on the stored variant; schemas may not declare them.
const GENERATED_FIELDS: &[&str] = &["key", "id", "rev"];
const GENERATED_EDGE_FIELDS: &[&str] = &["from_id", "to_id"];
/// Query parameters every list route already takes.
const PAGINATION_PARAMS: &[&str] = &["limit", "offset"];

/// Reads and parses a schema document without validating it.
pub fn read_raw(path: &Path) -> AppResult<RawSchema> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::schema(path, format!("unreadable: {}", e)))?;

    let is_yaml = path
        .extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml");

    if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| AppError::schema(path, e.to_string()))
    } else {
        serde_json::from_str(&content).map_err(|e| AppError::schema(path, e.to_string()))
    }
}

/// Derives the entity name from a schema file name, e.g. `team_match.schema.json` -> `team_match`.
pub fn entity_name_from_path(path: &Path) -> AppResult<String> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::schema(path, "schema path has no file name"))?;

    SCHEMA_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::schema(
                path,
                format!("file name must end with one of {}", SCHEMA_SUFFIXES.join(", ")),
            )
        })
}

/// Whether a path looks like an entity schema.
pub fn is_schema_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| SCHEMA_SUFFIXES.iter().any(|s| n.ends_with(s)))
}

/// Reads and normalizes a schema in one go.
pub fn load_schema(path: &Path) -> AppResult<EntityDescriptor> {
    let raw = read_raw(path)?;
    let entity_name = entity_name_from_path(path)?;
    normalize(&entity_name, raw, path)
}

/// Validates a raw schema and converts it to the canonical descriptor.
///
/// `path` is only used for error messages.
pub fn normalize(entity_name: &str, raw: RawSchema, path: &Path) -> AppResult<EntityDescriptor> {
    let fail = |reason: String| AppError::schema(path, reason);

    if !naming::is_valid_identifier(entity_name) || naming::is_internal_field(entity_name) {
        return Err(fail(format!("'{}' is not a valid entity name", entity_name)));
    }
    if let Some(clash) = naming::entity_type_clash(entity_name) {
        return Err(fail(format!("entity '{}': {}", entity_name, clash)));
    }

    let raw_properties = raw
        .properties
        .ok_or_else(|| fail("missing required key 'properties'".into()))?;

    for name in &raw.required {
        if !raw_properties.contains_key(name) {
            return Err(fail(format!("required field '{}' is not a declared property", name)));
        }
    }

    // Properties
    let mut properties = IndexMap::new();
    for (name, prop) in raw_properties {
        if !naming::is_valid_identifier(&name) {
            return Err(fail(format!("property '{}' is not a valid identifier", name)));
        }
        let spec = PropertySpec {
            // an untyped property is a string
            primitive_type: match prop.type_.as_ref().and_then(|t| t.primary()) {
                Some(t) => JsonType::parse(Some(t)),
                None => JsonType::String,
            },
            format: prop.format.as_deref().map(Format::parse),
            description: prop.description.filter(|d| !d.trim().is_empty()),
            default: prop.default,
            required: raw.required.contains(&name),
        };
        properties.insert(name, spec);
    }

    // Edge detection
    let is_edge = properties.contains_key("_from") && properties.contains_key("_to");
    let kind = match (is_edge, raw.connects) {
        (true, Some(ends)) => {
            if ends.len() != 2 {
                return Err(fail(format!(
                    "x-connects must name exactly two entities, got {}",
                    ends.len()
                )));
            }
            for end in &ends {
                if !naming::is_valid_identifier(end) {
                    return Err(fail(format!("x-connects entry '{}' is not a valid entity name", end)));
                }
            }
            EntityKind::Edge {
                from: ends[0].clone(),
                to: ends[1].clone(),
            }
        }
        (true, None) => {
            return Err(fail(
                "edge schema (declares _from and _to) must declare x-connects: [from, to]".into(),
            ))
        }
        (false, Some(_)) => {
            return Err(fail("x-connects is only valid on edge schemas (_from and _to)".into()))
        }
        (false, None) => EntityKind::Document,
    };

    let mut reserved: Vec<&str> = GENERATED_FIELDS.to_vec();
    if is_edge {
        reserved.extend_from_slice(GENERATED_EDGE_FIELDS);
    }
    if let Some(clash) = properties.keys().find(|k| reserved.contains(&k.as_str())) {
        return Err(fail(format!("property '{}' collides with a generated field", clash)));
    }

    // Unique combinations
    let mut seen_sets: IndexSet<Vec<String>> = IndexSet::new();
    let mut unique_combinations = Vec::new();
    for set in raw.unique_combinations {
        if set.is_empty() {
            return Err(fail("x-unique-combinations contains an empty field set".into()));
        }
        for field in &set {
            if !properties.contains_key(field) {
                return Err(fail(format!(
                    "unique combination field '{}' is not a declared property",
                    field
                )));
            }
        }
        let mut canonical = set.clone();
        canonical.sort();
        canonical.dedup();
        if seen_sets.insert(canonical) {
            let mut ordered: Vec<String> = Vec::new();
            for f in set {
                if !ordered.contains(&f) {
                    ordered.push(f);
                }
            }
            unique_combinations.push(ordered);
        }
    }

    // Search fields
    let mut search_fields: Vec<SearchField> = Vec::new();
    for name in raw.search_fields {
        let prop = properties
            .get(&name)
            .ok_or_else(|| fail(format!("search field '{}' is not a declared property", name)))?;
        if search_fields.iter().any(|f| f.name == name) {
            continue;
        }
        if PAGINATION_PARAMS.contains(&name.as_str()) {
            return Err(fail(format!(
                "search field '{}' collides with a pagination parameter",
                name
            )));
        }
        let strategy = if prop.primitive_type == JsonType::String
            && !naming::is_identifier_reference(&name)
        {
            MatchStrategy::Substring
        } else {
            MatchStrategy::Exact
        };
        search_fields.push(SearchField { name, strategy });
    }

    // Defaults
    let mut defaults: IndexMap<String, serde_json::Value> = properties
        .iter()
        .filter_map(|(name, p)| p.default.clone().map(|d| (name.clone(), d)))
        .collect();
    for (name, value) in raw.default_values {
        if !properties.contains_key(&name) {
            return Err(fail(format!("default value for undeclared property '{}'", name)));
        }
        defaults.insert(name, value);
    }

    // Deletion constraints
    let mut deletion_constraints = Vec::new();
    for c in raw.deletion_constraints {
        if !naming::is_valid_identifier(&c.collection) || !naming::is_valid_identifier(&c.field) {
            return Err(fail(format!(
                "invalid deletion constraint {}.{}",
                c.collection, c.field
            )));
        }
        deletion_constraints.push(DeletionConstraint {
            collection: c.collection,
            field: c.field,
            message: c.message,
        });
    }

    let custom_endpoints = normalize_endpoints(
        raw.custom_endpoints,
        raw.custom_functions,
        raw.custom_routes,
    )
    .map_err(fail)?;

    let descriptor = EntityDescriptor {
        entity_name: entity_name.to_string(),
        title: raw
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| naming::to_pascal_case(entity_name)),
        description: raw.description.unwrap_or_default(),
        properties,
        kind,
        unique_combinations,
        search_fields,
        deletion_constraints,
        custom_endpoints,
        defaults,
    };

    debug!(
        entity = %descriptor.entity_name,
        edge = descriptor.is_edge(),
        properties = descriptor.properties.len(),
        custom_endpoints = descriptor.custom_endpoints.len(),
        "Normalized schema"
    );

    Ok(descriptor)
}

/// Merges current and legacy custom endpoint declarations into the canonical list.
///
/// Legacy `x-custom-functions` are only honoured when no current-form endpoints exist.
fn normalize_endpoints(
    current: Vec<RawEndpoint>,
    legacy_functions: Vec<String>,
    legacy_routes: Vec<String>,
) -> Result<Vec<CustomEndpoint>, String> {
    let mut endpoints = Vec::new();

    if current.is_empty() {
        for name in legacy_functions {
            let expose_route = legacy_routes.contains(&name);
            endpoints.push(CustomEndpoint {
                route_path: format!("/{}", name),
                name,
                http_method: HttpMethod::Get,
                expose_route,
                description: None,
            });
        }
    } else {
        for raw in current {
            let endpoint = match raw {
                RawEndpoint::Name(name) => CustomEndpoint {
                    route_path: format!("/{}", name),
                    name,
                    http_method: HttpMethod::Get,
                    expose_route: true,
                    description: None,
                },
                RawEndpoint::Spec(spec) => {
                    let http_method = match spec.http_method.as_deref() {
                        Some(m) => HttpMethod::parse(m).ok_or_else(|| {
                            format!("custom endpoint '{}' has unsupported method '{}'", spec.name, m)
                        })?,
                        None => HttpMethod::Get,
                    };
                    CustomEndpoint {
                        route_path: spec
                            .route_path
                            .unwrap_or_else(|| format!("/{}", spec.name)),
                        name: spec.name,
                        http_method,
                        expose_route: spec.expose_route.unwrap_or(true),
                        description: spec.description,
                    }
                }
            };
            endpoints.push(endpoint);
        }
    }

    let path_re = Regex::new(r"^(/(\{[A-Za-z_][A-Za-z0-9_]*\}|[A-Za-z0-9_.\-]+))+$")
        .expect("Invalid regex constant");
    let mut names = IndexSet::new();
    for ep in &endpoints {
        if !naming::is_valid_identifier(&ep.name) {
            return Err(format!("custom endpoint '{}' is not a valid identifier", ep.name));
        }
        if !names.insert(ep.name.as_str()) {
            return Err(format!("custom endpoint '{}' is declared twice", ep.name));
        }
        if ep.expose_route && !path_re.is_match(&ep.route_path) {
            return Err(format!(
                "custom endpoint '{}' has invalid route path '{}'",
                ep.name, ep.route_path
            ));
        }
    }

    Ok(endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(name: &str, json: &str) -> AppResult<EntityDescriptor> {
        let raw: RawSchema = serde_json::from_str(json).unwrap();
        normalize(name, raw, &PathBuf::from(format!("{}.schema.json", name)))
    }

    #[test]
    fn test_entity_name_from_path() {
        let name = entity_name_from_path(Path::new("schemas/team_match.schema.json")).unwrap();
        assert_eq!(name, "team_match");
        let name = entity_name_from_path(Path::new("player.schema.yaml")).unwrap();
        assert_eq!(name, "player");
        assert!(entity_name_from_path(Path::new("player.json")).is_err());
    }

    #[test]
    fn test_document_schema() {
        let d = parse(
            "team",
            r#"{
                "title": "Team",
                "properties": {
                    "name": {"type": "string", "description": "Display name"},
                    "league_id": {"type": "string"},
                    "founded": {"type": "integer", "default": 1900},
                    "active": {"type": "boolean"}
                },
                "required": ["name"],
                "x-search-fields": ["name", "league_id", "founded"],
                "x-default-values": {"active": true}
            }"#,
        )
        .unwrap();

        assert!(!d.is_edge());
        assert!(d.properties["name"].required);
        assert!(!d.properties["league_id"].required);
        assert_eq!(d.search_fields[0].strategy, MatchStrategy::Substring);
        assert_eq!(d.search_fields[1].strategy, MatchStrategy::Exact);
        assert_eq!(d.search_fields[2].strategy, MatchStrategy::Exact);
        assert_eq!(d.defaults["founded"], serde_json::json!(1900));
        assert_eq!(d.defaults["active"], serde_json::json!(true));
    }

    #[test]
    fn test_edge_requires_connects() {
        let err = parse(
            "team_match",
            r#"{"properties": {"_from": {"type": "string"}, "_to": {"type": "string"}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("x-connects"));

        let d = parse(
            "team_match",
            r#"{
                "properties": {"_from": {"type": "string"}, "_to": {"type": "string"}},
                "x-connects": ["team", "match"]
            }"#,
        )
        .unwrap();
        assert_eq!(d.connected_entities(), Some(("team", "match")));
    }

    #[test]
    fn test_connects_on_document_is_rejected() {
        let err = parse(
            "team",
            r#"{"properties": {"name": {"type": "string"}}, "x-connects": ["a", "b"]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::SchemaParse { .. }));
    }

    #[test]
    fn test_missing_properties() {
        let err = parse("team", r#"{"title": "Team"}"#).unwrap_err();
        assert!(err.to_string().contains("properties"));
    }

    #[test]
    fn test_unique_fields_must_be_declared() {
        let err = parse(
            "standing",
            r#"{"properties": {"league_id": {"type": "string"}},
                "x-unique-combinations": [["league_id", "season"]]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("season"));
    }

    #[test]
    fn test_unique_sets_are_deduplicated() {
        let d = parse(
            "standing",
            r#"{"properties": {"league_id": {"type": "string"}, "season": {"type": "integer"}},
                "x-unique-combinations": [["league_id", "season"], ["season", "league_id"]]}"#,
        )
        .unwrap();
        assert_eq!(d.unique_combinations, vec![vec!["league_id", "season"]]);
    }

    #[test]
    fn test_legacy_custom_functions() {
        let d = parse(
            "team",
            r#"{"properties": {"name": {"type": "string"}},
                "x-custom-functions": ["recalculate", "audit"],
                "x-custom-routes": ["recalculate"]}"#,
        )
        .unwrap();
        assert_eq!(d.custom_endpoints.len(), 2);
        assert!(d.custom_endpoints[0].expose_route);
        assert!(!d.custom_endpoints[1].expose_route);
        assert_eq!(d.custom_endpoints[0].route_path, "/recalculate");
    }

    #[test]
    fn test_current_endpoints_win_over_legacy() {
        let d = parse(
            "team",
            r#"{"properties": {"name": {"type": "string"}},
                "x-custom-endpoints": [{"name": "recalculate", "http_method": "post"}],
                "x-custom-functions": ["audit"]}"#,
        )
        .unwrap();
        assert_eq!(d.custom_endpoints.len(), 1);
        let ep = &d.custom_endpoints[0];
        assert_eq!(ep.http_method, HttpMethod::Post);
        assert!(ep.expose_route);
    }

    #[test]
    fn test_invalid_route_path() {
        let err = parse(
            "team",
            r#"{"properties": {"name": {"type": "string"}},
                "x-custom-endpoints": [{"name": "stats", "route_path": "stats"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("route path"));
    }

    #[test]
    fn test_non_scalar_search_field_matches_exactly() {
        let d = parse(
            "team",
            r#"{"properties": {"tags": {"type": "array"}, "meta": {"type": "object"}},
                "x-search-fields": ["tags", "meta"]}"#,
        )
        .unwrap();
        assert_eq!(d.search_fields[0].strategy, MatchStrategy::Exact);
        assert_eq!(d.search_fields[1].strategy, MatchStrategy::Exact);
    }

    #[test]
    fn test_untyped_search_field_is_a_string() {
        let d = parse(
            "team",
            r#"{"properties": {"nickname": {"description": "no type"}},
                "x-search-fields": ["nickname"]}"#,
        )
        .unwrap();
        assert_eq!(d.properties["nickname"].primitive_type, JsonType::String);
        assert_eq!(d.search_fields[0].name, "nickname");
        assert_eq!(d.search_fields[0].strategy, MatchStrategy::Substring);
    }

    #[test]
    fn test_generated_field_collision() {
        let err = parse("team", r#"{"properties": {"rev": {"type": "string"}}}"#).unwrap_err();
        assert!(err.to_string().contains("collides"));
    }

    #[test]
    fn test_entity_names_that_shadow_generated_types() {
        for name in ["database", "service_error", "team_base", "team_update"] {
            let err = parse(name, r#"{"properties": {"name": {"type": "string"}}}"#).unwrap_err();
            assert!(matches!(err, AppError::SchemaParse { .. }), "{}", name);
        }
        assert!(parse("baseline", r#"{"properties": {"name": {"type": "string"}}}"#).is_ok());
    }

    #[test]
    fn test_search_field_cannot_shadow_pagination() {
        let err = parse(
            "team",
            r#"{"properties": {"limit": {"type": "integer"}}, "x-search-fields": ["limit"]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("pagination"));
    }
}
