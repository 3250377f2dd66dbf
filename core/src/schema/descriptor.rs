//! # Entity Descriptor
//!
//! The validated, strongly-typed description of one entity. Every renderer reads
//! from this type only; the raw schema never leaks past the loader.

use crate::naming;
use crate::type_mapping::{Format, JsonType};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;

/// One declared property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    /// Primitive JSON type.
    pub primitive_type: JsonType,
    /// Optional refining format.
    pub format: Option<Format>,
    /// Description carried into generated docs.
    pub description: Option<String>,
    /// Default applied on create when the field is absent.
    pub default: Option<Value>,
    /// Whether the field is listed in `required`.
    pub required: bool,
}

/// Document entity or edge between two other entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// A plain document collection.
    Document,
    /// A relation collection connecting `from` to `to`.
    Edge {
        /// Source entity name.
        from: String,
        /// Target entity name.
        to: String,
    },
}

/// How a search field is compared against its filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Case-insensitive substring match.
    Substring,
    /// Exact value match.
    Exact,
}

/// A field usable as a list filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchField {
    /// Property name.
    pub name: String,
    /// Comparison used for this field.
    pub strategy: MatchStrategy,
}

/// HTTP verbs accepted for custom endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Parses a verb case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "patch" => Some(HttpMethod::Patch),
            "delete" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    /// Lowercase verb, as used in route builders (`web::get()`).
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// A user-declared operation injected from a fragment template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomEndpoint {
    /// Function name inside the service.
    pub name: String,
    /// HTTP verb of the route.
    #[serde(serialize_with = "serialize_method")]
    pub http_method: HttpMethod,
    /// Route path relative to the entity prefix.
    pub route_path: String,
    /// Whether a route handler is generated.
    pub expose_route: bool,
    /// Free text for fragment templates.
    pub description: Option<String>,
}

fn serialize_method<S: serde::Serializer>(m: &HttpMethod, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(m.as_str())
}

impl CustomEndpoint {
    /// Route handler name, scoped to the entity to avoid collisions.
    pub fn handler_name(&self, entity_name: &str) -> String {
        format!("{}_{}", entity_name, self.name)
    }
}

/// Blocks deletion while another collection references the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionConstraint {
    /// Referencing collection.
    pub collection: String,
    /// Referencing field.
    pub field: String,
    /// Optional conflict message.
    pub message: Option<String>,
}

/// The validated description of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    /// Unique entity key, taken from the schema file name.
    pub entity_name: String,
    /// Schema `title`, or the Pascal name when absent.
    pub title: String,
    /// Schema `description`.
    pub description: String,
    /// Declared properties in document order.
    pub properties: IndexMap<String, PropertySpec>,
    /// Document or edge.
    pub kind: EntityKind,
    /// Deduplicated unique field sets.
    pub unique_combinations: Vec<Vec<String>>,
    /// Filterable fields in declared order.
    pub search_fields: Vec<SearchField>,
    /// Deletion constraints.
    pub deletion_constraints: Vec<DeletionConstraint>,
    /// Custom endpoints in canonical form.
    pub custom_endpoints: Vec<CustomEndpoint>,
    /// Defaults applied on create (property defaults merged with `x-default-values`).
    pub defaults: IndexMap<String, Value>,
}

impl EntityDescriptor {
    /// Whether this entity is an edge collection.
    pub fn is_edge(&self) -> bool {
        matches!(self.kind, EntityKind::Edge { .. })
    }

    /// The `(from, to)` entities of an edge.
    pub fn connected_entities(&self) -> Option<(&str, &str)> {
        match &self.kind {
            EntityKind::Edge { from, to } => Some((from.as_str(), to.as_str())),
            EntityKind::Document => None,
        }
    }

    /// PascalCase entity name.
    pub fn pascal_name(&self) -> String {
        naming::to_pascal_case(&self.entity_name)
    }

    /// camelCase entity name.
    pub fn camel_name(&self) -> String {
        naming::to_camel_case(&self.entity_name)
    }

    /// Storage collection name.
    pub fn collection_name(&self) -> String {
        naming::collection_name(&self.entity_name)
    }

    /// Properties that are not storage-internal (`_key`, `_from`, ...).
    pub fn public_properties(&self) -> impl Iterator<Item = (&String, &PropertySpec)> {
        self.properties
            .iter()
            .filter(|(name, _)| !naming::is_internal_field(name))
    }

    /// Looks up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.get(name)
    }

    /// Whether `field` is a declared property.
    pub fn declares(&self, field: &str) -> bool {
        self.properties.contains_key(field)
    }

    /// Summary written to the router config and handed to fragment templates.
    pub fn summary(&self) -> EntitySummary {
        let pascal_name = self.pascal_name();
        EntitySummary {
            entity_name: self.entity_name.clone(),
            camel_name: self.camel_name(),
            description: format!("API for managing {} resources", pascal_name),
            pascal_name,
            is_edge: self.is_edge(),
            connected_entities: self
                .connected_entities()
                .map(|(f, t)| vec![f.to_string(), t.to_string()])
                .unwrap_or_default(),
            search_fields: self.search_fields.iter().map(|f| f.name.clone()).collect(),
        }
    }
}

/// Serialized summary of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct EntitySummary {
    /// snake_case name.
    pub entity_name: String,
    /// PascalCase name.
    pub pascal_name: String,
    /// camelCase name.
    pub camel_name: String,
    /// Short description of the generated API.
    pub description: String,
    /// Relation status.
    pub is_edge: bool,
    /// `[from, to]` for edges, empty otherwise.
    pub connected_entities: Vec<String>,
    /// Search field names.
    pub search_fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge() -> EntityDescriptor {
        EntityDescriptor {
            entity_name: "team_match".into(),
            title: "TeamMatch".into(),
            description: String::new(),
            properties: IndexMap::new(),
            kind: EntityKind::Edge {
                from: "team".into(),
                to: "match".into(),
            },
            unique_combinations: vec![],
            search_fields: vec![SearchField {
                name: "round".into(),
                strategy: MatchStrategy::Exact,
            }],
            deletion_constraints: vec![],
            custom_endpoints: vec![],
            defaults: IndexMap::new(),
        }
    }

    #[test]
    fn test_summary() {
        let summary = edge().summary();
        assert_eq!(summary.pascal_name, "TeamMatch");
        assert_eq!(summary.camel_name, "teamMatch");
        assert_eq!(summary.description, "API for managing TeamMatch resources");
        assert!(summary.is_edge);
        assert_eq!(summary.connected_entities, vec!["team", "match"]);
        assert_eq!(summary.search_fields, vec!["round"]);
    }

    #[test]
    fn test_http_method() {
        assert_eq!(HttpMethod::parse("POST"), Some(HttpMethod::Post));
        assert_eq!(HttpMethod::parse("options"), None);
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
    }

    #[test]
    fn test_handler_name_is_entity_scoped() {
        let ep = CustomEndpoint {
            name: "recalculate".into(),
            http_method: HttpMethod::Post,
            route_path: "/recalculate".into(),
            expose_route: true,
            description: None,
        };
        assert_eq!(ep.handler_name("team"), "team_recalculate");
    }
}
