//! # Raw Schema Documents
//!
//! Serde view of an entity schema exactly as it appears on disk.
//! Nothing here is validated; see [`crate::schema::loader`] for normalization.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// A schema document before normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSchema {
    /// `title` keyword.
    #[serde(default)]
    pub title: Option<String>,
    /// `description` keyword.
    #[serde(default)]
    pub description: Option<String>,
    /// `properties` keyword. Required; kept optional so its absence is reported clearly.
    #[serde(default)]
    pub properties: Option<IndexMap<String, RawProperty>>,
    /// `required` keyword.
    #[serde(default)]
    pub required: Vec<String>,
    /// Field sets whose joint values must be unique.
    #[serde(rename = "x-unique-combinations", default)]
    pub unique_combinations: Vec<Vec<String>>,
    /// Fields exposed as list filters.
    #[serde(rename = "x-search-fields", default)]
    pub search_fields: Vec<String>,
    /// Collections that block deletion while they reference a record.
    #[serde(rename = "x-deletion-constraints", default)]
    pub deletion_constraints: Vec<RawDeletionConstraint>,
    /// Current custom endpoint declarations.
    #[serde(rename = "x-custom-endpoints", default)]
    pub custom_endpoints: Vec<RawEndpoint>,
    /// Legacy: custom function names.
    #[serde(rename = "x-custom-functions", default)]
    pub custom_functions: Vec<String>,
    /// Legacy: names from `x-custom-functions` that also get a route.
    #[serde(rename = "x-custom-routes", default)]
    pub custom_routes: Vec<String>,
    /// Default values that override property-level `default`s.
    #[serde(rename = "x-default-values", default)]
    pub default_values: IndexMap<String, Value>,
    /// The two entities an edge connects, `[from, to]`.
    #[serde(rename = "x-connects", default)]
    pub connects: Option<Vec<String>>,
}

/// A single entry of `properties`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProperty {
    /// `type` keyword; either a single name or a union such as `["string", "null"]`.
    #[serde(rename = "type", default)]
    pub type_: Option<TypeKeyword>,
    /// `format` keyword.
    #[serde(default)]
    pub format: Option<String>,
    /// `description` keyword.
    #[serde(default)]
    pub description: Option<String>,
    /// `default` keyword.
    #[serde(default)]
    pub default: Option<Value>,
}

/// The two shapes the `type` keyword takes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeKeyword {
    /// `"type": "string"`
    Single(String),
    /// `"type": ["string", "null"]`
    Union(Vec<String>),
}

impl TypeKeyword {
    /// The first non-null member of the type.
    pub fn primary(&self) -> Option<&str> {
        match self {
            TypeKeyword::Single(s) => Some(s.as_str()),
            TypeKeyword::Union(v) => v.iter().map(String::as_str).find(|t| *t != "null"),
        }
    }
}

/// A custom endpoint, declared either by bare name or in full.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawEndpoint {
    /// `"recalculate"`
    Name(String),
    /// `{"name": "recalculate", "http_method": "post", ...}`
    Spec(RawEndpointSpec),
}

/// Full custom endpoint declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEndpointSpec {
    /// Function name.
    pub name: String,
    /// HTTP verb for the route.
    #[serde(default, alias = "method")]
    pub http_method: Option<String>,
    /// Route path relative to the entity prefix.
    #[serde(default, alias = "path")]
    pub route_path: Option<String>,
    /// Whether a route is generated at all.
    #[serde(default)]
    pub expose_route: Option<bool>,
    /// Free text handed to fragment templates.
    #[serde(default)]
    pub description: Option<String>,
}

/// A `{collection, field}` pair from `x-deletion-constraints`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDeletionConstraint {
    /// Collection holding referencing documents.
    pub collection: String,
    /// Field in that collection holding the reference.
    pub field: String,
    /// Optional message used for the conflict.
    #[serde(default)]
    pub message: Option<String>,
}
