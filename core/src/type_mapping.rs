#![deny(missing_docs)]

//! # Type Mapping
//!
//! Converts JSON Schema primitive types and formats into Rust types for the
//! generated models.
//! Handles primitives, temporal formats and the dynamic fallback for anything unknown.

use std::fmt::Display;

/// Represents the simplified JSON types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonType {
    /// A string type.
    String,
    /// An integer type.
    Integer,
    /// A floating point number.
    Number,
    /// A boolean type.
    Boolean,
    /// An array of arbitrary items.
    Array,
    /// A free-form mapping.
    Object,
    /// Anything the mapper does not know (including a missing `type`).
    Unknown(String),
}

impl JsonType {
    /// Parses the `type` keyword of a property. A missing type is `Unknown("")`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("string") => JsonType::String,
            Some("integer") => JsonType::Integer,
            Some("number") => JsonType::Number,
            Some("boolean") => JsonType::Boolean,
            Some("array") => JsonType::Array,
            Some("object") => JsonType::Object,
            Some(other) => JsonType::Unknown(other.to_string()),
            None => JsonType::Unknown(String::new()),
        }
    }

    /// Whether values of this type can be passed as a single query parameter.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            JsonType::String | JsonType::Integer | JsonType::Number | JsonType::Boolean
        )
    }
}

impl Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonType::String => write!(f, "string"),
            JsonType::Integer => write!(f, "integer"),
            JsonType::Number => write!(f, "number"),
            JsonType::Boolean => write!(f, "boolean"),
            JsonType::Array => write!(f, "array"),
            JsonType::Object => write!(f, "object"),
            JsonType::Unknown(s) if s.is_empty() => write!(f, "any"),
            JsonType::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// Format specifiers that override the primitive mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    /// RFC 3339 timestamp.
    DateTime,
    /// Calendar date.
    Date,
    /// A format the mapper ignores (e.g. `email`).
    Other(String),
}

impl Format {
    /// Parses the `format` keyword of a property.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "date-time" => Format::DateTime,
            "date" => Format::Date,
            other => Format::Other(other.to_string()),
        }
    }
}

/// A mapped Rust type together with the `use` lines it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RustType {
    /// The type as written in generated code (e.g. `DateTime<Utc>`).
    pub ty: String,
    /// Item paths `ty` needs in scope (e.g. `chrono::Utc`).
    pub imports: Vec<&'static str>,
}

impl RustType {
    fn plain(ty: &str) -> Self {
        RustType {
            ty: ty.to_string(),
            imports: Vec::new(),
        }
    }

    fn with_imports(ty: &str, imports: &[&'static str]) -> Self {
        RustType {
            ty: ty.to_string(),
            imports: imports.to_vec(),
        }
    }
}

/// Trait for converting schema types to Rust types.
pub trait TypeMapper {
    /// Maps a primitive type, optionally refined by a format, to a Rust type.
    fn map(&self, primitive: &JsonType, format: Option<&Format>) -> RustType;

    /// Maps a primitive for use as a query-string parameter. Formats are ignored.
    ///
    /// Arrays, objects and unknown types arrive as plain text and are compared verbatim.
    fn map_query(&self, primitive: &JsonType) -> RustType {
        if primitive.is_scalar() {
            self.map(primitive, None)
        } else {
            RustType::plain("String")
        }
    }
}

/// The standard implementation of `TypeMapper`.
pub struct JsonToRustMapper;

const VALUE_IMPORT: &str = "serde_json::Value";

impl TypeMapper for JsonToRustMapper {
    fn map(&self, primitive: &JsonType, format: Option<&Format>) -> RustType {
        match format {
            Some(Format::DateTime) => {
                return RustType::with_imports("DateTime<Utc>", &["chrono::DateTime", "chrono::Utc"])
            }
            Some(Format::Date) => {
                return RustType::with_imports("NaiveDate", &["chrono::NaiveDate"])
            }
            _ => {}
        }

        match primitive {
            JsonType::String => RustType::plain("String"),
            JsonType::Integer => RustType::plain("i64"),
            JsonType::Number => RustType::plain("f64"),
            JsonType::Boolean => RustType::plain("bool"),
            JsonType::Array => RustType::with_imports("Vec<Value>", &[VALUE_IMPORT]),
            JsonType::Object => RustType::with_imports(
                "Map<String, Value>",
                &["serde_json::Map", VALUE_IMPORT],
            ),
            JsonType::Unknown(_) => RustType::with_imports("Value", &[VALUE_IMPORT]),
        }
    }
}

/// Documentation example for a primitive, as a `json!` literal.
///
/// Only scalars carry an example; containers and unknown types return `None`.
pub fn example_literal(primitive: &JsonType) -> Option<&'static str> {
    match primitive {
        JsonType::String => Some("\"example text\""),
        JsonType::Integer => Some("42"),
        JsonType::Number => Some("1.5"),
        JsonType::Boolean => Some("true"),
        _ => None,
    }
}
