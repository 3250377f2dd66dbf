#![deny(missing_docs)]

//! # Naming Utilities
//!
//! Case conversions for generated identifiers and the collection-naming policy.
//!
//! Collection names are the singular entity name, unchanged. Generated service
//! structs, route prefixes and the collection configuration all go through
//! [`collection_name`] so the three always agree.

use heck::{ToLowerCamelCase, ToPascalCase};

/// Keywords that require the `r#` prefix when used as identifiers.
const RAW_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe",
    "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be used as identifiers at all, not even as raw identifiers.
const FORBIDDEN_IDENTS: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Converts snake_case to PascalCase. e.g. `team_match` -> `TeamMatch`.
pub fn to_pascal_case(s: &str) -> String {
    s.to_pascal_case()
}

/// Converts snake_case to camelCase. e.g. `team_match` -> `teamMatch`.
pub fn to_camel_case(s: &str) -> String {
    s.to_lower_camel_case()
}

/// Storage collection name for an entity.
///
/// Entity names are kept singular and unpluralized.
pub fn collection_name(entity_name: &str) -> String {
    entity_name.to_string()
}

/// Module name of the generated model file for an entity.
pub fn model_module(entity_name: &str) -> String {
    entity_name.to_string()
}

/// Module name of the generated service file for an entity.
pub fn service_module(entity_name: &str) -> String {
    format!("{}_service", entity_name)
}

/// Module name of the generated route file for an entity.
pub fn route_module(entity_name: &str) -> String {
    format!("{}_routes", entity_name)
}

/// Renders a name as a Rust identifier, escaping keywords with `r#`.
///
/// e.g. `match` -> `r#match`, `team` -> `team`.
pub fn rust_ident(name: &str) -> String {
    if RAW_KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}

/// Checks that a name can be emitted as a Rust identifier (possibly raw).
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = match chars.next() {
        Some(c) => c.is_ascii_alphabetic() || c == '_',
        None => false,
    };
    starts_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !FORBIDDEN_IDENTS.contains(&name)
}

/// Whether a field name denotes an identifier reference (a key, id or relation end).
///
/// Such fields are always filtered by exact value, even when they are strings.
pub fn is_identifier_reference(field: &str) -> bool {
    matches!(field, "_key" | "_id" | "_from" | "_to" | "id" | "key")
        || field.ends_with("_id")
        || field.ends_with("_key")
}

/// Suffixes of the per-entity types a model module exports next to the bare entity type.
pub const MODEL_TYPE_SUFFIXES: [&str; 4] = ["Base", "Create", "DeleteResponse", "Update"];

/// Type names generated files import or take from the prelude.
const RESERVED_TYPE_NAMES: &[&str] = &[
    "Box", "Clone", "Database", "DateTime", "DbError", "Debug", "Default", "Deserialize", "Err",
    "HttpResponse", "Map", "NaiveDate", "None", "Ok", "Option", "Result", "Serialize",
    "ServiceError", "Some", "String", "ToSchema", "Utc", "Value", "Vec",
];

/// Why an entity's type name would clash inside the generated tree, if it would.
///
/// An entity may not shadow an imported or prelude type, and may not end in a
/// model suffix (`team_base` would collide with the `TeamBase` of `team`).
pub fn entity_type_clash(entity_name: &str) -> Option<String> {
    let pascal = to_pascal_case(entity_name);
    if RESERVED_TYPE_NAMES.contains(&pascal.as_str()) {
        return Some(format!(
            "type '{}' would shadow a type the generated code uses",
            pascal
        ));
    }
    MODEL_TYPE_SUFFIXES
        .iter()
        .find(|suffix| pascal.len() > suffix.len() && pascal.ends_with(*suffix))
        .map(|suffix| {
            format!(
                "type '{}' collides with the {} type generated for '{}'",
                pascal,
                suffix,
                &pascal[..pascal.len() - suffix.len()]
            )
        })
}

/// Whether a property is internal to the storage engine (`_key`, `_from`, ...).
pub fn is_internal_field(field: &str) -> bool {
    field.starts_with('_')
}
