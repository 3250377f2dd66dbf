//! # Model Rendering
//!
//! Emits `models/<entity>.rs`: the base, create, update and stored variants of
//! the entity plus its delete response. Field order always follows the schema.

use crate::naming;
use crate::render::{doc_comment, file_header, string_literal, Imports, TIMESTAMP_FIELDS};
use crate::schema::{EntityDescriptor, PropertySpec};
use crate::type_mapping::{example_literal, Format, RustType, TypeMapper};

/// Type names exported by a model module, in re-export order.
pub fn exported_types(entity: &EntityDescriptor) -> Vec<String> {
    let pascal = entity.pascal_name();
    let mut types = vec![pascal.clone()];
    types.extend(
        naming::MODEL_TYPE_SUFFIXES
            .iter()
            .map(|suffix| format!("{}{}", pascal, suffix)),
    );
    types
}

struct ModelField {
    name: String,
    ident: String,
    ty: RustType,
    description: Option<String>,
    example: Option<&'static str>,
    required: bool,
}

impl ModelField {
    fn new(name: &str, spec: &PropertySpec, mapper: &impl TypeMapper) -> Self {
        let example = match spec.format {
            Some(Format::DateTime) => Some("\"2024-01-01T00:00:00Z\""),
            Some(Format::Date) => Some("\"2024-01-01\""),
            _ => example_literal(&spec.primitive_type),
        };
        Self {
            name: name.to_string(),
            ident: naming::rust_ident(name),
            ty: mapper.map(&spec.primitive_type, spec.format.as_ref()),
            description: spec.description.clone(),
            example,
            required: spec.required,
        }
    }

    fn render(&self, optional: bool) -> String {
        let mut code = String::new();
        if let Some(desc) = &self.description {
            code.push_str(&doc_comment(desc, "    "));
        }
        if optional {
            code.push_str("    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n");
        }
        if let Some(example) = self.example {
            code.push_str(&format!("    #[schema(example = {})]\n", example));
        }
        let ty = if optional {
            format!("Option<{}>", self.ty.ty)
        } else {
            self.ty.ty.clone()
        };
        code.push_str(&format!("    pub {}: {},\n", self.ident, ty));
        code
    }
}

fn edge_fields(from: &str, to: &str) -> String {
    let mut code = String::new();
    for (field, wire, target) in [("from_id", "_from", from), ("to_id", "_to", to)] {
        code.push_str(&format!(
            "    /// Handle of the `{}` document (`{}/<key>`); a bare key is accepted.\n",
            target,
            naming::collection_name(target)
        ));
        code.push_str(&format!(
            "    #[serde(rename = \"{}\", alias = \"{}\")]\n",
            wire, field
        ));
        code.push_str(&format!("    pub {}: String,\n", field));
    }
    code
}

fn open_struct(code: &mut String, docs: &str, derives: &str, name: &str) {
    code.push_str(&doc_comment(docs, ""));
    code.push_str(&format!("#[derive({})]\n", derives));
    code.push_str(&format!("pub struct {} {{\n", name));
}

const DERIVES: &str = "Debug, Clone, Serialize, Deserialize, ToSchema";

/// Renders the model artifact.
pub fn render_model(entity: &EntityDescriptor, mapper: &impl TypeMapper) -> String {
    let pascal = entity.pascal_name();
    let fields: Vec<ModelField> = entity
        .public_properties()
        .map(|(name, spec)| ModelField::new(name, spec, mapper))
        .collect();
    let timestamps: Vec<&str> = TIMESTAMP_FIELDS
        .iter()
        .copied()
        .filter(|f| !entity.declares(f))
        .collect();

    let mut imports = Imports::default();
    imports.extend([
        "serde::Deserialize",
        "serde::Serialize",
        "serde_json::json",
        "serde_json::Value",
        "utoipa::ToSchema",
    ]);
    for field in &fields {
        imports.extend(field.ty.imports.iter().copied());
    }
    if !timestamps.is_empty() {
        imports.extend(["chrono::DateTime", "chrono::Utc"]);
    }

    let mut code = file_header(&format!(
        "Data models for the `{}` entity.",
        entity.entity_name
    ));
    code.push_str(&imports.render());

    // Base
    let mut base_docs = entity.title.clone();
    if !entity.description.is_empty() {
        base_docs.push_str("\n\n");
        base_docs.push_str(&entity.description);
    }
    open_struct(&mut code, &base_docs, DERIVES, &format!("{}Base", pascal));
    for field in &fields {
        code.push_str(&field.render(!field.required));
    }
    code.push_str("}\n\n");

    // Create
    open_struct(
        &mut code,
        &format!("Payload accepted when creating a {}.", pascal),
        DERIVES,
        &format!("{}Create", pascal),
    );
    if let Some((from, to)) = entity.connected_entities() {
        code.push_str(&edge_fields(from, to));
    }
    for field in &fields {
        code.push_str(&field.render(!field.required));
    }
    code.push_str("}\n\n");

    code.push_str(&format!("impl {}Create {{\n", pascal));
    code.push_str("    /// Example payload for documentation and tests.\n");
    code.push_str("    pub fn example() -> Value {\n");
    let mut entries = Vec::new();
    if let Some((from, to)) = entity.connected_entities() {
        entries.push(format!(
            "\"_from\": {}",
            string_literal(&format!("{}/1", naming::collection_name(from)))
        ));
        entries.push(format!(
            "\"_to\": {}",
            string_literal(&format!("{}/1", naming::collection_name(to)))
        ));
    }
    for field in &fields {
        if let Some(example) = field.example {
            entries.push(format!("{}: {}", string_literal(&field.name), example));
        }
    }
    if entries.is_empty() {
        code.push_str("        json!({})\n");
    } else {
        code.push_str("        json!({\n");
        code.push_str(
            &entries
                .iter()
                .map(|e| format!("            {}", e))
                .collect::<Vec<_>>()
                .join(",\n"),
        );
        code.push_str("\n        })\n");
    }
    code.push_str("    }\n}\n\n");

    // Update
    open_struct(
        &mut code,
        &format!("Partial update of a {}; absent fields keep their stored value.", pascal),
        &format!("{}, Default", DERIVES),
        &format!("{}Update", pascal),
    );
    for field in &fields {
        code.push_str(&field.render(true));
    }
    code.push_str("}\n\n");

    // Stored
    open_struct(
        &mut code,
        &format!("A stored {} as returned by the API.", pascal),
        DERIVES,
        &pascal,
    );
    code.push_str("    /// Document key.\n");
    code.push_str("    #[serde(rename = \"_key\", alias = \"key\")]\n");
    code.push_str("    pub key: String,\n");
    code.push_str("    /// Document handle (`<collection>/<key>`).\n");
    code.push_str("    #[serde(rename = \"_id\", alias = \"id\", default, skip_serializing_if = \"Option::is_none\")]\n");
    code.push_str("    pub id: Option<String>,\n");
    code.push_str("    /// Revision token.\n");
    code.push_str("    #[serde(rename = \"_rev\", alias = \"rev\", default, skip_serializing_if = \"Option::is_none\")]\n");
    code.push_str("    pub rev: Option<String>,\n");
    if let Some((from, to)) = entity.connected_entities() {
        code.push_str(&edge_fields(from, to));
    }
    for field in &fields {
        code.push_str(&field.render(!field.required));
    }
    for ts in &timestamps {
        code.push_str(&format!("    /// Set by the service on {}.\n", match *ts {
            "created_at" => "create",
            _ => "create and update",
        }));
        code.push_str("    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n");
        code.push_str(&format!("    pub {}: Option<DateTime<Utc>>,\n", ts));
    }
    code.push_str("}\n\n");

    // Delete response
    open_struct(
        &mut code,
        &format!("Result of deleting a {}.", pascal),
        DERIVES,
        &format!("{}DeleteResponse", pascal),
    );
    code.push_str("    /// Whether the record was removed.\n");
    code.push_str("    pub success: bool,\n");
    code.push_str("}\n");

    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::verify_syntax;
    use crate::schema::normalize;
    use crate::schema::raw::RawSchema;
    use crate::type_mapping::JsonToRustMapper;
    use std::path::Path;

    fn entity(name: &str, json: &str) -> EntityDescriptor {
        let raw: RawSchema = serde_json::from_str(json).unwrap();
        normalize(name, raw, Path::new("test.schema.json")).unwrap()
    }

    fn player() -> EntityDescriptor {
        entity(
            "player",
            r#"{
                "title": "Player",
                "description": "A registered player.",
                "properties": {
                    "name": {"type": "string", "description": "Full name"},
                    "born": {"type": "string", "format": "date"},
                    "rating": {"type": "number"},
                    "tags": {"type": "array"},
                    "type": {"type": "string"}
                },
                "required": ["name"]
            }"#,
        )
    }

    #[test]
    fn test_required_and_optional_fields() {
        let code = render_model(&player(), &JsonToRustMapper);
        let create = &code[code.find("pub struct PlayerCreate").unwrap()..];
        let create = &create[..create.find('}').unwrap()];
        assert!(create.contains("    pub name: String,\n"));
        assert!(create.contains("    pub rating: Option<f64>,\n"));
        assert!(create.contains("    pub born: Option<NaiveDate>,\n"));
        assert!(create.contains("    pub r#type: Option<String>,\n"));
        assert!(create.contains("    /// Full name\n"));

        let update = &code[code.find("pub struct PlayerUpdate").unwrap()..];
        assert!(update.contains("    pub name: Option<String>,\n"));
        verify_syntax("player.rs", &code).unwrap();
    }

    #[test]
    fn test_imports_follow_field_types() {
        let code = render_model(&player(), &JsonToRustMapper);
        assert!(code.contains("use chrono::{DateTime, NaiveDate, Utc};\n"));
        assert!(code.contains("use serde_json::{json, Value};\n"));
        assert!(code.contains("use utoipa::ToSchema;\n"));
    }

    #[test]
    fn test_stored_variant() {
        let code = render_model(&player(), &JsonToRustMapper);
        let stored = &code[code.find("pub struct Player {").unwrap()..];
        assert!(stored.contains("#[serde(rename = \"_key\", alias = \"key\")]\n    pub key: String,"));
        assert!(stored.contains("pub created_at: Option<DateTime<Utc>>,"));
        assert!(stored.contains("pub updated_at: Option<DateTime<Utc>>,"));
        assert!(code.contains("pub struct PlayerDeleteResponse {\n    /// Whether the record was removed.\n    pub success: bool,\n}"));
    }

    #[test]
    fn test_edge_model_carries_endpoints() {
        let edge = entity(
            "team_match",
            r#"{
                "properties": {
                    "_from": {"type": "string"},
                    "_to": {"type": "string"},
                    "round": {"type": "integer"}
                },
                "x-connects": ["team", "match"]
            }"#,
        );
        let code = render_model(&edge, &JsonToRustMapper);
        assert!(code.contains("#[serde(rename = \"_from\", alias = \"from_id\")]\n    pub from_id: String,"));
        assert!(code.contains("#[serde(rename = \"_to\", alias = \"to_id\")]\n    pub to_id: String,"));
        assert!(code.contains("\"_to\": \"match/1\""));
        assert!(!code.contains("pub _from"));
        verify_syntax("team_match.rs", &code).unwrap();
    }

    #[test]
    fn test_declared_timestamps_are_not_duplicated() {
        let e = entity(
            "event",
            r#"{"properties": {"created_at": {"type": "string", "format": "date-time"}}}"#,
        );
        let code = render_model(&e, &JsonToRustMapper);
        assert_eq!(code.matches("pub created_at:").count(), 4);
        assert_eq!(code.matches("pub updated_at:").count(), 1);
    }

    #[test]
    fn test_exported_types() {
        assert_eq!(
            exported_types(&player()),
            vec!["Player", "PlayerBase", "PlayerCreate", "PlayerDeleteResponse", "PlayerUpdate"]
        );
    }
}
