//! # Service Rendering
//!
//! Emits `services/<entity>_service.rs`. The generated service borrows a
//! caller-owned `Database` handle and implements create, list, get, update and
//! delete, plus search for entities with search fields and traversal queries
//! for edges. Unique combinations and deletion constraints are compiled into
//! associated constants the operations iterate over.

use crate::naming;
use crate::render::{doc_comment, file_header, string_literal, Imports};
use crate::schema::{EntityDescriptor, MatchStrategy};

/// Name of the unique index backing a field set: sorted field names joined by `_`.
///
/// e.g. `["season", "league_id"]` -> `league_id_season_unique`.
pub fn unique_index_name(fields: &[String]) -> String {
    let mut sorted: Vec<&str> = fields.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    format!("{}_unique", sorted.join("_"))
}

/// Name of the generated service struct.
pub fn service_type(entity: &EntityDescriptor) -> String {
    format!("{}Service", entity.pascal_name())
}

fn str_slice(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| string_literal(i)).collect();
    format!("&[{}]", quoted.join(", "))
}

fn constants(entity: &EntityDescriptor) -> String {
    let pascal = entity.pascal_name();
    let mut code = String::new();
    code.push_str("    /// Backing collection.\n");
    code.push_str(&format!(
        "    pub const COLLECTION: &'static str = {};\n",
        string_literal(&entity.collection_name())
    ));
    if let Some((from, to)) = entity.connected_entities() {
        code.push_str("    /// Collection `_from` handles point into.\n");
        code.push_str(&format!(
            "    pub const FROM_COLLECTION: &'static str = {};\n",
            string_literal(&naming::collection_name(from))
        ));
        code.push_str("    /// Collection `_to` handles point into.\n");
        code.push_str(&format!(
            "    pub const TO_COLLECTION: &'static str = {};\n",
            string_literal(&naming::collection_name(to))
        ));
    }

    code.push_str("    /// Unique indexes as `(index name, fields)`.\n");
    code.push_str("    pub const UNIQUE_INDEXES: &'static [(&'static str, &'static [&'static str])] = &[");
    let entries: Vec<String> = entity
        .unique_combinations
        .iter()
        .map(|set| {
            format!(
                "\n        ({}, {}),",
                string_literal(&unique_index_name(set)),
                str_slice(set)
            )
        })
        .collect();
    code.push_str(&entries.concat());
    if !entries.is_empty() {
        code.push_str("\n    ");
    }
    code.push_str("];\n");

    code.push_str("    /// Records that block deletion, as `(collection, field, message)`.\n");
    code.push_str(
        "    pub const DELETION_CONSTRAINTS: &'static [(&'static str, &'static str, &'static str)] = &[",
    );
    let entries: Vec<String> = entity
        .deletion_constraints
        .iter()
        .map(|c| {
            let message = c.message.clone().unwrap_or_else(|| {
                format!(
                    "Cannot delete {}: it is referenced by {}.{}",
                    pascal, c.collection, c.field
                )
            });
            format!(
                "\n        ({}, {}, {}),",
                string_literal(&naming::collection_name(&c.collection)),
                string_literal(&c.field),
                string_literal(&message)
            )
        })
        .collect();
    code.push_str(&entries.concat());
    if !entries.is_empty() {
        code.push_str("\n    ");
    }
    code.push_str("];\n\n");
    code
}

fn create_fn(entity: &EntityDescriptor) -> String {
    let pascal = entity.pascal_name();
    let mut code = String::new();
    code.push_str("    /// Creates a record after applying defaults and unique checks.\n");
    code.push_str(&format!(
        "    pub fn create(&self, data: {p}Create) -> Result<{p}, ServiceError> {{\n",
        p = pascal
    ));
    code.push_str("        let collection = self.collection()?;\n");
    code.push_str("        let mut doc = support::to_document(&data)?;\n");
    for (field, value) in &entity.defaults {
        code.push_str(&format!(
            "        support::apply_default(&mut doc, {}, json!({}));\n",
            string_literal(field),
            value
        ));
    }
    if entity.is_edge() {
        code.push_str("        Self::normalize_handles(&mut doc);\n");
    }
    code.push_str("        let now = support::now();\n");
    code.push_str("        doc.insert(\"created_at\".to_string(), now.clone());\n");
    code.push_str("        doc.insert(\"updated_at\".to_string(), now);\n");
    code.push_str("        self.ensure_indexes()?;\n");
    code.push_str("        self.check_unique(&doc, None)?;\n");
    code.push_str("        let stored = self.db.insert(collection, Value::Object(doc))?;\n");
    code.push_str("        support::from_document(stored)\n");
    code.push_str("    }\n\n");
    code
}

const LIST_FN: &str = r#"    /// Lists records, `limit` per page starting at `offset`.
    pub fn list(&self, limit: Option<u64>, offset: Option<u64>) -> Result<Vec<{P}>, ServiceError> {
        let collection = self.collection()?;
        let bind_vars = support::page_bind_vars(collection, limit, offset);
        let docs = self
            .db
            .query("FOR doc IN @@collection LIMIT @offset, @limit RETURN doc", bind_vars)?;
        support::from_documents(docs)
    }

    /// Fetches one record by key.
    pub fn get(&self, key: &str) -> Result<{P}, ServiceError> {
        let collection = self.collection()?;
        match self.db.get(collection, key)? {
            Some(doc) => support::from_document(doc),
            None => Err(Self::not_found(key)),
        }
    }

    /// Merges `data` into the stored record and refreshes `updated_at`.
    pub fn update(&self, key: &str, data: {P}Update) -> Result<{P}, ServiceError> {
        let collection = self.collection()?;
        let existing = self.db.get(collection, key)?.ok_or_else(|| Self::not_found(key))?;
        let mut doc = support::into_object(existing)?;
        for (field, value) in support::to_document(&data)? {
            doc.insert(field, value);
        }
        doc.insert("_key".to_string(), json!(key));
        doc.insert("updated_at".to_string(), support::now());
        self.ensure_indexes()?;
        self.check_unique(&doc, Some(key))?;
        let stored = self.db.replace(collection, key, Value::Object(doc))?;
        support::from_document(stored)
    }

    /// Deletes a record unless another collection still references it.
    pub fn delete(&self, key: &str) -> Result<{P}DeleteResponse, ServiceError> {
        let collection = self.collection()?;
        if self.db.get(collection, key)?.is_none() {
            return Err(Self::not_found(key));
        }
        self.check_references(key)?;
        let success = self.db.remove(collection, key)?;
        Ok({P}DeleteResponse { success })
    }

"#;

const SUPPORT_FNS: &str = r#"    /// Creates the declared unique indexes that do not exist yet.
    pub fn ensure_indexes(&self) -> Result<(), ServiceError> {
        let collection = self.collection()?;
        let existing = self.db.index_names(collection)?;
        for (name, fields) in Self::UNIQUE_INDEXES {
            if !existing.iter().any(|n| n.as_str() == *name) {
                self.db.create_unique_index(collection, name, fields)?;
            }
        }
        Ok(())
    }

    fn collection(&self) -> Result<&'static str, ServiceError> {
        support::ensure_collection(self.db, Self::COLLECTION, {EDGE})?;
        Ok(Self::COLLECTION)
    }

    fn not_found(key: &str) -> ServiceError {
        ServiceError::NotFound(format!("{P} with key '{}' not found", key))
    }

    fn check_unique(&self, doc: &Map<String, Value>, exclude_key: Option<&str>) -> Result<(), ServiceError> {
        for (_, fields) in Self::UNIQUE_INDEXES {
            let mut bind_vars = Map::new();
            bind_vars.insert("@collection".to_string(), json!(Self::COLLECTION));
            bind_vars.insert("exclude".to_string(), json!(exclude_key));
            let mut clauses = Vec::new();
            for (i, field) in fields.iter().enumerate() {
                clauses.push(format!("doc.`{}` == @v{}", field, i));
                bind_vars.insert(format!("v{}", i), doc.get(*field).cloned().unwrap_or(Value::Null));
            }
            let aql = format!(
                "FOR doc IN @@collection FILTER {} AND doc._key != @exclude LIMIT 1 RETURN doc._key",
                clauses.join(" AND ")
            );
            if !self.db.query(&aql, bind_vars)?.is_empty() {
                return Err(ServiceError::Conflict(format!(
                    "{P} with the same {} already exists",
                    fields.join(", ")
                )));
            }
        }
        Ok(())
    }

    fn check_references(&self, key: &str) -> Result<(), ServiceError> {
        let handle = support::document_handle(Self::COLLECTION, key);
        for (collection, field, message) in Self::DELETION_CONSTRAINTS {
            if !self.db.has_collection(collection)? {
                continue;
            }
            let mut bind_vars = Map::new();
            bind_vars.insert("@collection".to_string(), json!(collection));
            bind_vars.insert("key".to_string(), json!(key));
            bind_vars.insert("handle".to_string(), json!(handle));
            let aql = format!(
                "FOR doc IN @@collection FILTER doc.`{}` IN [@key, @handle] LIMIT 1 RETURN doc._key",
                field
            );
            if !self.db.query(&aql, bind_vars)?.is_empty() {
                return Err(ServiceError::Conflict(message.to_string()));
            }
        }
        Ok(())
    }
"#;

const EDGE_FNS: &str = r#"    /// Lists edges leaving `from_key`, a `{FROM}` key or handle.
    pub fn list_by_from(&self, from_key: &str, limit: Option<u64>, offset: Option<u64>) -> Result<Vec<{P}>, ServiceError> {
        self.list_edges(Some(from_key), None, limit, offset)
    }

    /// Lists edges arriving at `to_key`, a `{TO}` key or handle.
    pub fn list_by_to(&self, to_key: &str, limit: Option<u64>, offset: Option<u64>) -> Result<Vec<{P}>, ServiceError> {
        self.list_edges(None, Some(to_key), limit, offset)
    }

    /// Lists edges connecting `from_key` to `to_key`.
    pub fn list_by_from_and_to(
        &self,
        from_key: &str,
        to_key: &str,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<{P}>, ServiceError> {
        self.list_edges(Some(from_key), Some(to_key), limit, offset)
    }

    fn list_edges(
        &self,
        from_key: Option<&str>,
        to_key: Option<&str>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<{P}>, ServiceError> {
        let collection = self.collection()?;
        let mut bind_vars = support::page_bind_vars(collection, limit, offset);
        let mut clauses: Vec<&str> = Vec::new();
        if let Some(key) = from_key {
            clauses.push("doc._from == @from_handle");
            bind_vars.insert(
                "from_handle".to_string(),
                json!(support::document_handle(Self::FROM_COLLECTION, key)),
            );
        }
        if let Some(key) = to_key {
            clauses.push("doc._to == @to_handle");
            bind_vars.insert(
                "to_handle".to_string(),
                json!(support::document_handle(Self::TO_COLLECTION, key)),
            );
        }
        let aql = format!(
            "FOR doc IN @@collection FILTER {} LIMIT @offset, @limit RETURN doc",
            clauses.join(" AND ")
        );
        let docs = self.db.query(&aql, bind_vars)?;
        support::from_documents(docs)
    }

"#;

const NORMALIZE_HANDLES_FN: &str = r#"
    fn normalize_handles(doc: &mut Map<String, Value>) {
        for (field, target) in [("_from", Self::FROM_COLLECTION), ("_to", Self::TO_COLLECTION)] {
            let handle = match doc.get(field) {
                Some(Value::String(value)) => support::document_handle(target, value),
                _ => continue,
            };
            doc.insert(field.to_string(), json!(handle));
        }
    }
"#;

fn search_fn(entity: &EntityDescriptor) -> String {
    let pascal = entity.pascal_name();
    let mut code = String::new();
    let mut docs = String::from("Lists records matching `filters`; null filter values are ignored.\n\n");
    for field in &entity.search_fields {
        let how = match field.strategy {
            MatchStrategy::Substring => "case-insensitive substring",
            MatchStrategy::Exact => "exact match",
        };
        docs.push_str(&format!("- `{}`: {}\n", field.name, how));
    }
    code.push_str(&doc_comment(&docs, "    "));
    code.push_str("    pub fn search(\n");
    code.push_str("        &self,\n");
    code.push_str("        mut filters: Map<String, Value>,\n");
    code.push_str("        limit: Option<u64>,\n");
    code.push_str("        offset: Option<u64>,\n");
    code.push_str(&format!(
        "    ) -> Result<Vec<{}>, ServiceError> {{\n",
        pascal
    ));
    code.push_str("        let collection = self.collection()?;\n");
    code.push_str("        filters.retain(|_, value| !value.is_null());\n");
    code.push_str("        let mut bind_vars = support::page_bind_vars(collection, limit, offset);\n");
    code.push_str("        let mut clauses: Vec<&str> = Vec::new();\n");
    for (i, field) in entity.search_fields.iter().enumerate() {
        let bind = format!("f{}", i);
        code.push_str(&format!(
            "        if let Some(value) = filters.get({}) {{\n",
            string_literal(&field.name)
        ));
        let (clause, bound) = match field.strategy {
            MatchStrategy::Substring => (
                format!("LIKE(doc.`{}`, @{}, true)", field.name, bind),
                "support::like_pattern(value)".to_string(),
            ),
            MatchStrategy::Exact => (
                format!("doc.`{}` == @{}", field.name, bind),
                "value.clone()".to_string(),
            ),
        };
        code.push_str(&format!(
            "            clauses.push({});\n",
            string_literal(&clause)
        ));
        code.push_str(&format!(
            "            bind_vars.insert(\"{}\".to_string(), {});\n",
            bind, bound
        ));
        code.push_str("        }\n");
    }
    code.push_str("        let filter = if clauses.is_empty() {\n");
    code.push_str("            String::new()\n");
    code.push_str("        } else {\n");
    code.push_str("            format!(\"FILTER {} \", clauses.join(\" AND \"))\n");
    code.push_str("        };\n");
    code.push_str("        let aql = format!(\"FOR doc IN @@collection {}LIMIT @offset, @limit RETURN doc\", filter);\n");
    code.push_str("        let docs = self.db.query(&aql, bind_vars)?;\n");
    code.push_str("        support::from_documents(docs)\n");
    code.push_str("    }\n\n");
    code
}

/// Renders the service artifact.
pub fn render_service(entity: &EntityDescriptor) -> String {
    let pascal = entity.pascal_name();
    let service = service_type(entity);
    let model_path = format!(
        "crate::models::{}",
        naming::rust_ident(&naming::model_module(&entity.entity_name))
    );

    let mut imports = Imports::default();
    for ty in [
        pascal.clone(),
        format!("{}Create", pascal),
        format!("{}DeleteResponse", pascal),
        format!("{}Update", pascal),
    ] {
        imports.add(&format!("{}::{}", model_path, ty));
    }
    imports.extend([
        "serde_json::json",
        "serde_json::Map",
        "serde_json::Value",
        "super::support::self",
        "super::support::Database",
        "super::support::ServiceError",
    ]);

    let mut code = file_header(&format!(
        "Data-access operations for the `{}` entity.",
        entity.entity_name
    ));
    code.push_str(&imports.render());

    code.push_str(&format!(
        "/// Data-access operations for `{}` records.\n",
        entity.collection_name()
    ));
    code.push_str("///\n");
    code.push_str("/// Borrows a database handle owned by the caller.\n");
    code.push_str(&format!(
        "pub struct {}<'a, D: Database + ?Sized> {{\n    db: &'a D,\n}}\n\n",
        service
    ));
    code.push_str(&format!(
        "impl<'a, D: Database + ?Sized> {}<'a, D> {{\n",
        service
    ));
    code.push_str(&constants(entity));
    code.push_str("    /// Wraps a caller-owned database handle.\n");
    code.push_str("    pub fn new(db: &'a D) -> Self {\n        Self { db }\n    }\n\n");

    code.push_str(&create_fn(entity));
    code.push_str(&LIST_FN.replace("{P}", &pascal));
    if !entity.search_fields.is_empty() {
        code.push_str(&search_fn(entity));
    }
    if let Some((from, to)) = entity.connected_entities() {
        code.push_str(
            &EDGE_FNS
                .replace("{P}", &pascal)
                .replace("{FROM}", from)
                .replace("{TO}", to),
        );
    }
    code.push_str(
        &SUPPORT_FNS
            .replace("{P}", &pascal)
            .replace("{EDGE}", if entity.is_edge() { "true" } else { "false" }),
    );
    if entity.is_edge() {
        code.push_str(NORMALIZE_HANDLES_FN);
    }
    code.push_str("}\n");
    code
}
