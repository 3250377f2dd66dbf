//! # Service Support
//!
//! Emits `services/support.rs`: the database contract generated services are
//! written against, their error type and a few document helpers. The host
//! application implements `Database` for its driver and owns the handle.

use crate::render::file_header;

const SUPPORT_BODY: &str = r#"use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;

/// Page size used when a list request does not set `limit`.
pub const DEFAULT_LIMIT: u64 = 100;

/// Error reported by a database driver.
#[derive(Debug, Clone)]
pub struct DbError(pub String);

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for DbError {}

/// Document database operations generated services rely on.
///
/// Queries are AQL with bind variables; `@@collection` binds a collection name.
pub trait Database {
    /// Whether the collection exists.
    fn has_collection(&self, name: &str) -> Result<bool, DbError>;
    /// Creates a document (`edge == false`) or edge collection.
    fn create_collection(&self, name: &str, edge: bool) -> Result<(), DbError>;
    /// Inserts a document and returns it with `_key`, `_id` and `_rev` set.
    fn insert(&self, collection: &str, document: Value) -> Result<Value, DbError>;
    /// Fetches a document by key.
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, DbError>;
    /// Replaces a document and returns the stored version.
    fn replace(&self, collection: &str, key: &str, document: Value) -> Result<Value, DbError>;
    /// Removes a document. Returns whether it existed.
    fn remove(&self, collection: &str, key: &str) -> Result<bool, DbError>;
    /// Runs a query and returns every result row.
    fn query(&self, aql: &str, bind_vars: Map<String, Value>) -> Result<Vec<Value>, DbError>;
    /// Names of the indexes defined on a collection.
    fn index_names(&self, collection: &str) -> Result<Vec<String>, DbError>;
    /// Creates a named unique persistent index over `fields`.
    fn create_unique_index(&self, collection: &str, name: &str, fields: &[&str]) -> Result<(), DbError>;
}

/// Errors returned by generated services and handlers.
#[derive(Debug)]
pub enum ServiceError {
    /// The addressed record does not exist (404).
    NotFound(String),
    /// A uniqueness or deletion constraint was violated (409).
    Conflict(String),
    /// Driver or serialization failure (500).
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotFound(msg) | ServiceError::Conflict(msg) => write!(f, "{}", msg),
            ServiceError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        ServiceError::Internal(e.0)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Internal(e.to_string())
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "detail": self.to_string() }))
    }
}

/// Creates the collection on first use.
pub fn ensure_collection<D: Database + ?Sized>(db: &D, name: &str, edge: bool) -> Result<(), ServiceError> {
    if !db.has_collection(name)? {
        db.create_collection(name, edge)?;
    }
    Ok(())
}

/// Serializes a payload into a JSON object.
pub fn to_document<T: Serialize>(value: &T) -> Result<Map<String, Value>, ServiceError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(ServiceError::Internal(format!("expected an object, got {}", other))),
    }
}

/// Unwraps a stored document into its fields.
pub fn into_object(value: Value) -> Result<Map<String, Value>, ServiceError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ServiceError::Internal(format!("expected an object, got {}", other))),
    }
}

/// Deserializes one stored document.
pub fn from_document<T: DeserializeOwned>(value: Value) -> Result<T, ServiceError> {
    Ok(serde_json::from_value(value)?)
}

/// Deserializes a list of stored documents.
pub fn from_documents<T: DeserializeOwned>(values: Vec<Value>) -> Result<Vec<T>, ServiceError> {
    values.into_iter().map(from_document).collect()
}

/// Sets `field` to `value` when it is absent or null.
pub fn apply_default(doc: &mut Map<String, Value>, field: &str, value: Value) {
    if doc.get(field).map_or(true, Value::is_null) {
        doc.insert(field.to_string(), value);
    }
}

/// Current time as stored in `created_at` / `updated_at`.
pub fn now() -> Value {
    json!(chrono::Utc::now())
}

/// Full document handle: bare keys are prefixed with `collection/`.
pub fn document_handle(collection: &str, key_or_handle: &str) -> String {
    if key_or_handle.contains('/') {
        key_or_handle.to_string()
    } else {
        format!("{}/{}", collection, key_or_handle)
    }
}

/// Bind variables shared by paginated queries.
pub fn page_bind_vars(collection: &str, limit: Option<u64>, offset: Option<u64>) -> Map<String, Value> {
    let mut bind_vars = Map::new();
    bind_vars.insert("@collection".to_string(), json!(collection));
    bind_vars.insert("limit".to_string(), json!(limit.unwrap_or(DEFAULT_LIMIT)));
    bind_vars.insert("offset".to_string(), json!(offset.unwrap_or(0)));
    bind_vars
}

/// Case-insensitive substring pattern for `LIKE`, with wildcards in `value` escaped.
pub fn like_pattern(value: &Value) -> Value {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    json!(format!("%{}%", escaped))
}
"#;

/// Renders the shared support module.
pub fn render_support() -> String {
    let mut code = file_header("Database contract and helpers shared by generated services.");
    code.push_str(SUPPORT_BODY);
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::verify_syntax;

    #[test]
    fn test_support_parses() {
        let code = render_support();
        verify_syntax("support.rs", &code).unwrap();
        assert!(code.contains("pub trait Database {"));
        assert!(code.contains("impl ResponseError for ServiceError"));
    }
}
