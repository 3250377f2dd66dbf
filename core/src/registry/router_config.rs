//! # Router Config
//!
//! `routes/entity_router.json` maps each entity name to its summary. Entries
//! for other entities, including fields this tool does not know about, are
//! kept exactly as found.

use crate::error::{AppError, AppResult};
use crate::fs_util::write_if_changed;
use crate::schema::EntityDescriptor;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Loads the router config; a missing file is empty and a corrupt one is reset.
pub fn load_router_config(path: &Path) -> AppResult<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let content = fs::read_to_string(path)?;
    let reason = match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => return Ok(map),
        Ok(other) => format!("expected an object, found {}", json_kind(&other)),
        Err(e) => e.to_string(),
    };
    let err = AppError::ConfigCorrupt {
        path: path.display().to_string(),
        reason,
    };
    warn!("{}; starting from an empty router config", err);
    Ok(Map::new())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Sets the entity's entry and writes the file if it changed.
pub fn merge_router_config(path: &Path, entity: &EntityDescriptor) -> AppResult<bool> {
    let mut config = load_router_config(path)?;
    config.insert(
        entity.entity_name.clone(),
        serde_json::to_value(entity.summary())?,
    );
    let mut content = serde_json::to_string_pretty(&Value::Object(config))?;
    content.push('\n');
    write_if_changed(path, &content).map_err(|e| AppError::registry_write(path, e))
}
