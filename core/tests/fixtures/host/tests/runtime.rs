//! Drives the generated `team` service against an in-memory database.

use crudgen_host::models::{Team, TeamCreate};
use crudgen_host::services::{Database, DbError, ServiceError, TeamService};
use serde_json::{json, Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

#[derive(Default)]
struct MemoryDb {
    collections: RefCell<BTreeMap<String, Vec<Value>>>,
    indexes: RefCell<Vec<String>>,
    next_key: Cell<u64>,
}

fn key_of(doc: &Value) -> Option<&str> {
    doc.get("_key").and_then(Value::as_str)
}

impl Database for MemoryDb {
    fn has_collection(&self, name: &str) -> Result<bool, DbError> {
        Ok(self.collections.borrow().contains_key(name))
    }

    fn create_collection(&self, name: &str, _edge: bool) -> Result<(), DbError> {
        self.collections.borrow_mut().entry(name.to_string()).or_default();
        Ok(())
    }

    fn insert(&self, collection: &str, mut document: Value) -> Result<Value, DbError> {
        let key = self.next_key.get() + 1;
        self.next_key.set(key);
        let obj = document
            .as_object_mut()
            .ok_or_else(|| DbError("not an object".into()))?;
        obj.insert("_key".into(), json!(key.to_string()));
        obj.insert("_id".into(), json!(format!("{}/{}", collection, key)));
        obj.insert("_rev".into(), json!("1"));
        self.collections
            .borrow_mut()
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, DbError> {
        Ok(self
            .collections
            .borrow()
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| key_of(d) == Some(key)).cloned()))
    }

    fn replace(&self, collection: &str, key: &str, document: Value) -> Result<Value, DbError> {
        let mut collections = self.collections.borrow_mut();
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| DbError(format!("no collection {}", collection)))?;
        let slot = docs
            .iter_mut()
            .find(|d| key_of(d) == Some(key))
            .ok_or_else(|| DbError(format!("no document {}", key)))?;
        *slot = document.clone();
        Ok(document)
    }

    fn remove(&self, collection: &str, key: &str) -> Result<bool, DbError> {
        let mut collections = self.collections.borrow_mut();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| key_of(d) != Some(key));
        Ok(docs.len() != before)
    }

    // Understands the equality filters and `@exclude` the generated queries use.
    fn query(&self, aql: &str, bind_vars: Map<String, Value>) -> Result<Vec<Value>, DbError> {
        let collection = bind_vars
            .get("@collection")
            .and_then(Value::as_str)
            .ok_or_else(|| DbError("missing @@collection".into()))?;
        let filters: Vec<(String, Value)> = aql
            .split("doc.`")
            .skip(1)
            .filter_map(|rest| {
                let (field, tail) = rest.split_once("` == @")?;
                let var: String = tail
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                    .collect();
                Some((field.to_string(), bind_vars.get(&var)?.clone()))
            })
            .collect();
        let exclude = bind_vars.get("exclude").and_then(Value::as_str);
        let docs = self
            .collections
            .borrow()
            .get(collection)
            .cloned()
            .unwrap_or_default();
        Ok(docs
            .into_iter()
            .filter(|d| filters.iter().all(|(f, v)| d.get(f) == Some(v)))
            .filter(|d| exclude.is_none() || key_of(d) != exclude)
            .collect())
    }

    fn index_names(&self, _collection: &str) -> Result<Vec<String>, DbError> {
        Ok(self.indexes.borrow().clone())
    }

    fn create_unique_index(&self, _collection: &str, name: &str, _fields: &[&str]) -> Result<(), DbError> {
        self.indexes.borrow_mut().push(name.to_string());
        Ok(())
    }
}

fn payload(name: &str) -> TeamCreate {
    serde_json::from_value(json!({"name": name, "league_id": "l1", "season": 2024})).unwrap()
}

#[test]
fn create_payload_requires_required_fields() {
    let missing_name = serde_json::from_value::<TeamCreate>(json!({"league_id": "l1", "season": 2024}));
    assert!(missing_name.is_err());

    let without_optional = serde_json::from_value::<TeamCreate>(
        json!({"name": "Lions", "league_id": "l1", "season": 2024}),
    );
    assert!(without_optional.is_ok());
}

#[test]
fn create_builds_the_unique_index_once() {
    let db = MemoryDb::default();
    let service = TeamService::new(&db);

    let created: Team = service.create(payload("Lions")).unwrap();
    assert_eq!(created.name, "Lions");
    assert_eq!(*db.indexes.borrow(), vec!["league_id_season_unique".to_string()]);

    service.ensure_indexes().unwrap();
    assert_eq!(db.indexes.borrow().len(), 1);
}

#[test]
fn duplicate_combination_is_a_conflict() {
    let db = MemoryDb::default();
    let service = TeamService::new(&db);

    service.create(payload("Lions")).unwrap();
    let err = service.create(payload("Tigers")).unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)), "{}", err);
}

#[test]
fn missing_record_is_not_found() {
    let db = MemoryDb::default();
    let service = TeamService::new(&db);
    assert!(matches!(service.get("404"), Err(ServiceError::NotFound(_))));
    assert!(matches!(service.delete("404"), Err(ServiceError::NotFound(_))));
}
