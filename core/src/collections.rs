#![deny(missing_docs)]

//! # Collection Configuration
//!
//! Maintains `collections.json`, the document the database bootstrap reads to
//! create document collections, edge collections and graph edge definitions.
//!
//! The document only ever grows: syncing an entity adds what is missing and
//! leaves every existing entry untouched.

use crate::error::{AppError, AppResult};
use crate::schema::EntityDescriptor;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// One graph edge definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Edge collection name; unique within the config.
    pub edge_collection: String,
    /// Vertex collections edges start from.
    pub from_collections: Vec<String>,
    /// Vertex collections edges point to.
    pub to_collections: Vec<String>,
}

/// The collection configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Document collection names.
    #[serde(default)]
    pub document_collections: IndexSet<String>,
    /// Edge collection names.
    #[serde(default)]
    pub edge_collections: IndexSet<String>,
    /// Graph edge definitions keyed by `edge_collection`.
    #[serde(default)]
    pub graph_edges: Vec<GraphEdge>,
}

/// What a sync changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// The collection name was newly added.
    pub collection_added: bool,
    /// A graph edge definition was newly added.
    pub edge_added: bool,
}

impl SyncOutcome {
    /// Whether anything changed.
    pub fn changed(&self) -> bool {
        self.collection_added || self.edge_added
    }
}

impl CollectionConfig {
    /// Loads the config, falling back to an empty one when missing or corrupt.
    ///
    /// A corrupt file is reported as a warning and replaced on the next save.
    pub fn load_or_default(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                let err = AppError::ConfigCorrupt {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                };
                warn!("{}; using defaults", err);
                Ok(Self::default())
            }
        }
    }

    /// Adds the entity's collection and, for edges, its graph edge definition.
    pub fn sync(&mut self, entity: &EntityDescriptor) -> SyncOutcome {
        let name = entity.collection_name();
        let mut outcome = SyncOutcome::default();

        match entity.connected_entities() {
            Some((from, to)) => {
                outcome.collection_added = self.edge_collections.insert(name.clone());
                if !self.has_graph_edge(&name) {
                    self.graph_edges.push(GraphEdge {
                        edge_collection: name,
                        from_collections: vec![crate::naming::collection_name(from)],
                        to_collections: vec![crate::naming::collection_name(to)],
                    });
                    outcome.edge_added = true;
                }
            }
            None => {
                outcome.collection_added = self.document_collections.insert(name);
            }
        }

        outcome
    }

    /// Whether a graph edge definition exists for the edge collection.
    pub fn has_graph_edge(&self, edge_collection: &str) -> bool {
        self.graph_edges
            .iter()
            .any(|e| e.edge_collection == edge_collection)
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> AppResult<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// Writes the config if its serialized form differs from what is on disk.
    pub fn save(&self, path: &Path) -> AppResult<bool> {
        let content = self.to_json()?;
        crate::fs_util::write_if_changed(path, &content)
            .map_err(|e| AppError::registry_write(path, e))
    }
}

/// Loads, syncs and saves the collection config for one entity.
pub fn sync_collection_config(path: &Path, entity: &EntityDescriptor) -> AppResult<SyncOutcome> {
    let mut config = CollectionConfig::load_or_default(path)?;
    let outcome = config.sync(entity);
    config.save(path)?;

    if outcome.changed() {
        info!(
            collection = %entity.collection_name(),
            edge = entity.is_edge(),
            "Updated collection configuration in {}",
            path.display()
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntityKind, EntityDescriptor};
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn entity(name: &str, kind: EntityKind) -> EntityDescriptor {
        EntityDescriptor {
            entity_name: name.into(),
            title: name.into(),
            description: String::new(),
            properties: IndexMap::new(),
            kind,
            unique_combinations: vec![],
            search_fields: vec![],
            deletion_constraints: vec![],
            custom_endpoints: vec![],
            defaults: IndexMap::new(),
        }
    }

    fn team_match() -> EntityDescriptor {
        entity(
            "team_match",
            EntityKind::Edge {
                from: "team".into(),
                to: "match".into(),
            },
        )
    }

    #[test]
    fn test_sync_twice_keeps_one_entry() {
        let mut config = CollectionConfig::default();
        let team = entity("team", EntityKind::Document);

        assert!(config.sync(&team).collection_added);
        assert!(!config.sync(&team).changed());
        assert_eq!(config.document_collections.len(), 1);
    }

    #[test]
    fn test_edge_sync_adds_graph_edge_once() {
        let mut config = CollectionConfig::default();
        let edge = team_match();

        let first = config.sync(&edge);
        assert!(first.collection_added && first.edge_added);
        assert!(!config.sync(&edge).changed());

        assert_eq!(config.edge_collections.len(), 1);
        assert_eq!(
            config.graph_edges,
            vec![GraphEdge {
                edge_collection: "team_match".into(),
                from_collections: vec!["team".into()],
                to_collections: vec!["match".into()],
            }]
        );
        assert!(config.document_collections.is_empty());
    }

    #[test]
    fn test_existing_graph_edge_is_kept() {
        let mut config = CollectionConfig::default();
        config.graph_edges.push(GraphEdge {
            edge_collection: "team_match".into(),
            from_collections: vec!["club".into()],
            to_collections: vec!["fixture".into()],
        });

        let outcome = config.sync(&team_match());
        assert!(!outcome.edge_added);
        assert_eq!(config.graph_edges[0].from_collections, vec!["club"]);
    }

    #[test]
    fn test_corrupt_file_resets_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("collections.json");
        fs::write(&path, "{ not json").unwrap();

        let outcome = sync_collection_config(&path, &entity("team", EntityKind::Document)).unwrap();
        assert!(outcome.collection_added);

        let reloaded = CollectionConfig::load_or_default(&path).unwrap();
        assert_eq!(reloaded.document_collections.len(), 1);
    }

    #[test]
    fn test_round_trip_layout() {
        let mut config = CollectionConfig::default();
        config.sync(&entity("team", EntityKind::Document));
        let json = config.to_json().unwrap();
        assert_eq!(
            json,
            "{\n  \"document_collections\": [\n    \"team\"\n  ],\n  \"edge_collections\": [],\n  \"graph_edges\": []\n}\n"
        );
    }

    #[test]
    fn test_save_is_skipped_when_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config").join("collections.json");
        let team = entity("team", EntityKind::Document);

        sync_collection_config(&path, &team).unwrap();
        let mut config = CollectionConfig::load_or_default(&path).unwrap();
        config.sync(&team);
        assert!(!config.save(&path).unwrap());
    }
}
