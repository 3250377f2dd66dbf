//! # Registry Documents
//!
//! A registry document is a Rust source file with two marker lines: one where
//! module declarations are added and one where per-entity entries are added.
//! Each document is held as lines plus the set of entry keys found in its body
//! region, so presence checks compare whole identifiers instead of substrings.

use indexmap::IndexSet;
use tracing::warn;

/// Result of one insertion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The line was added.
    Inserted,
    /// An equivalent line already existed.
    AlreadyPresent,
}

/// Static shape of one kind of registry document.
#[derive(Debug)]
pub struct RegistryLayout {
    /// Human-readable name for logs.
    pub name: &'static str,
    /// Content of a freshly created document.
    pub skeleton: &'static str,
    /// Module declarations are inserted before this line.
    pub import_marker: &'static str,
    /// Entries are inserted before this line.
    pub body_marker: &'static str,
    /// Line prefix opening the body region; the region otherwise starts after the import marker.
    pub body_opener: Option<&'static str>,
    /// Appended when the body marker (and its enclosing item) is missing.
    pub body_tail: &'static str,
}

/// `routes/mod.rs`
pub const ROUTER_REGISTRY: RegistryLayout = RegistryLayout {
    name: "router registry",
    skeleton: "// @generated by crudgen. Entries are added above the marker comments.

//! Entity route registry.

use crate::services::support::Database;
use actix_web::web;

// @crudgen:route-modules (do not remove)

/// Mounts every generated entity router.
pub fn configure<D: Database + 'static>(cfg: &mut web::ServiceConfig) {
    // @crudgen:route-configs (do not remove)
}
",
    import_marker: "// @crudgen:route-modules (do not remove)",
    body_marker: "// @crudgen:route-configs (do not remove)",
    body_opener: Some("pub fn configure"),
    body_tail: "
/// Mounts every generated entity router.
pub fn configure<D: Database + 'static>(cfg: &mut web::ServiceConfig) {
    // @crudgen:route-configs (do not remove)
}",
};

/// `models/mod.rs`
pub const MODEL_INDEX: RegistryLayout = RegistryLayout {
    name: "model index",
    skeleton: "// @generated by crudgen. Entries are added above the marker comments.

//! Generated data models.

// @crudgen:model-modules (do not remove)

// @crudgen:model-exports (do not remove)
",
    import_marker: "// @crudgen:model-modules (do not remove)",
    body_marker: "// @crudgen:model-exports (do not remove)",
    body_opener: None,
    body_tail: "
// @crudgen:model-exports (do not remove)",
};

/// `services/mod.rs`
pub const SERVICE_INDEX: RegistryLayout = RegistryLayout {
    name: "service index",
    skeleton: "// @generated by crudgen. Entries are added above the marker comments.

//! Generated data-access services.

pub mod support;
pub use support::{Database, DbError, ServiceError};
// @crudgen:service-modules (do not remove)

// @crudgen:service-exports (do not remove)
",
    import_marker: "// @crudgen:service-modules (do not remove)",
    body_marker: "// @crudgen:service-exports (do not remove)",
    body_opener: None,
    body_tail: "
// @crudgen:service-exports (do not remove)",
};

/// Leading identifier of a body line, with `use`/`mod` keywords and `r#` stripped.
///
/// e.g. `    team_routes::config::<D>(cfg);` -> `team_routes`,
/// `pub use r#match::{Match};` -> `match`.
pub fn entry_key(line: &str) -> Option<String> {
    let t = line.trim();
    if t.is_empty() || t.starts_with("//") {
        return None;
    }
    let t = ["pub use ", "use ", "pub mod ", "mod "]
        .iter()
        .find_map(|prefix| t.strip_prefix(prefix))
        .unwrap_or(t);
    let t = t.strip_prefix("r#").unwrap_or(t);
    let key: String = t
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    (!key.is_empty()).then_some(key)
}

fn indentation(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// An in-memory registry document.
#[derive(Debug, Clone)]
pub struct RegistryDocument {
    layout: &'static RegistryLayout,
    lines: Vec<String>,
}

impl RegistryDocument {
    /// A fresh document from the layout's skeleton.
    pub fn new(layout: &'static RegistryLayout) -> Self {
        Self::parse(layout, layout.skeleton)
    }

    /// Parses existing content, repairing missing markers.
    pub fn parse(layout: &'static RegistryLayout, text: &str) -> Self {
        let mut doc = Self {
            layout,
            lines: text.lines().map(str::to_string).collect(),
        };
        doc.repair();
        doc
    }

    fn find(&self, marker: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.trim() == marker)
    }

    fn repair(&mut self) {
        if self.find(self.layout.import_marker).is_none() {
            let at = self
                .lines
                .iter()
                .position(|l| l.starts_with("//!"))
                .map(|first| {
                    first
                        + self.lines[first..]
                            .iter()
                            .take_while(|l| l.starts_with("//!"))
                            .count()
                })
                .unwrap_or(0);
            let insert = if at == 0 {
                vec![self.layout.import_marker.to_string(), String::new()]
            } else {
                vec![String::new(), self.layout.import_marker.to_string()]
            };
            for (offset, line) in insert.into_iter().enumerate() {
                self.lines.insert(at + offset, line);
            }
            warn!("{} was missing its import marker; restored it", self.layout.name);
        }

        if self.find(self.layout.body_marker).is_none() {
            let opener = self.layout.body_opener.and_then(|prefix| {
                self.lines
                    .iter()
                    .position(|l| l.trim_start().starts_with(prefix))
            });
            let closing = opener.and_then(|start| {
                self.lines[start..]
                    .iter()
                    .position(|l| l == "}")
                    .map(|offset| start + offset)
            });
            match closing {
                Some(at) => self
                    .lines
                    .insert(at, format!("    {}", self.layout.body_marker)),
                None => {
                    while self.lines.last().is_some_and(|l| l.trim().is_empty()) {
                        self.lines.pop();
                    }
                    self.lines
                        .extend(self.layout.body_tail.lines().map(str::to_string));
                }
            }
            warn!("{} was missing its entry marker; restored it", self.layout.name);
        }
    }

    /// Line range of the body region (exclusive of the marker).
    fn body_region(&self) -> (usize, usize) {
        let end = self.find(self.layout.body_marker).unwrap_or(self.lines.len());
        let start = self
            .layout
            .body_opener
            .and_then(|prefix| {
                self.lines[..end]
                    .iter()
                    .position(|l| l.trim_start().starts_with(prefix))
            })
            .or_else(|| self.find(self.layout.import_marker))
            .map(|i| i + 1)
            .unwrap_or(0);
        (start.min(end), end)
    }

    /// Keys of the entries in the body region, in document order.
    pub fn entries(&self) -> IndexSet<String> {
        let (start, end) = self.body_region();
        self.lines[start..end]
            .iter()
            .filter_map(|l| entry_key(l))
            .collect()
    }

    /// Whether an identical (trimmed) line exists anywhere in the document.
    pub fn contains_line(&self, line: &str) -> bool {
        let needle = line.trim();
        self.lines.iter().any(|l| l.trim() == needle)
    }

    fn insert_before(&mut self, marker: &str, line: &str) {
        let at = self.find(marker).unwrap_or(self.lines.len());
        let indent = self
            .lines
            .get(at)
            .map(|l| indentation(l).to_string())
            .unwrap_or_default();
        self.lines.insert(at, format!("{}{}", indent, line.trim()));
    }

    /// Adds a module declaration unless the exact line exists.
    pub fn ensure_import(&mut self, line: &str) -> InsertOutcome {
        if self.contains_line(line) {
            return InsertOutcome::AlreadyPresent;
        }
        self.insert_before(self.layout.import_marker, line);
        InsertOutcome::Inserted
    }

    /// Adds an entry unless an entry with the same key exists in the body region.
    pub fn ensure_entry(&mut self, key: &str, line: &str) -> InsertOutcome {
        if self.entries().contains(key) {
            return InsertOutcome::AlreadyPresent;
        }
        self.insert_before(self.layout.body_marker, line);
        InsertOutcome::Inserted
    }

    /// Serialized document, newline-terminated.
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_entry_key() {
        assert_eq!(entry_key("    team_routes::config::<D>(cfg);").as_deref(), Some("team_routes"));
        assert_eq!(entry_key("pub use r#match::{Match, MatchBase};").as_deref(), Some("match"));
        assert_eq!(entry_key("    // @crudgen:route-configs (do not remove)"), None);
        assert_eq!(entry_key("}"), None);
    }

    #[test]
    fn test_router_registry_insertions() {
        let mut doc = RegistryDocument::new(&ROUTER_REGISTRY);
        assert_eq!(doc.ensure_import("pub mod team_routes;"), InsertOutcome::Inserted);
        assert_eq!(
            doc.ensure_entry("team_routes", "team_routes::config::<D>(cfg);"),
            InsertOutcome::Inserted
        );
        let text = doc.render();
        assert!(text.contains("pub mod team_routes;\n// @crudgen:route-modules (do not remove)\n"));
        assert!(text.contains(
            "{\n    team_routes::config::<D>(cfg);\n    // @crudgen:route-configs (do not remove)\n}\n"
        ));

        let mut again = RegistryDocument::parse(&ROUTER_REGISTRY, &text);
        assert_eq!(again.ensure_import("pub mod team_routes;"), InsertOutcome::AlreadyPresent);
        assert_eq!(
            again.ensure_entry("team_routes", "team_routes::config::<D>(cfg);"),
            InsertOutcome::AlreadyPresent
        );
        assert_eq!(again.render(), text);
    }

    #[test]
    fn test_substring_names_do_not_shadow() {
        let mut doc = RegistryDocument::new(&ROUTER_REGISTRY);
        doc.ensure_import("pub mod team_match_routes;");
        doc.ensure_entry("team_match_routes", "team_match_routes::config::<D>(cfg);");

        assert_eq!(doc.ensure_import("pub mod match_routes;"), InsertOutcome::Inserted);
        assert_eq!(
            doc.ensure_entry("match_routes", "match_routes::config::<D>(cfg);"),
            InsertOutcome::Inserted
        );
        let keys: Vec<String> = doc.entries().into_iter().collect();
        assert_eq!(keys, vec!["team_match_routes", "match_routes"]);
    }

    #[test]
    fn test_imports_are_not_counted_as_entries() {
        let mut doc = RegistryDocument::new(&MODEL_INDEX);
        doc.ensure_import("pub mod team;");
        assert!(doc.entries().is_empty());
        assert_eq!(
            doc.ensure_entry("team", "pub use team::{Team};"),
            InsertOutcome::Inserted
        );
        assert_eq!(
            doc.render(),
            "// @generated by crudgen. Entries are added above the marker comments.\n\n//! Generated data models.\n\npub mod team;\n// @crudgen:model-modules (do not remove)\n\npub use team::{Team};\n// @crudgen:model-exports (do not remove)\n"
        );
    }

    #[test]
    fn test_user_content_is_preserved() {
        let text = "//! Routes.\n\nuse crate::services::support::Database;\nuse actix_web::web;\n\nmod health;\n// @crudgen:route-modules (do not remove)\n\npub fn configure<D: Database + 'static>(cfg: &mut web::ServiceConfig) {\n    health::config(cfg);\n    // @crudgen:route-configs (do not remove)\n}\n";
        let mut doc = RegistryDocument::parse(&ROUTER_REGISTRY, text);
        doc.ensure_entry("team_routes", "team_routes::config::<D>(cfg);");
        let out = doc.render();
        assert!(out.starts_with("//! Routes.\n\nuse crate::services::support::Database;\nuse actix_web::web;\n\nmod health;\n"));
        assert!(out.contains("    health::config(cfg);\n    team_routes::config::<D>(cfg);\n"));
    }

    #[test]
    fn test_missing_markers_are_repaired() {
        let text = "//! Routes.\n\npub fn configure<D: Database + 'static>(cfg: &mut web::ServiceConfig) {\n    health::config(cfg);\n}\n";
        let mut doc = RegistryDocument::parse(&ROUTER_REGISTRY, text);
        doc.ensure_import("pub mod team_routes;");
        doc.ensure_entry("team_routes", "team_routes::config::<D>(cfg);");
        assert_eq!(
            doc.render(),
            "//! Routes.\n\npub mod team_routes;\n// @crudgen:route-modules (do not remove)\n\npub fn configure<D: Database + 'static>(cfg: &mut web::ServiceConfig) {\n    health::config(cfg);\n    team_routes::config::<D>(cfg);\n    // @crudgen:route-configs (do not remove)\n}\n"
        );
    }

    #[test]
    fn test_missing_body_tail_is_appended() {
        let mut doc = RegistryDocument::parse(&SERVICE_INDEX, "pub mod support;\n\n");
        doc.ensure_entry("team_service", "pub use team_service::TeamService;");
        assert_eq!(
            doc.render(),
            "// @crudgen:service-modules (do not remove)\n\npub mod support;\n\npub use team_service::TeamService;\n// @crudgen:service-exports (do not remove)\n"
        );
    }
}
