//! Resolves import records to file nodes and creates `imports` edges.
//!
//! Runs after all files are parsed so cross-references are known. Only
//! relative imports are resolved; package and absolute imports are
//! omitted so that every edge endpoint resolves in the graph.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::matcher::{clean_path, PathMatcher};
use crate::types::{file_node_id, Edge, EdgeKind, ImportRecord};

use super::store::GraphStore;

/// Candidate extensions tried after an exact match, in order.
const CANDIDATE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

pub struct RelationshipResolver {
    matcher: Arc<PathMatcher>,
}

impl RelationshipResolver {
    pub fn new(matcher: Arc<PathMatcher>) -> Self {
        Self { matcher }
    }

    /// Resolves every file's imports, inserting edges and recording
    /// relationship metrics under configuration key `relationship_metrics`.
    pub fn resolve(&self, store: &mut GraphStore) {
        let mut edges: Vec<Edge> = Vec::new();
        let mut total_imports = 0usize;
        let mut unresolved = 0usize;
        let mut rejected = 0usize;

        for path in store.file_paths_sorted() {
            let Some(file) = store.file(path) else {
                continue;
            };
            let from_path = file.path.clone();
            for import in &file.imports {
                total_imports += 1;
                match self.resolve_target(store, &from_path, import) {
                    ResolveOutcome::Resolved(to_path) => {
                        edges.push(make_edge(&from_path, &to_path, import));
                    }
                    ResolveOutcome::Unresolved => unresolved += 1,
                    ResolveOutcome::Rejected => rejected += 1,
                }
            }
        }

        let resolved = edges.len();
        for edge in edges {
            store.insert_edge(edge);
        }

        let metrics = self.relationship_metrics(store, total_imports, resolved, unresolved, rejected);
        store
            .metadata_mut()
            .configuration
            .insert("relationship_metrics".to_string(), metrics);
    }

    fn resolve_target(
        &self,
        store: &GraphStore,
        from_path: &str,
        import: &ImportRecord,
    ) -> ResolveOutcome {
        // Package and absolute imports stay out of the graph.
        if !import.path.starts_with("./") && !import.path.starts_with("../") {
            return ResolveOutcome::Unresolved;
        }

        let base_dir = match from_path.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => ".",
        };

        if let Err(e) = self.matcher.validate_import(&import.path, base_dir) {
            debug!(import = %import.path, error = %e, "import rejected by traversal validation");
            return ResolveOutcome::Rejected;
        }

        let joined = clean_path(&format!("{}/{}", base_dir, import.path));

        // Exact hit first.
        if store.file(&joined).is_some() {
            return ResolveOutcome::Resolved(joined);
        }
        // Candidate extensions in order.
        for ext in CANDIDATE_EXTENSIONS {
            let candidate = format!("{}.{}", joined, ext);
            if store.file(&candidate).is_some() {
                return ResolveOutcome::Resolved(candidate);
            }
        }
        // Directory index files.
        for ext in CANDIDATE_EXTENSIONS {
            let candidate = format!("{}/index.{}", joined, ext);
            if store.file(&candidate).is_some() {
                return ResolveOutcome::Resolved(candidate);
            }
        }

        ResolveOutcome::Unresolved
    }

    fn relationship_metrics(
        &self,
        store: &GraphStore,
        total_imports: usize,
        resolved: usize,
        unresolved: usize,
        rejected: usize,
    ) -> serde_json::Value {
        let mut fan_out: HashMap<&str, usize> = HashMap::new();
        let mut fan_in: HashMap<&str, usize> = HashMap::new();
        for edge in store.edges() {
            if edge.kind == EdgeKind::Imports {
                *fan_out.entry(edge.from.as_str()).or_insert(0) += 1;
                *fan_in.entry(edge.to.as_str()).or_insert(0) += 1;
            }
        }

        let max_fan_out = fan_out.values().copied().max().unwrap_or(0);
        let max_fan_in = fan_in.values().copied().max().unwrap_or(0);
        let files = store.file_count().max(1);

        json!({
            "total_imports": total_imports,
            "resolved_edges": resolved,
            "unresolved_imports": unresolved,
            "rejected_imports": rejected,
            "max_fan_out": max_fan_out,
            "max_fan_in": max_fan_in,
            "avg_fan_out": resolved as f64 / files as f64,
        })
    }
}

enum ResolveOutcome {
    Resolved(String),
    Unresolved,
    Rejected,
}

fn make_edge(from_path: &str, to_path: &str, import: &ImportRecord) -> Edge {
    let mut metadata = HashMap::new();
    metadata.insert("import_path".to_string(), json!(import.path));
    metadata.insert("specifiers".to_string(), json!(import.specifiers));
    metadata.insert("is_default".to_string(), json!(import.is_default));

    Edge {
        id: format!("import-{}-{}", from_path, to_path),
        from: file_node_id(from_path),
        to: file_node_id(to_path),
        kind: EdgeKind::Imports,
        weight: 1.0,
        metadata,
    }
}
