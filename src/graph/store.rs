//! In-memory code graph produced by one analyze run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Edge, FileInfo, GraphMetadata, Node, Symbol};

/// The code graph: files, symbols, generic nodes, typed edges, metadata.
///
/// A store is created empty at the start of `analyze`, mutated by exactly
/// one builder, and fully populated before `analyze` returns. It is then
/// published as an immutable snapshot; the next analyze replaces it rather
/// than mutating it.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GraphStore {
    nodes: HashMap<String, Node>,
    edges: HashMap<String, Edge>,
    files: HashMap<String, FileInfo>,
    symbols: HashMap<String, Symbol>,
    metadata: GraphMetadata,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Builder-only inserters
    // ------------------------------------------------------------------

    pub(crate) fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub(crate) fn insert_edge(&mut self, edge: Edge) {
        self.edges.insert(edge.id.clone(), edge);
    }

    pub(crate) fn insert_file(&mut self, file: FileInfo) {
        self.files.insert(file.path.clone(), file);
    }

    pub(crate) fn insert_symbol(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol.id.clone(), symbol);
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut GraphMetadata {
        &mut self.metadata
    }

    // ------------------------------------------------------------------
    // Typed getters
    // ------------------------------------------------------------------

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn file(&self, path: &str) -> Option<&FileInfo> {
        self.files.get(path)
    }

    pub fn symbol(&self, id: &str) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn files(&self) -> impl Iterator<Item = &FileInfo> {
        self.files.values()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    /// File paths in sorted order, for deterministic output.
    pub fn file_paths_sorted(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.files.keys().map(|p| p.as_str()).collect();
        paths.sort_unstable();
        paths
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Symbols whose name contains the query, case-insensitive.
    pub fn symbols_matching(&self, query: &str) -> Vec<&Symbol> {
        let needle = query.to_lowercase();
        let mut hits: Vec<&Symbol> = self
            .symbols
            .values()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .collect();
        hits.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.location.start_line.cmp(&b.location.start_line))
        });
        hits
    }

    /// Edges originating at the given node id.
    pub fn edges_from(&self, node_id: &str) -> Vec<&Edge> {
        let mut out: Vec<&Edge> = self.edges.values().filter(|e| e.from == node_id).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Edges terminating at the given node id.
    pub fn edges_to(&self, node_id: &str) -> Vec<&Edge> {
        let mut out: Vec<&Edge> = self.edges.values().filter(|e| e.to == node_id).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}
