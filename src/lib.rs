//! Code-graph analysis engine with an MCP server front end.
//!
//! Walks a project tree, filters it through layered glob include/exclude
//! patterns, parses supported languages with tree-sitter, extracts
//! symbols and imports into an in-memory graph, resolves import edges,
//! enriches the graph with git-history semantic neighborhoods, and
//! exposes the result through eight MCP tools over stdio.

/// Project configuration stored under `.codecontext/`.
pub mod config;

/// Error types used across the crate.
pub mod errors;

/// In-memory code graph, builder, and import-edge resolver.
pub mod graph;

/// Path normalization and layered glob pattern matching.
pub mod matcher;

/// MCP server, tools, and JSON-RPC transport.
pub mod mcp;

/// Language classification and tree-sitter symbol extraction.
pub mod parser;

/// Git-history semantic neighborhoods and clustering.
pub mod semantic;

/// Core data types: symbols, files, nodes, edges, metadata.
pub mod types;

/// Filesystem watcher lifecycle.
pub mod watcher;

pub use errors::{AnalyzerError, Result};
pub use graph::{GraphBuilder, GraphStore};
