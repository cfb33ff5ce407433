use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Kinds of symbols extracted from source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Class,
    Method,
    Variable,
    Constant,
    Interface,
    TypeAlias,
    Struct,
    Enum,
    Trait,
    Module,
    Property,
    Import,
    Namespace,
}

#[allow(clippy::should_implement_trait)]
impl SymbolKind {
    /// Returns the string representation of this symbol kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Interface => "interface",
            SymbolKind::TypeAlias => "type_alias",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::Trait => "trait",
            SymbolKind::Module => "module",
            SymbolKind::Property => "property",
            SymbolKind::Import => "import",
            SymbolKind::Namespace => "namespace",
        }
    }

    /// Parses a string into a `SymbolKind`, returning `None` for unrecognized values.
    pub fn from_str(s: &str) -> Option<SymbolKind> {
        match s {
            "function" => Some(SymbolKind::Function),
            "class" => Some(SymbolKind::Class),
            "method" => Some(SymbolKind::Method),
            "variable" => Some(SymbolKind::Variable),
            "constant" => Some(SymbolKind::Constant),
            "interface" => Some(SymbolKind::Interface),
            "type_alias" => Some(SymbolKind::TypeAlias),
            "struct" => Some(SymbolKind::Struct),
            "enum" => Some(SymbolKind::Enum),
            "trait" => Some(SymbolKind::Trait),
            "module" => Some(SymbolKind::Module),
            "property" => Some(SymbolKind::Property),
            "import" => Some(SymbolKind::Import),
            "namespace" => Some(SymbolKind::Namespace),
            _ => None,
        }
    }
}

/// Framework-specific sub-type of a symbol, orthogonal to its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameworkKind {
    Component,
    Hook,
    Service,
    Store,
    Route,
    Middleware,
    Action,
    Computed,
    Watcher,
    Lifecycle,
    Directive,
    Widget,
    Mixin,
    Extension,
    Enum,
    Typedef,
    BuildMethod,
    StateClass,
}

#[allow(clippy::should_implement_trait)]
impl FrameworkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameworkKind::Component => "component",
            FrameworkKind::Hook => "hook",
            FrameworkKind::Service => "service",
            FrameworkKind::Store => "store",
            FrameworkKind::Route => "route",
            FrameworkKind::Middleware => "middleware",
            FrameworkKind::Action => "action",
            FrameworkKind::Computed => "computed",
            FrameworkKind::Watcher => "watcher",
            FrameworkKind::Lifecycle => "lifecycle",
            FrameworkKind::Directive => "directive",
            FrameworkKind::Widget => "widget",
            FrameworkKind::Mixin => "mixin",
            FrameworkKind::Extension => "extension",
            FrameworkKind::Enum => "enum",
            FrameworkKind::Typedef => "typedef",
            FrameworkKind::BuildMethod => "build_method",
            FrameworkKind::StateClass => "state_class",
        }
    }

    pub fn from_str(s: &str) -> Option<FrameworkKind> {
        match s {
            "component" => Some(FrameworkKind::Component),
            "hook" => Some(FrameworkKind::Hook),
            "service" => Some(FrameworkKind::Service),
            "store" => Some(FrameworkKind::Store),
            "route" => Some(FrameworkKind::Route),
            "middleware" => Some(FrameworkKind::Middleware),
            "action" => Some(FrameworkKind::Action),
            "computed" => Some(FrameworkKind::Computed),
            "watcher" => Some(FrameworkKind::Watcher),
            "lifecycle" => Some(FrameworkKind::Lifecycle),
            "directive" => Some(FrameworkKind::Directive),
            "widget" => Some(FrameworkKind::Widget),
            "mixin" => Some(FrameworkKind::Mixin),
            "extension" => Some(FrameworkKind::Extension),
            "enum" => Some(FrameworkKind::Enum),
            "typedef" => Some(FrameworkKind::Typedef),
            "build_method" => Some(FrameworkKind::BuildMethod),
            "state_class" => Some(FrameworkKind::StateClass),
            _ => None,
        }
    }
}

/// Kinds of nodes in the code graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Symbol,
    Synthetic,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Symbol => "symbol",
            NodeKind::Synthetic => "synthetic",
        }
    }
}

/// Kinds of edges in the code graph.
///
/// `Imports` is the only kind the builder itself produces; the resolver
/// may add others in the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Imports,
    Contains,
    References,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Imports => "imports",
            EdgeKind::Contains => "contains",
            EdgeKind::References => "references",
        }
    }
}

/// Source location of a symbol, zero-based lines and columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub start_line: u32,
    pub end_line: u32,
    pub start_col: u32,
    pub end_col: u32,
}

/// Parse quality reported by a language parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseQuality {
    /// Full AST with no error nodes.
    Complete,
    /// AST contained error nodes; recoverable symbols were still extracted.
    Partial,
    /// Line-level extraction without a grammar (JSON, YAML, Markdown).
    Basic,
}

impl ParseQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseQuality::Complete => "complete",
            ParseQuality::Partial => "partial",
            ParseQuality::Basic => "basic",
        }
    }
}

/// A symbol extracted from a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: String,
    pub name: String,
    pub kind: SymbolKind,
    pub framework_kind: Option<FrameworkKind>,
    pub fully_qualified_name: String,
    pub signature: Option<String>,
    pub documentation: Option<String>,
    pub language: String,
    pub location: Location,
}

/// A single import statement found in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// Raw import path string as written in the source.
    pub path: String,
    /// Imported specifiers, if any.
    pub specifiers: Vec<String>,
    /// Whether the import binds a default export.
    pub is_default: bool,
}

/// Per-file record in the code graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Normalized path, the key in the file mapping.
    pub path: String,
    pub language: String,
    pub size: u64,
    pub lines: u32,
    pub is_test: bool,
    pub is_generated: bool,
    pub last_modified: i64,
    /// Ordered ids of symbols contained in this file.
    pub symbols: Vec<String>,
    /// Ordered import records found in this file.
    pub imports: Vec<ImportRecord>,
    /// Messages for recoverable parse errors; the file stays in the graph.
    pub parse_errors: Vec<String>,
    pub quality: ParseQuality,
}

/// A polymorphic vertex in the code graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub file_path: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A typed edge between two graph nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    pub weight: f64,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Metadata describing one analyze run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphMetadata {
    /// UNIX timestamp (seconds) of when the graph was generated.
    pub generated: i64,
    pub version: String,
    pub total_files: usize,
    pub total_symbols: usize,
    /// Language name -> file count.
    pub languages: HashMap<String, usize>,
    /// Analysis duration in milliseconds.
    pub analysis_time_ms: u64,
    /// Free-form configuration mapping; holds `relationship_metrics` and
    /// `semantic_neighborhoods` after a build.
    pub configuration: HashMap<String, serde_json::Value>,
}

/// Generates a deterministic symbol ID from file path, kind, name, and
/// start position.
///
/// The ID format is `"kind-16hexchars"` where the hex portion is the first
/// 16 characters of the SHA-256 hash of the input components. Re-parsing
/// the same file regenerates identical ids for identical content.
pub fn generate_symbol_id(
    file_path: &str,
    kind: SymbolKind,
    name: &str,
    location: &Location,
) -> String {
    let input = format!(
        "{}:{}:{}:{}:{}",
        file_path,
        kind.as_str(),
        name,
        location.start_line,
        location.start_col
    );
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let hash = hasher.finalize();
    let hex_str = hex::encode(hash);
    format!("{}-{}", kind.as_str(), &hex_str[..16])
}

/// Node id for a file vertex.
pub fn file_node_id(path: &str) -> String {
    format!("file-{}", path)
}

/// Node id for a symbol vertex.
pub fn symbol_node_id(symbol_id: &str) -> String {
    format!("symbol-{}", symbol_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_id_deterministic() {
        let loc = Location {
            start_line: 10,
            end_line: 20,
            start_col: 4,
            end_col: 1,
        };
        let a = generate_symbol_id("src/app.ts", SymbolKind::Function, "render", &loc);
        let b = generate_symbol_id("src/app.ts", SymbolKind::Function, "render", &loc);
        assert_eq!(a, b);
        assert!(a.starts_with("function-"));
    }

    #[test]
    fn test_symbol_id_varies_with_position() {
        let loc_a = Location {
            start_line: 10,
            ..Default::default()
        };
        let loc_b = Location {
            start_line: 11,
            ..Default::default()
        };
        let a = generate_symbol_id("src/app.ts", SymbolKind::Function, "render", &loc_a);
        let b = generate_symbol_id("src/app.ts", SymbolKind::Function, "render", &loc_b);
        assert_ne!(a, b);
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            SymbolKind::Function,
            SymbolKind::Class,
            SymbolKind::TypeAlias,
            SymbolKind::Namespace,
        ] {
            assert_eq!(SymbolKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(SymbolKind::from_str("nonsense"), None);
    }

    #[test]
    fn test_framework_kind_round_trip() {
        for kind in [
            FrameworkKind::Component,
            FrameworkKind::Hook,
            FrameworkKind::BuildMethod,
            FrameworkKind::StateClass,
        ] {
            assert_eq!(FrameworkKind::from_str(kind.as_str()), Some(kind));
        }
    }
}
