//! MCP tool definitions and dispatch over the code graph.
//!
//! Each tool resolves its optional `target_dir`, runs a fresh analyze
//! through the server, and formats a plain-text response from the
//! resulting snapshot. Tool definitions include JSON Schema descriptions
//! so that MCP clients can discover available capabilities.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::errors::{AnalyzerError, Result};
use crate::graph::GraphStore;
use crate::semantic::SemanticResult;
use crate::types::{file_node_id, symbol_node_id, FrameworkKind, Symbol};

use super::server::McpServer;

/// Maximum character length for a tool response before truncation.
const MAX_RESPONSE_CHARS: usize = 15_000;

/// Default result cap for `search_symbols`.
const DEFAULT_SEARCH_LIMIT: usize = 20;

/// A tool definition exposed by the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema describing the tool's input parameters.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Returns the list of all tool definitions exposed by this MCP server.
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    let target_dir_prop = json!({
        "type": "string",
        "description": "Directory to analyze; defaults to the configured project root. '~/' expands to the user home."
    });

    vec![
        ToolDefinition {
            name: "get_codebase_overview".to_string(),
            description: "Analyze the project and return a codebase overview: languages, file counts, symbol totals, and dependency statistics.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "include_stats": {
                        "type": "boolean",
                        "description": "Append a JSON statistics block to the overview"
                    },
                    "target_dir": target_dir_prop,
                }
            }),
        },
        ToolDefinition {
            name: "get_file_analysis".to_string(),
            description: "Return the analysis of a single file: language, line count, extracted symbols, and imports.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path of the file to inspect, absolute or project-relative"
                    },
                    "target_dir": target_dir_prop,
                },
                "required": ["file_path"]
            }),
        },
        ToolDefinition {
            name: "get_symbol_info".to_string(),
            description: "Look up all symbols matching a name, with kind, framework sub-type, signature, and documentation.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "symbol_name": {
                        "type": "string",
                        "description": "Symbol name to look up"
                    },
                    "file_path": {
                        "type": "string",
                        "description": "Restrict matches to this file"
                    },
                    "framework_type": {
                        "type": "string",
                        "description": "Restrict matches to a framework sub-type (component, hook, service, ...)"
                    },
                    "target_dir": target_dir_prop,
                },
                "required": ["symbol_name"]
            }),
        },
        ToolDefinition {
            name: "search_symbols".to_string(),
            description: "Search symbols by substring with optional file-type, symbol-type, and framework filters.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Substring to match against symbol names, case-insensitive"
                    },
                    "file_type": {
                        "type": "string",
                        "description": "Restrict hits to files with this extension (e.g. 'ts')"
                    },
                    "symbol_type": {
                        "type": "string",
                        "description": "Restrict hits to a symbol kind (function, class, ...)"
                    },
                    "framework_type": {
                        "type": "string",
                        "description": "Restrict hits to a framework sub-type"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of results (default: 20)"
                    },
                    "target_dir": target_dir_prop,
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "get_dependencies".to_string(),
            description: "Show import relationships: per-file imports and dependents, or a global dependency summary.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "File to scope the report to; omit for a global summary"
                    },
                    "direction": {
                        "type": "string",
                        "description": "'imports', 'dependents', or 'both' (default)"
                    },
                    "target_dir": target_dir_prop,
                }
            }),
        },
        ToolDefinition {
            name: "watch_changes".to_string(),
            description: "Start or stop watching the target directory for file changes.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "enable": {
                        "type": "boolean",
                        "description": "true to start watching, false to stop"
                    },
                    "target_dir": target_dir_prop,
                },
                "required": ["enable"]
            }),
        },
        ToolDefinition {
            name: "get_semantic_neighborhoods".to_string(),
            description: "Report git-history semantic neighborhoods: groups of files that change together, with clustering quality scores.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Produce a recommendation for this file's neighborhood"
                    },
                    "include_basic": {
                        "type": "boolean",
                        "description": "Include the raw co-change neighborhoods"
                    },
                    "include_quality": {
                        "type": "boolean",
                        "description": "Include clustering quality metrics"
                    },
                    "max_results": {
                        "type": "number",
                        "description": "Maximum neighborhoods to list (default: 10)"
                    },
                    "target_dir": target_dir_prop,
                }
            }),
        },
        ToolDefinition {
            name: "get_framework_analysis".to_string(),
            description: "Per-framework breakdown of detected symbols (components, hooks, services, routes) with qualitative insights.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "framework": {
                        "type": "string",
                        "description": "Limit the report to one framework (react, vue, angular, svelte, nextjs)"
                    },
                    "include_stats": {
                        "type": "boolean",
                        "description": "Append raw counts"
                    },
                    "target_dir": target_dir_prop,
                }
            }),
        },
    ]
}

/// Dispatches a tool call to the appropriate handler.
pub fn handle_tool_call(server: &McpServer, tool_name: &str, args: Value) -> Result<Value> {
    match tool_name {
        "get_codebase_overview" => handle_overview(server, args),
        "get_file_analysis" => handle_file_analysis(server, args),
        "get_symbol_info" => handle_symbol_info(server, args),
        "search_symbols" => handle_search_symbols(server, args),
        "get_dependencies" => handle_dependencies(server, args),
        "watch_changes" => handle_watch_changes(server, args),
        "get_semantic_neighborhoods" => handle_semantic_neighborhoods(server, args),
        "get_framework_analysis" => handle_framework_analysis(server, args),
        _ => Err(AnalyzerError::InvalidArgument {
            message: format!("unknown tool: {}", tool_name),
        }),
    }
}

/// Truncates a string to the maximum response character limit, appending
/// a truncation notice if necessary.
fn truncate_response(s: &str) -> String {
    if s.len() <= MAX_RESPONSE_CHARS {
        s.to_string()
    } else {
        let mut end = MAX_RESPONSE_CHARS;
        while !s.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        format!("{}\n\n[... truncated at {} chars]", &s[..end], end)
    }
}

fn text_result(text: &str) -> Value {
    json!({
        "content": [{ "type": "text", "text": truncate_response(text) }]
    })
}

fn arg_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

fn arg_bool(args: &Value, key: &str) -> bool {
    args.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

/// Resolves `target_dir` and runs a fresh analyze, returning the snapshot.
fn refresh_graph(server: &McpServer, args: &Value) -> Result<Arc<GraphStore>> {
    let target = server.resolve_target_dir(args.get("target_dir").and_then(|v| v.as_str()));
    server.refresh(&target)
}

/// Finds a file record by exact normalized path or project-relative suffix.
fn lookup_file<'a>(store: &'a GraphStore, path: &str) -> Option<&'a crate::types::FileInfo> {
    let normalized = path.replace('\\', "/");
    if let Some(file) = store.file(&normalized) {
        return Some(file);
    }
    let suffix = format!("/{}", normalized.trim_start_matches("./"));
    store
        .file_paths_sorted()
        .into_iter()
        .find(|p| p.ends_with(&suffix))
        .and_then(|p| store.file(p))
}

/// File path a symbol lives in, via its graph node.
fn symbol_file_path<'a>(store: &'a GraphStore, symbol: &Symbol) -> &'a str {
    store
        .node(&symbol_node_id(&symbol.id))
        .map(|n| n.file_path.as_str())
        .unwrap_or("")
}

// ----------------------------------------------------------------------
// Framework matching
// ----------------------------------------------------------------------

/// Frameworks the analysis layer can attribute symbols to.
const KNOWN_FRAMEWORKS: &[&str] = &["react", "vue", "angular", "svelte", "nextjs"];

/// Whether a symbol belongs to a framework, by sub-type tag or file-path
/// marker.
fn framework_matches(framework: &str, symbol: &Symbol, file_path: &str) -> bool {
    let fw = symbol.framework_kind;
    match framework.to_lowercase().as_str() {
        "react" => {
            matches!(fw, Some(FrameworkKind::Component) | Some(FrameworkKind::Hook))
                || file_path.ends_with(".jsx")
                || file_path.ends_with(".tsx")
        }
        "vue" => {
            matches!(
                fw,
                Some(FrameworkKind::Component)
                    | Some(FrameworkKind::Computed)
                    | Some(FrameworkKind::Watcher)
            ) || file_path.ends_with(".vue")
        }
        "angular" => {
            matches!(
                fw,
                Some(FrameworkKind::Component)
                    | Some(FrameworkKind::Service)
                    | Some(FrameworkKind::Directive)
            ) || file_path.contains(".component.")
                || file_path.contains(".service.")
                || file_path.contains(".module.")
        }
        "svelte" => {
            matches!(fw, Some(FrameworkKind::Component) | Some(FrameworkKind::Store))
                || file_path.ends_with(".svelte")
        }
        "nextjs" => {
            matches!(fw, Some(FrameworkKind::Route) | Some(FrameworkKind::Component))
                && (file_path.contains("/pages/") || file_path.contains("/app/"))
        }
        _ => false,
    }
}

// ----------------------------------------------------------------------
// Tool handlers
// ----------------------------------------------------------------------

fn handle_overview(server: &McpServer, args: Value) -> Result<Value> {
    let store = refresh_graph(server, &args)?;
    let meta = store.metadata();

    let mut out = String::new();
    out.push_str("📋 Codebase Overview\n\n");
    out.push_str(&format!("Files analyzed: {}\n", meta.total_files));
    out.push_str(&format!("Symbols extracted: {}\n", meta.total_symbols));
    out.push_str(&format!("Import edges: {}\n", store.edge_count()));
    out.push_str(&format!("Analysis time: {} ms\n", meta.analysis_time_ms));

    let mut languages: Vec<(&String, &usize)> = meta.languages.iter().collect();
    languages.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    if !languages.is_empty() {
        out.push_str("\n📦 Languages:\n");
        for (language, count) in &languages {
            out.push_str(&format!("  - {}: {} file(s)\n", language, count));
        }
    }

    let test_files = store.files().filter(|f| f.is_test).count();
    let generated_files = store.files().filter(|f| f.is_generated).count();
    out.push_str(&format!(
        "\nTest files: {}\nGenerated files: {}\n",
        test_files, generated_files
    ));

    if arg_bool(&args, "include_stats") {
        let stats = json!({
            "generated": meta.generated,
            "version": meta.version,
            "total_files": meta.total_files,
            "total_symbols": meta.total_symbols,
            "languages": meta.languages,
            "analysis_time_ms": meta.analysis_time_ms,
            "relationship_metrics": meta.configuration.get("relationship_metrics"),
        });
        out.push_str("\n📊 Stats:\n");
        out.push_str(&serde_json::to_string_pretty(&stats).unwrap_or_default());
        out.push('\n');
    }

    Ok(text_result(&out))
}

fn handle_file_analysis(server: &McpServer, args: Value) -> Result<Value> {
    let file_path = arg_str(&args, "file_path").ok_or_else(|| AnalyzerError::InvalidArgument {
        message: "missing required parameter: file_path".to_string(),
    })?;

    let store = refresh_graph(server, &args)?;
    let file = lookup_file(&store, file_path).ok_or_else(|| AnalyzerError::NotFound {
        what: format!("file {}", file_path),
    })?;

    let mut out = String::new();
    out.push_str(&format!("📄 {}\n\n", file.path));
    out.push_str(&format!("Language: {}\n", file.language));
    out.push_str(&format!("Lines: {}\n", file.lines));
    out.push_str(&format!("Symbols: {}\n", file.symbols.len()));
    out.push_str(&format!("Parse quality: {}\n", file.quality.as_str()));
    if file.is_test {
        out.push_str("Test file: yes\n");
    }
    if file.is_generated {
        out.push_str("Generated: yes\n");
    }
    if !file.parse_errors.is_empty() {
        out.push_str(&format!("⚠️ Parse errors: {}\n", file.parse_errors.len()));
    }

    if !file.symbols.is_empty() {
        out.push_str("\n🎯 Symbols:\n");
        for id in &file.symbols {
            if let Some(symbol) = store.symbol(id) {
                let fw = symbol
                    .framework_kind
                    .map(|f| format!(" [{}]", f.as_str()))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "  L{:<5} {} {}{}\n",
                    symbol.location.start_line + 1,
                    symbol.kind.as_str(),
                    symbol.name,
                    fw
                ));
            }
        }
    }

    if !file.imports.is_empty() {
        out.push_str("\n📦 Imports:\n");
        for import in &file.imports {
            let specifiers = if import.specifiers.is_empty() {
                String::new()
            } else {
                format!(" ({})", import.specifiers.join(", "))
            };
            out.push_str(&format!("  - {}{}\n", import.path, specifiers));
        }
    }

    Ok(text_result(&out))
}

fn handle_symbol_info(server: &McpServer, args: Value) -> Result<Value> {
    let symbol_name =
        arg_str(&args, "symbol_name").ok_or_else(|| AnalyzerError::InvalidArgument {
            message: "missing required parameter: symbol_name".to_string(),
        })?;
    let file_filter = arg_str(&args, "file_path");
    let framework_filter = arg_str(&args, "framework_type");

    let store = refresh_graph(server, &args)?;

    let needle = symbol_name.to_lowercase();
    let mut matches: Vec<&Symbol> = store
        .symbols()
        .filter(|s| s.name.to_lowercase() == needle)
        .filter(|s| {
            file_filter.map_or(true, |f| symbol_file_path(&store, s).ends_with(f))
        })
        .filter(|s| {
            framework_filter.map_or(true, |f| {
                s.framework_kind.map_or(false, |k| k.as_str() == f)
            })
        })
        .collect();
    matches.sort_by(|a, b| {
        symbol_file_path(&store, a)
            .cmp(symbol_file_path(&store, b))
            .then_with(|| a.location.start_line.cmp(&b.location.start_line))
    });

    if matches.is_empty() {
        return Err(AnalyzerError::NotFound {
            what: format!("symbol {}", symbol_name),
        });
    }

    let mut out = format!("🎯 Symbol: {}\n\n", symbol_name);
    for symbol in matches {
        let path = symbol_file_path(&store, symbol);
        out.push_str(&format!(
            "{}:{}\n  kind: {}\n",
            path,
            symbol.location.start_line + 1,
            symbol.kind.as_str()
        ));
        if let Some(fw) = symbol.framework_kind {
            out.push_str(&format!("  framework: {}\n", fw.as_str()));
            let insight = match fw {
                FrameworkKind::Component => "🧩 Rendered UI component",
                FrameworkKind::Hook => "🪝 Stateful logic shared between components",
                FrameworkKind::Service => "⚙️ Injectable service",
                FrameworkKind::Store => "🗄️ Shared state container",
                FrameworkKind::Route => "🛣️ Routing entry point",
                FrameworkKind::Middleware => "🔀 Request pipeline stage",
                _ => "⚡ Framework-specific symbol",
            };
            out.push_str(&format!("  {}\n", insight));
        }
        if let Some(signature) = &symbol.signature {
            out.push_str(&format!("  signature: {}\n", signature));
        }
        if let Some(docs) = &symbol.documentation {
            out.push_str(&format!("  docs: {}\n", docs));
        }
        out.push('\n');
    }

    Ok(text_result(&out))
}

fn handle_search_symbols(server: &McpServer, args: Value) -> Result<Value> {
    let query = arg_str(&args, "query").ok_or_else(|| AnalyzerError::InvalidArgument {
        message: "missing required parameter: query".to_string(),
    })?;
    let file_type = arg_str(&args, "file_type");
    let symbol_type = arg_str(&args, "symbol_type");
    let framework_type = arg_str(&args, "framework_type");
    let limit = args
        .get("limit")
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .unwrap_or(DEFAULT_SEARCH_LIMIT);

    let store = refresh_graph(server, &args)?;

    let hits: Vec<&Symbol> = store
        .symbols_matching(query)
        .into_iter()
        .filter(|s| symbol_type.map_or(true, |t| s.kind.as_str() == t))
        .filter(|s| {
            file_type.map_or(true, |ext| {
                symbol_file_path(&store, s).ends_with(&format!(".{}", ext))
            })
        })
        .filter(|s| {
            framework_type.map_or(true, |fw| {
                framework_matches(fw, s, symbol_file_path(&store, s))
                    || s.framework_kind.map_or(false, |k| k.as_str() == fw)
            })
        })
        .take(limit)
        .collect();

    let mut out = format!("🔍 Search: '{}' ({} hit(s))\n\n", query, hits.len());
    for symbol in hits {
        let fw = symbol
            .framework_kind
            .map(|f| format!(" [{}]", f.as_str()))
            .unwrap_or_default();
        out.push_str(&format!(
            "{}:{} {} {}{}\n",
            symbol_file_path(&store, symbol),
            symbol.location.start_line + 1,
            symbol.kind.as_str(),
            symbol.name,
            fw
        ));
    }

    Ok(text_result(&out))
}

fn handle_dependencies(server: &McpServer, args: Value) -> Result<Value> {
    let file_path = arg_str(&args, "file_path");
    let direction = arg_str(&args, "direction").unwrap_or("both");

    let store = refresh_graph(server, &args)?;

    let mut out = String::new();
    match file_path {
        Some(path) => {
            let file = lookup_file(&store, path).ok_or_else(|| AnalyzerError::NotFound {
                what: format!("file {}", path),
            })?;
            let node_id = file_node_id(&file.path);
            out.push_str(&format!("🔗 Dependencies for {}\n\n", file.path));

            if direction == "imports" || direction == "both" {
                let imports = store.edges_from(&node_id);
                out.push_str(&format!("Imports ({}):\n", imports.len()));
                for edge in imports {
                    out.push_str(&format!(
                        "  → {}\n",
                        edge.to.trim_start_matches("file-")
                    ));
                }
            }
            if direction == "dependents" || direction == "both" {
                let dependents = store.edges_to(&node_id);
                out.push_str(&format!("\nDependents ({}):\n", dependents.len()));
                for edge in dependents {
                    out.push_str(&format!(
                        "  ← {}\n",
                        edge.from.trim_start_matches("file-")
                    ));
                }
            }
        }
        None => {
            out.push_str("🔗 Dependency Summary\n\n");
            out.push_str(&format!("Total import edges: {}\n", store.edge_count()));
            if let Some(metrics) = store.metadata().configuration.get("relationship_metrics") {
                out.push_str(&format!(
                    "\n📊 Metrics:\n{}\n",
                    serde_json::to_string_pretty(metrics).unwrap_or_default()
                ));
            }

            // Top five most-imported files by fan-in.
            let mut fan_in: std::collections::HashMap<&str, usize> =
                std::collections::HashMap::new();
            for edge in store.edges() {
                *fan_in.entry(edge.to.as_str()).or_insert(0) += 1;
            }
            let mut ranked: Vec<(&str, usize)> = fan_in.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            if !ranked.is_empty() {
                out.push_str("\n📦 Most imported files:\n");
                for (node_id, count) in ranked.into_iter().take(5) {
                    out.push_str(&format!(
                        "  {} ({} importer(s))\n",
                        node_id.trim_start_matches("file-"),
                        count
                    ));
                }
            }
        }
    }

    Ok(text_result(&out))
}

fn handle_watch_changes(server: &McpServer, args: Value) -> Result<Value> {
    let enable = args
        .get("enable")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| AnalyzerError::InvalidArgument {
            message: "missing required parameter: enable".to_string(),
        })?;

    let target = server.resolve_target_dir(args.get("target_dir").and_then(|v| v.as_str()));
    let status = if enable {
        // Refresh first so the watcher observes an already-analyzed tree.
        server.refresh(&target)?;
        server.start_watcher(&target)?
    } else {
        server.stop_watcher()?
    };

    Ok(text_result(&status))
}

fn handle_semantic_neighborhoods(server: &McpServer, args: Value) -> Result<Value> {
    let file_path = arg_str(&args, "file_path");
    let include_basic = arg_bool(&args, "include_basic");
    let include_quality = arg_bool(&args, "include_quality");
    let max_results = args
        .get("max_results")
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .unwrap_or(10);

    let store = refresh_graph(server, &args)?;
    let semantic: SemanticResult = store
        .metadata()
        .configuration
        .get("semantic_neighborhoods")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    let mut out = String::from("📊 Semantic Code Neighborhoods\n\n");

    if !semantic.is_git_repository {
        out.push_str("❌ Not a Git Repository\n\n");
        out.push_str(
            "Semantic neighborhoods are derived from commit history; run this \
             tool inside a git working tree to see co-change groups.\n",
        );
        return Ok(text_result(&out));
    }

    if let Some(error) = &semantic.error {
        out.push_str(&format!("⚠️ Partial analysis: {}\n\n", error));
    }

    let meta = &semantic.analysis_metadata;
    out.push_str(&format!(
        "🔄 {} commit(s) over {} day(s); {} neighborhood(s), {} cluster(s)\n\n",
        meta.total_commits, meta.period_days, meta.total_neighborhoods, meta.total_clusters
    ));

    if let Some(path) = file_path {
        let normalized = path.replace('\\', "/");
        let owner = semantic
            .semantic_neighborhoods
            .iter()
            .find(|n| n.files.iter().any(|f| normalized.ends_with(f.as_str()) || f.ends_with(&normalized)));
        match owner {
            Some(neighborhood) => {
                out.push_str(&format!(
                    "🎯 '{}' belongs to neighborhood '{}' (strength {:.2}).\n",
                    path, neighborhood.name, neighborhood.correlation_strength
                ));
                let related: Vec<&str> = neighborhood
                    .files
                    .iter()
                    .filter(|f| !normalized.ends_with(f.as_str()))
                    .map(|f| f.as_str())
                    .collect();
                if !related.is_empty() {
                    out.push_str("   Files that usually change with it:\n");
                    for f in related {
                        out.push_str(&format!("   - {}\n", f));
                    }
                }
                out.push('\n');
            }
            None => {
                out.push_str(&format!(
                    "🎯 '{}' has no co-change neighborhood in the analyzed window.\n\n",
                    path
                ));
            }
        }
    }

    if !semantic.clustered_neighborhoods.is_empty() {
        out.push_str("🧩 Clusters:\n");
        for clustered in semantic.clustered_neighborhoods.iter().take(max_results) {
            let c = &clustered.cluster;
            out.push_str(&format!(
                "  {} — {} file(s), strength {:.2}\n",
                c.name, c.size, c.strength
            ));
            out.push_str(&format!("    {}\n", c.recommendation_reason));
            if !c.optimal_tasks.is_empty() {
                out.push_str(&format!("    Suited for: {}\n", c.optimal_tasks.join(", ")));
            }
            if include_quality {
                out.push_str(&format!(
                    "    🧮 silhouette {:.2}, Davies-Bouldin {:.2}\n",
                    clustered.quality_metrics.silhouette_score,
                    clustered.quality_metrics.davies_bouldin_index
                ));
            }
        }
        out.push('\n');
    }

    if include_basic && !semantic.semantic_neighborhoods.is_empty() {
        out.push_str("📋 Neighborhoods:\n");
        for neighborhood in semantic.semantic_neighborhoods.iter().take(max_results) {
            out.push_str(&format!(
                "  {} ({} file(s), strength {:.2}, {} change(s))\n",
                neighborhood.name,
                neighborhood.files.len(),
                neighborhood.correlation_strength,
                neighborhood.change_frequency
            ));
        }
        out.push('\n');
    }

    if include_quality {
        let quality = &meta.quality_scores;
        out.push_str(&format!(
            "🧮 Overall quality: {} (silhouette {:.2}, Davies-Bouldin {:.2})\n",
            quality.rating, quality.average_silhouette, quality.average_davies_bouldin
        ));
    }

    Ok(text_result(&out))
}

fn handle_framework_analysis(server: &McpServer, args: Value) -> Result<Value> {
    let framework_filter = arg_str(&args, "framework");
    let include_stats = arg_bool(&args, "include_stats");

    let store = refresh_graph(server, &args)?;

    let frameworks: Vec<&str> = match framework_filter {
        Some(fw) => vec![fw],
        None => KNOWN_FRAMEWORKS.to_vec(),
    };

    let mut out = String::from("⚡ Framework Analysis\n\n");
    let mut any = false;

    for framework in frameworks {
        let symbols: Vec<&Symbol> = store
            .symbols()
            .filter(|s| framework_matches(framework, s, symbol_file_path(&store, s)))
            .collect();
        if symbols.is_empty() {
            continue;
        }
        any = true;

        let mut histogram: std::collections::HashMap<&str, usize> =
            std::collections::HashMap::new();
        for symbol in &symbols {
            let tag = symbol
                .framework_kind
                .map(|f| f.as_str())
                .unwrap_or_else(|| symbol.kind.as_str());
            *histogram.entry(tag).or_insert(0) += 1;
        }

        out.push_str(&format!("🧩 {} — {} symbol(s)\n", framework, symbols.len()));
        let mut rows: Vec<(&str, usize)> = histogram.iter().map(|(k, v)| (*k, *v)).collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        for (tag, count) in &rows {
            out.push_str(&format!("  - {}: {}\n", tag, count));
        }

        if framework == "react" {
            let components = histogram.get("component").copied().unwrap_or(0);
            let hooks = histogram.get("hook").copied().unwrap_or(0);
            if components > 0 {
                let ratio = hooks as f64 / components as f64;
                let insight = if ratio >= 1.5 {
                    "🪝 Hook-heavy: most logic lives in custom hooks"
                } else if ratio >= 0.5 {
                    "⚙️ Balanced mix of components and hooks"
                } else {
                    "🧩 Component-centric: little shared hook logic"
                };
                out.push_str(&format!("  {}\n", insight));
            }
        }

        if include_stats {
            out.push_str(&format!(
                "  📊 {}\n",
                serde_json::to_string(&json!(histogram)).unwrap_or_default()
            ));
        }
        out.push('\n');
    }

    if !any {
        out.push_str("No framework-specific symbols detected.\n");
    }

    Ok(text_result(&out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, SymbolKind};

    fn symbol(name: &str, fw: Option<FrameworkKind>) -> Symbol {
        Symbol {
            id: format!("function-{}", name),
            name: name.to_string(),
            kind: SymbolKind::Function,
            framework_kind: fw,
            fully_qualified_name: name.to_string(),
            signature: None,
            documentation: None,
            language: "typescript".to_string(),
            location: Location::default(),
        }
    }

    #[test]
    fn test_tool_definitions_complete() {
        let tools = get_tool_definitions();
        assert_eq!(tools.len(), 8);
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"get_codebase_overview"));
        assert!(names.contains(&"watch_changes"));
        assert!(names.contains(&"get_semantic_neighborhoods"));
    }

    #[test]
    fn test_truncate_long_response() {
        let long = "x".repeat(MAX_RESPONSE_CHARS + 100);
        let truncated = truncate_response(&long);
        assert!(truncated.contains("truncated"));
        assert!(truncated.len() < long.len());

        let short = "hello";
        assert_eq!(truncate_response(short), "hello");
    }

    #[test]
    fn test_framework_matching_by_tag() {
        let hook = symbol("useAuth", Some(FrameworkKind::Hook));
        assert!(framework_matches("react", &hook, "src/hooks/useAuth.ts"));
        assert!(!framework_matches("vue", &hook, "src/hooks/useAuth.ts"));
    }

    #[test]
    fn test_framework_matching_by_path() {
        let plain = symbol("render", None);
        assert!(framework_matches("react", &plain, "src/App.tsx"));
        assert!(framework_matches("vue", &plain, "src/App.vue"));
        assert!(!framework_matches("react", &plain, "src/app.ts"));
    }

    #[test]
    fn test_nextjs_requires_route_location() {
        let route = symbol("Page", Some(FrameworkKind::Component));
        assert!(framework_matches("nextjs", &route, "src/pages/index.tsx"));
        assert!(!framework_matches("nextjs", &route, "src/lib/util.tsx"));
    }
}
