use std::fs;
use std::path::Path;

use codecontext::errors::AnalyzerError;
use codecontext::mcp::{get_tool_definitions, handle_tool_call, McpServer, ServerSettings};
use serde_json::json;
use tempfile::TempDir;

fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A small TypeScript project served as the default target.
fn project() -> (TempDir, McpServer) {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "src/App.tsx",
        "import { useAuth } from './useAuth';\n\nexport function App() { return null; }\n",
    );
    write_file(
        dir.path(),
        "src/useAuth.ts",
        "export function useAuth() { return { user: null }; }\n",
    );
    write_file(
        dir.path(),
        "src/api.ts",
        "export class ApiClient {\n  fetchUser() { return null; }\n}\n",
    );
    let server = McpServer::new(dir.path().to_path_buf(), ServerSettings::defaults());
    (dir, server)
}

fn response_text(value: &serde_json::Value) -> &str {
    value["content"][0]["text"].as_str().unwrap()
}

#[test]
fn test_eight_tools_defined() {
    let tools = get_tool_definitions();
    assert_eq!(tools.len(), 8);
    for tool in &tools {
        assert!(!tool.description.is_empty());
        assert!(tool.input_schema.is_object());
    }
}

#[test]
fn test_overview_reports_files_and_languages() {
    let (_dir, server) = project();
    let result = handle_tool_call(&server, "get_codebase_overview", json!({})).unwrap();
    let text = response_text(&result);
    assert!(text.contains("Codebase Overview"));
    assert!(text.contains("Files analyzed: 3"));
    assert!(text.contains("typescript"));
}

#[test]
fn test_overview_with_stats_block() {
    let (_dir, server) = project();
    let result =
        handle_tool_call(&server, "get_codebase_overview", json!({"include_stats": true}))
            .unwrap();
    let text = response_text(&result);
    assert!(text.contains("relationship_metrics"));
}

#[test]
fn test_file_analysis_requires_path() {
    let (_dir, server) = project();
    let err = handle_tool_call(&server, "get_file_analysis", json!({})).unwrap_err();
    assert!(matches!(err, AnalyzerError::InvalidArgument { .. }));
}

#[test]
fn test_file_analysis_unknown_file() {
    let (_dir, server) = project();
    let err = handle_tool_call(
        &server,
        "get_file_analysis",
        json!({"file_path": "src/nope.ts"}),
    )
    .unwrap_err();
    assert!(matches!(err, AnalyzerError::NotFound { .. }));
}

#[test]
fn test_file_analysis_lists_symbols_and_imports() {
    let (_dir, server) = project();
    let result = handle_tool_call(
        &server,
        "get_file_analysis",
        json!({"file_path": "src/App.tsx"}),
    )
    .unwrap();
    let text = response_text(&result);
    assert!(text.contains("Language: typescript"));
    assert!(text.contains("App"));
    assert!(text.contains("./useAuth"));
}

#[test]
fn test_symbol_info_requires_name() {
    let (_dir, server) = project();
    let err = handle_tool_call(&server, "get_symbol_info", json!({})).unwrap_err();
    assert!(matches!(err, AnalyzerError::InvalidArgument { .. }));
}

#[test]
fn test_symbol_info_finds_hook() {
    let (_dir, server) = project();
    let result = handle_tool_call(
        &server,
        "get_symbol_info",
        json!({"symbol_name": "useAuth"}),
    )
    .unwrap();
    let text = response_text(&result);
    assert!(text.contains("useAuth"));
    assert!(text.contains("hook"));
}

#[test]
fn test_symbol_info_unknown_symbol() {
    let (_dir, server) = project();
    let err = handle_tool_call(
        &server,
        "get_symbol_info",
        json!({"symbol_name": "doesNotExist"}),
    )
    .unwrap_err();
    assert!(matches!(err, AnalyzerError::NotFound { .. }));
}

#[test]
fn test_search_requires_query() {
    let (_dir, server) = project();
    let err = handle_tool_call(&server, "search_symbols", json!({})).unwrap_err();
    assert!(matches!(err, AnalyzerError::InvalidArgument { .. }));
}

#[test]
fn test_search_respects_limit() {
    let (_dir, server) = project();
    let result = handle_tool_call(
        &server,
        "search_symbols",
        json!({"query": "a", "limit": 1}),
    )
    .unwrap();
    let text = response_text(&result);
    assert!(text.contains("(1 hit(s))"));
}

#[test]
fn test_search_filters_by_symbol_type() {
    let (_dir, server) = project();
    let result = handle_tool_call(
        &server,
        "search_symbols",
        json!({"query": "ApiClient", "symbol_type": "class"}),
    )
    .unwrap();
    assert!(response_text(&result).contains("ApiClient"));

    let result = handle_tool_call(
        &server,
        "search_symbols",
        json!({"query": "ApiClient", "symbol_type": "function"}),
    )
    .unwrap();
    assert!(response_text(&result).contains("(0 hit(s))"));
}

#[test]
fn test_dependencies_for_file() {
    let (_dir, server) = project();
    let result = handle_tool_call(
        &server,
        "get_dependencies",
        json!({"file_path": "src/App.tsx"}),
    )
    .unwrap();
    let text = response_text(&result);
    assert!(text.contains("Imports (1)"));
    assert!(text.contains("useAuth.ts"));
}

#[test]
fn test_dependencies_global_summary() {
    let (_dir, server) = project();
    let result = handle_tool_call(&server, "get_dependencies", json!({})).unwrap();
    let text = response_text(&result);
    assert!(text.contains("Dependency Summary"));
    assert!(text.contains("Most imported files"));
}

#[test]
fn test_watch_changes_lifecycle() {
    let (_dir, server) = project();
    let on = handle_tool_call(&server, "watch_changes", json!({"enable": true})).unwrap();
    assert!(response_text(&on).contains("Watching"));

    // Idempotent start.
    let again = handle_tool_call(&server, "watch_changes", json!({"enable": true})).unwrap();
    assert!(response_text(&again).contains("Already watching"));

    let off = handle_tool_call(&server, "watch_changes", json!({"enable": false})).unwrap();
    assert!(response_text(&off).contains("stopped"));

    // Idempotent stop.
    let off = handle_tool_call(&server, "watch_changes", json!({"enable": false})).unwrap();
    assert!(response_text(&off).contains("not active"));
}

#[test]
fn test_semantic_neighborhoods_non_git_header() {
    let (_dir, server) = project();
    let result =
        handle_tool_call(&server, "get_semantic_neighborhoods", json!({})).unwrap();
    let text = response_text(&result);
    assert!(text.contains("Not a Git Repository"));
}

#[test]
fn test_framework_analysis_detects_react() {
    let (_dir, server) = project();
    let result = handle_tool_call(&server, "get_framework_analysis", json!({})).unwrap();
    let text = response_text(&result);
    assert!(text.contains("react"));
}

#[test]
fn test_unknown_tool_rejected() {
    let (_dir, server) = project();
    let err = handle_tool_call(&server, "no_such_tool", json!({})).unwrap_err();
    assert!(matches!(err, AnalyzerError::InvalidArgument { .. }));
}
