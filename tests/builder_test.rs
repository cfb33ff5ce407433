use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use codecontext::graph::{GraphBuilder, ProgressConfig};
use codecontext::matcher::PathMatcher;
use tempfile::TempDir;

fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn abs_key(root: &Path, rel: &str) -> String {
    let matcher = PathMatcher::new();
    matcher.normalize_for_pattern(&root.join(rel).display().to_string())
}

#[test]
fn test_default_excludes_keep_only_source() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "src/index.ts", "export const a = 1;\n");
    write_file(dir.path(), "node_modules/react/index.js", "module.exports = {};\n");
    write_file(dir.path(), "dist/app.js", "var x = 1;\n");

    let builder = GraphBuilder::new();
    let store = builder.analyze(dir.path()).unwrap();

    assert_eq!(store.file_count(), 1);
    assert!(store.file(&abs_key(dir.path(), "src/index.ts")).is_some());
}

#[test]
fn test_negation_rescues_excluded_subtree() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "vendor/third/x.go", "package third\n\nfunc X() {}\n");
    write_file(
        dir.path(),
        "vendor/our-company/y.go",
        "package ours\n\nfunc Y() {}\n",
    );
    write_file(dir.path(), "src/main.go", "package main\n\nfunc main() {}\n");

    let builder = GraphBuilder::new();
    builder.set_exclude_patterns(vec![
        "vendor/**".to_string(),
        "!vendor/our-company/**".to_string(),
    ]);
    let store = builder.analyze(dir.path()).unwrap();

    assert_eq!(store.file_count(), 2);
    assert!(store
        .file(&abs_key(dir.path(), "vendor/our-company/y.go"))
        .is_some());
    assert!(store.file(&abs_key(dir.path(), "src/main.go")).is_some());
    assert!(store
        .file(&abs_key(dir.path(), "vendor/third/x.go"))
        .is_none());
}

#[test]
fn test_root_named_like_default_exclude_still_analyzed() {
    // The project root itself may live under tmp/, vendor/, or build/;
    // exclude patterns apply to paths relative to the root, not to the
    // root's own ancestry.
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("vendor").join("build").join("myapp");
    write_file(&root, "src/index.ts", "export const a = 1;\n");
    write_file(&root, "node_modules/react/index.js", "module.exports = {};\n");

    let builder = GraphBuilder::new();
    let store = builder.analyze(&root).unwrap();

    assert_eq!(store.file_count(), 1);
    assert!(store.file(&abs_key(&root, "src/index.ts")).is_some());
}

#[test]
fn test_double_star_excludes_nested_tests() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "src/a.test.ts", "export const t = 1;\n");
    write_file(dir.path(), "deep/nested/b.test.js", "var t = 1;\n");
    write_file(dir.path(), "src/a.ts", "export const a = 1;\n");

    let builder = GraphBuilder::new();
    builder.set_exclude_patterns(vec!["**/*.test.*".to_string()]);
    let store = builder.analyze(dir.path()).unwrap();

    assert_eq!(store.file_count(), 1);
    assert!(store.file(&abs_key(dir.path(), "src/a.ts")).is_some());
}

#[test]
fn test_progress_messages_at_interval_five() {
    let dir = TempDir::new().unwrap();
    for i in 1..=15 {
        write_file(
            dir.path(),
            &format!("src/f{:02}.ts", i),
            "export const v = 1;\n",
        );
    }

    let messages = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&messages);

    let mut builder = GraphBuilder::new();
    builder.set_progress_config(ProgressConfig {
        interval: 5,
        show_percentage: false,
    });
    builder.set_progress_callback(Arc::new(move |message| {
        sink.lock().unwrap().push(message.to_string());
    }));
    builder.analyze(dir.path()).unwrap();

    let messages = messages.lock().unwrap();
    let expected = [
        "📄 Parsing files... (5 files)",
        "📄 Parsing files... (10 files)",
        "📄 Parsing files... (15 files)",
        "✅ Parsing complete (15 files)",
        "🔗 Building relationships...",
        "✅ Relationships built",
        "📊 Analyzing git history...",
    ];
    assert!(messages.len() >= expected.len());
    for (got, want) in messages.iter().zip(expected.iter()) {
        assert_eq!(got, want);
    }
}

#[test]
fn test_graph_closure_and_histogram() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "src/app.ts",
        "import { helper } from './util';\nexport function run() { return helper(); }\n",
    );
    write_file(dir.path(), "src/util.ts", "export function helper() { return 1; }\n");
    write_file(dir.path(), "tool/gen.py", "def main():\n    pass\n");

    let builder = GraphBuilder::new();
    let store = builder.analyze(dir.path()).unwrap();

    // Every symbol id listed by a file exists in the symbol table.
    for file in store.files() {
        for id in &file.symbols {
            assert!(store.symbol(id).is_some(), "dangling symbol id {id}");
        }
    }
    // Every edge endpoint resolves to a node.
    for edge in store.edges() {
        assert!(store.node(&edge.from).is_some(), "dangling edge from {}", edge.from);
        assert!(store.node(&edge.to).is_some(), "dangling edge to {}", edge.to);
    }
    // Language histogram agrees with per-file records.
    for (language, count) in &store.metadata().languages {
        let actual = store.files().filter(|f| &f.language == language).count();
        assert_eq!(&actual, count, "histogram mismatch for {language}");
    }
}

#[test]
fn test_analysis_idempotent_on_unchanged_tree() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "src/app.ts",
        "import { x } from './lib';\nexport class App {}\n",
    );
    write_file(dir.path(), "src/lib.ts", "export const x = 1;\n");

    let builder = GraphBuilder::new();
    let first = builder.analyze(dir.path()).unwrap();
    let second = builder.analyze(dir.path()).unwrap();

    assert_eq!(first.file_count(), second.file_count());
    assert_eq!(first.symbol_count(), second.symbol_count());
    assert_eq!(first.edge_count(), second.edge_count());

    let mut first_ids: Vec<&str> = first.symbols().map(|s| s.id.as_str()).collect();
    let mut second_ids: Vec<&str> = second.symbols().map(|s| s.id.as_str()).collect();
    first_ids.sort_unstable();
    second_ids.sort_unstable();
    assert_eq!(first_ids, second_ids);

    let mut first_edges: Vec<&str> = first.edges().map(|e| e.id.as_str()).collect();
    let mut second_edges: Vec<&str> = second.edges().map(|e| e.id.as_str()).collect();
    first_edges.sort_unstable();
    second_edges.sort_unstable();
    assert_eq!(first_edges, second_edges);
}

#[test]
fn test_cancel_flag_stops_build() {
    use std::sync::atomic::AtomicBool;

    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "src/a.ts", "export const a = 1;\n");

    let mut builder = GraphBuilder::new();
    let cancel = Arc::new(AtomicBool::new(true));
    builder.set_cancel_flag(Arc::clone(&cancel));

    let err = builder.analyze(dir.path()).unwrap_err();
    assert!(matches!(err, codecontext::AnalyzerError::Cancelled));
}

#[test]
fn test_metadata_version_and_totals() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "src/a.ts", "export function one() {}\n");

    let builder = GraphBuilder::new();
    let store = builder.analyze(dir.path()).unwrap();
    let meta = store.metadata();

    assert_eq!(meta.version, "2.0.0");
    assert_eq!(meta.total_files, store.file_count());
    assert_eq!(meta.total_symbols, store.symbol_count());
    assert!(meta.generated > 0);
    assert!(meta.configuration.contains_key("relationship_metrics"));
    assert!(meta.configuration.contains_key("semantic_neighborhoods"));
}
