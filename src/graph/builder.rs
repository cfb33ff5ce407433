//! Orchestrates one analyze run: walk the target directory, filter via the
//! `PathMatcher`, parse via the parser registry, populate the `GraphStore`,
//! then build relationships and git-history neighborhoods.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::{AnalyzerError, Result};
use crate::matcher::PathMatcher;
use crate::parser::ParserRegistry;
use crate::semantic::{SemanticAnalyzer, SemanticConfig};
use crate::types::{file_node_id, symbol_node_id, FileInfo, Node, NodeKind};

use super::resolver::RelationshipResolver;
use super::store::GraphStore;

/// Version string stamped into graph metadata.
const GRAPH_VERSION: &str = "2.0.0";

/// Single-sink observer for progress messages. Called synchronously on the
/// walking thread; callers must not block.
pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Sink for log lines emitted during a build.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Controls progress reporting cadence.
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Emit a parsing progress message every `interval` files. Minimum 1.
    pub interval: usize,
    /// Reserved for callers that precompute a total; the single-pass walk
    /// itself has no total to report a percentage against.
    pub show_percentage: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            interval: 10,
            show_percentage: false,
        }
    }
}

/// Builds a fresh `GraphStore` from a target directory.
pub struct GraphBuilder {
    matcher: Arc<PathMatcher>,
    registry: ParserRegistry,
    progress: Option<ProgressCallback>,
    progress_config: ProgressConfig,
    logger: Option<LogSink>,
    cancel: Option<Arc<AtomicBool>>,
    semantic_config: SemanticConfig,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            matcher: Arc::new(PathMatcher::new()),
            registry: ParserRegistry::new(),
            progress: None,
            progress_config: ProgressConfig::default(),
            logger: None,
            cancel: None,
            semantic_config: SemanticConfig::default(),
        }
    }

    pub fn set_exclude_patterns(&self, patterns: Vec<String>) {
        self.matcher.set_exclude_patterns(patterns);
    }

    pub fn set_use_default_excludes(&self, enabled: bool) {
        self.matcher.set_use_default_excludes(enabled);
    }

    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress = Some(Arc::clone(&callback));
        // Malformed patterns are reported through the same sink.
        let sink = callback;
        self.matcher
            .set_pattern_error_sink(Arc::new(move |pattern, message| {
                sink(&format!("⚠️ Bad pattern '{}': {}", pattern, message));
            }));
    }

    pub fn set_progress_config(&mut self, config: ProgressConfig) {
        self.progress_config = ProgressConfig {
            interval: config.interval.max(1),
            show_percentage: config.show_percentage,
        };
    }

    pub fn set_logger(&mut self, logger: LogSink) {
        self.logger = Some(logger);
    }

    /// Token checked between files; when set, the walk stops with
    /// `Cancelled` and no graph is published.
    pub fn set_cancel_flag(&mut self, cancel: Arc<AtomicBool>) {
        self.cancel = Some(cancel);
    }

    pub fn set_semantic_config(&mut self, config: SemanticConfig) {
        self.semantic_config = config;
    }

    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    fn emit(&self, message: &str) {
        if let Some(cb) = &self.progress {
            cb(message);
        }
    }

    fn log(&self, message: &str) {
        debug!("{message}");
        if let Some(logger) = &self.logger {
            logger(message);
        }
    }

    /// Runs a full analysis of `target_dir` and returns the populated
    /// store. Deterministic: lexicographic depth-first file order, stable
    /// symbol ids, identical output for an unchanged tree.
    pub fn analyze(&self, target_dir: &Path) -> Result<GraphStore> {
        let start = Instant::now();
        let mut store = GraphStore::new();
        {
            let meta = store.metadata_mut();
            meta.generated = chrono::Utc::now().timestamp();
            meta.version = GRAPH_VERSION.to_string();
        }

        let mut file_count: usize = 0;

        for entry in WalkDir::new(target_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| AnalyzerError::Walk {
                message: e.to_string(),
                path: e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            })?;

            if let Some(cancel) = &self.cancel {
                if cancel.load(Ordering::Relaxed) {
                    return Err(AnalyzerError::Cancelled);
                }
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let abs = self
                .matcher
                .normalize_for_pattern(&entry.path().display().to_string());
            let rel = entry
                .path()
                .strip_prefix(target_dir)
                .map(|p| self.matcher.normalize_for_pattern(&p.display().to_string()))
                .unwrap_or_else(|_| abs.clone());

            // Patterns are project-relative; the absolute form would let a
            // root like /tmp/proj or /home/x/vendor shadow every file.
            if self.matcher.should_skip(&rel) {
                continue;
            }

            // Unsupported extensions never enter the graph.
            let classification = match self.registry.classify(&rel) {
                Ok(c) => c,
                Err(_) => continue,
            };

            file_count += 1;
            if file_count % self.progress_config.interval == 0 {
                self.emit(&format!("📄 Parsing files... ({} files)", file_count));
            }

            self.process_file(&mut store, entry.path(), &abs, &classification)?;
        }

        self.emit(&format!("✅ Parsing complete ({} files)", file_count));

        self.emit("🔗 Building relationships...");
        let resolver = RelationshipResolver::new(Arc::clone(&self.matcher));
        resolver.resolve(&mut store);
        self.emit("✅ Relationships built");

        self.emit("📊 Analyzing git history...");
        let analyzer = SemanticAnalyzer::new(self.semantic_config.clone());
        let semantic = analyzer.analyze(target_dir, &store);
        if let Some(error) = &semantic.error {
            warn!(error, "git history analysis failed");
            self.emit("⚠️ Git analysis skipped");
        }
        match serde_json::to_value(&semantic) {
            Ok(value) => {
                store
                    .metadata_mut()
                    .configuration
                    .insert("semantic_neighborhoods".to_string(), value);
            }
            Err(e) => self.log(&format!("failed to serialize semantic result: {e}")),
        }

        let total_symbols = store.symbol_count();
        let meta = store.metadata_mut();
        meta.total_files = file_count;
        meta.total_symbols = total_symbols;
        meta.analysis_time_ms = start.elapsed().as_millis() as u64;

        Ok(store)
    }

    /// Parses one file and registers its symbols, nodes, and record.
    ///
    /// Classification already happened; parse failures propagate and fail
    /// the build, but recoverable syntax errors come back as a partial
    /// outcome and only mark the file.
    fn process_file(
        &self,
        store: &mut GraphStore,
        os_path: &Path,
        key: &str,
        classification: &crate::parser::Classification,
    ) -> Result<()> {
        let source = std::fs::read_to_string(os_path).map_err(|e| AnalyzerError::ParseFailed {
            message: format!("failed to read file: {e}"),
            path: key.to_string(),
        })?;

        let parser = self
            .registry
            .parser_for_language(&classification.language)
            .ok_or_else(|| AnalyzerError::UnsupportedLanguage {
                path: key.to_string(),
            })?;

        let outcome = parser.parse(key, &source)?;

        let fs_meta = std::fs::metadata(os_path)?;
        let last_modified = fs_meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        let mut symbol_ids = Vec::with_capacity(outcome.symbols.len());
        for symbol in outcome.symbols {
            symbol_ids.push(symbol.id.clone());

            let mut metadata = std::collections::HashMap::new();
            metadata.insert(
                "kind".to_string(),
                serde_json::Value::String(symbol.kind.as_str().to_string()),
            );
            if let Some(fw) = symbol.framework_kind {
                metadata.insert(
                    "framework".to_string(),
                    serde_json::Value::String(fw.as_str().to_string()),
                );
            }
            store.insert_node(Node {
                id: symbol_node_id(&symbol.id),
                kind: NodeKind::Symbol,
                label: symbol.name.clone(),
                file_path: key.to_string(),
                metadata,
            });
            store.insert_symbol(symbol);
        }

        store.insert_node(Node {
            id: file_node_id(key),
            kind: NodeKind::File,
            label: key.rsplit('/').next().unwrap_or(key).to_string(),
            file_path: key.to_string(),
            metadata: std::collections::HashMap::new(),
        });

        store.insert_file(FileInfo {
            path: key.to_string(),
            language: classification.language.clone(),
            size: fs_meta.len(),
            lines: source.lines().count() as u32,
            is_test: classification.is_test,
            is_generated: classification.is_generated,
            last_modified,
            symbols: symbol_ids,
            imports: outcome.imports,
            parse_errors: outcome.errors,
            quality: outcome.quality,
        });

        *store
            .metadata_mut()
            .languages
            .entry(classification.language.clone())
            .or_insert(0) += 1;

        Ok(())
    }
}
