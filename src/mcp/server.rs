//! MCP server reading JSON-RPC 2.0 messages from stdin and writing
//! responses to stdout.
//!
//! The server owns the current graph snapshot. Every tool call triggers a
//! fresh analyze on its resolved target directory; the resulting store is
//! published by swapping an `Arc`, so a caller holding the previous
//! snapshot keeps reading consistent data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Instant;

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::errors::{AnalyzerError, Result};
use crate::graph::{GraphBuilder, GraphStore, ProgressConfig};
use crate::watcher::FileWatcher;

use super::tools::{get_tool_definitions, handle_tool_call};
use super::transport::{error_code_for, ErrorCode, JsonRpcRequest, JsonRpcResponse};

/// Runtime statistics for the MCP server.
pub struct ServerStats {
    started_at: Instant,
    total_requests: AtomicU64,
    tool_calls: AtomicU64,
    errors: AtomicU64,
}

impl ServerStats {
    fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_requests: AtomicU64::new(0),
            tool_calls: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }
}

/// Settings applied to every analyze triggered by a tool call.
#[derive(Debug, Clone, Default)]
pub struct ServerSettings {
    pub exclude_patterns: Vec<String>,
    pub use_default_excludes: bool,
    pub progress_interval: usize,
}

impl ServerSettings {
    pub fn defaults() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            use_default_excludes: true,
            progress_interval: 10,
        }
    }
}

/// The MCP server wrapping the code graph analyzer.
pub struct McpServer {
    default_target: PathBuf,
    settings: ServerSettings,
    graph: RwLock<Option<Arc<GraphStore>>>,
    watcher: Mutex<Option<FileWatcher>>,
    stopped: RwLock<bool>,
    cancel: Arc<AtomicBool>,
    stats: ServerStats,
    tool_call_counts: Mutex<HashMap<String, u64>>,
}

impl McpServer {
    pub fn new(default_target: PathBuf, settings: ServerSettings) -> Self {
        Self {
            default_target,
            settings,
            graph: RwLock::new(None),
            watcher: Mutex::new(None),
            stopped: RwLock::new(false),
            cancel: Arc::new(AtomicBool::new(false)),
            stats: ServerStats::new(),
            tool_call_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves a tool's optional `target_dir` argument: empty or absent
    /// means the configured default, `~` expands to the user home.
    pub fn resolve_target_dir(&self, arg: Option<&str>) -> PathBuf {
        match arg {
            None | Some("") => self.default_target.clone(),
            Some("~") => dirs::home_dir().unwrap_or_else(|| self.default_target.clone()),
            Some(path) => {
                if let Some(rest) = path.strip_prefix("~/") {
                    if let Some(home) = dirs::home_dir() {
                        return home.join(rest);
                    }
                }
                PathBuf::from(path)
            }
        }
    }

    /// Runs a full analyze on `target_dir` and publishes the new snapshot.
    pub fn refresh(&self, target_dir: &Path) -> Result<Arc<GraphStore>> {
        let mut builder = GraphBuilder::new();
        builder.set_exclude_patterns(self.settings.exclude_patterns.clone());
        builder.set_use_default_excludes(self.settings.use_default_excludes);
        builder.set_progress_config(ProgressConfig {
            interval: self.settings.progress_interval.max(1),
            show_percentage: false,
        });
        builder.set_progress_callback(Arc::new(|message| {
            info!("{message}");
        }));
        // Shutdown interrupts an in-flight analyze between files.
        builder.set_cancel_flag(Arc::clone(&self.cancel));

        let store = Arc::new(builder.analyze(target_dir)?);
        if let Ok(mut slot) = self.graph.write() {
            *slot = Some(Arc::clone(&store));
        }
        Ok(store)
    }

    /// The most recently published snapshot, if any build has completed.
    pub fn current_graph(&self) -> Option<Arc<GraphStore>> {
        self.graph.read().ok().and_then(|g| g.clone())
    }

    /// Starts the file watcher on `target_dir`. Idempotent: if a watcher
    /// is already running for that directory, reports the existing one.
    pub fn start_watcher(&self, target_dir: &Path) -> Result<String> {
        if self.stopped.read().map(|s| *s).unwrap_or(false) {
            return Err(AnalyzerError::Config {
                message: "server is stopped; cannot start watcher".to_string(),
            });
        }
        let mut slot = self.watcher.lock().map_err(|_| AnalyzerError::Config {
            message: "watcher state poisoned".to_string(),
        })?;
        if let Some(existing) = slot.as_ref() {
            if existing.is_running() && existing.root() == target_dir {
                return Ok(format!(
                    "👁️ Already watching {}",
                    target_dir.display()
                ));
            }
        }
        let watcher = FileWatcher::start(target_dir)?;
        *slot = Some(watcher);
        Ok(format!("👁️ Watching {} for changes", target_dir.display()))
    }

    /// Stops the file watcher if one is running. Idempotent.
    pub fn stop_watcher(&self) -> Result<String> {
        let mut slot = self.watcher.lock().map_err(|_| AnalyzerError::Config {
            message: "watcher state poisoned".to_string(),
        })?;
        match slot.take() {
            Some(mut watcher) => {
                watcher.stop();
                Ok("👁️ File watching stopped".to_string())
            }
            None => Ok("👁️ File watching was not active".to_string()),
        }
    }

    /// Marks the server stopped, cancels any in-flight analyze, and tears
    /// down the watcher.
    pub fn shutdown(&self) {
        if let Ok(mut stopped) = self.stopped.write() {
            *stopped = true;
        }
        self.cancel.store(true, Ordering::Relaxed);
        let _ = self.stop_watcher();
        info!(stats = %self.server_stats_json(), "server stopped");
    }

    /// Runs the server, reading JSON-RPC requests from stdin and writing
    /// responses to stdout. Runs until stdin is closed.
    pub async fn run(&self) -> Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();

        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }

            let parsed: std::result::Result<JsonRpcRequest, _> = serde_json::from_str(&line);

            let response = match parsed {
                Ok(request) => self.handle_request(&request),
                Err(e) => Some(JsonRpcResponse::error(
                    Value::Null,
                    ErrorCode::ParseError,
                    format!("failed to parse JSON-RPC request: {}", e),
                )),
            };

            if let Some(resp) = response {
                let json_line = match serde_json::to_string(&resp) {
                    Ok(s) => s,
                    Err(e) => {
                        eprintln!("failed to serialize response: {}", e);
                        continue;
                    }
                };
                let output = format!("{}\n", json_line);
                if let Err(e) = stdout.write_all(output.as_bytes()).await {
                    eprintln!("failed to write response: {}", e);
                    break;
                }
                if let Err(e) = stdout.flush().await {
                    eprintln!("failed to flush stdout: {}", e);
                    break;
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Dispatches a parsed JSON-RPC request to the appropriate handler.
    ///
    /// Returns `None` for notifications (requests without an `id`).
    fn handle_request(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        self.stats.total_requests.fetch_add(1, Ordering::Relaxed);
        let id = request.id.clone();

        let result = match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(id)),
            "initialized" | "notifications/initialized" => None,
            "tools/list" => Some(self.handle_tools_list(id)),
            "tools/call" => Some(self.handle_tools_call(id, &request.params)),
            "ping" => Some(JsonRpcResponse::success(id, json!({}))),
            _ => Some(JsonRpcResponse::error(
                id,
                ErrorCode::MethodNotFound,
                format!("method not found: {}", request.method),
            )),
        };

        if let Some(ref resp) = result {
            if resp.error.is_some() {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
            }
        }

        result
    }

    /// Handles the `initialize` method, returning server capabilities.
    fn handle_initialize(&self, id: Value) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "codecontext",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    /// Handles the `tools/list` method, returning all tool definitions.
    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        let tools = get_tool_definitions();
        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    /// Handles the `tools/call` method, dispatching to the tool handler.
    fn handle_tools_call(&self, id: Value, params: &Option<Value>) -> JsonRpcResponse {
        let params = match params {
            Some(p) => p,
            None => {
                return JsonRpcResponse::error(
                    id,
                    ErrorCode::InvalidParams,
                    "missing params for tools/call".to_string(),
                );
            }
        };

        let tool_name = match params.get("name").and_then(|v| v.as_str()) {
            Some(name) => name,
            None => {
                return JsonRpcResponse::error(
                    id,
                    ErrorCode::InvalidParams,
                    "missing 'name' in tools/call params".to_string(),
                );
            }
        };

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        self.stats.tool_calls.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut counts) = self.tool_call_counts.lock() {
            *counts.entry(tool_name.to_string()).or_insert(0) += 1;
        }

        match handle_tool_call(self, tool_name, arguments) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, error_code_for(&e), e.to_string()),
        }
    }

    /// Returns the current server runtime statistics as a JSON value.
    pub fn server_stats_json(&self) -> Value {
        let uptime = self.stats.started_at.elapsed();
        let tool_counts: Value = self
            .tool_call_counts
            .lock()
            .map(|counts| json!(*counts))
            .unwrap_or(json!({}));

        json!({
            "uptime_secs": uptime.as_secs(),
            "total_requests": self.stats.total_requests.load(Ordering::Relaxed),
            "tool_calls": self.stats.tool_calls.load(Ordering::Relaxed),
            "errors": self.stats.errors.load(Ordering::Relaxed),
            "tool_call_counts": tool_counts,
        })
    }
}
