//! MCP (Model Context Protocol) server for the code graph.
//!
//! Provides a JSON-RPC 2.0 interface over stdio so that AI assistants can
//! query codebase structure on demand. Exposes tools for overview, file
//! and symbol lookup, search, dependencies, file watching, semantic
//! neighborhoods, and framework analysis.

/// MCP server implementation.
pub mod server;

/// Tool definitions and dispatch.
pub mod tools;

/// JSON-RPC 2.0 transport types.
pub mod transport;

pub use server::{McpServer, ServerSettings};
pub use tools::{get_tool_definitions, handle_tool_call, ToolDefinition};
pub use transport::{ErrorCode, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
