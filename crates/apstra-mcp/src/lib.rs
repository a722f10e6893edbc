//! apstra-mcp: MCP server for Apstra-managed fabrics
//!
//! Exposes blueprint, system, virtual network, security zone, configuration
//! audit and anomaly views of an Apstra controller as MCP tools, plus a
//! confirmation-gated golden configuration push.
//!
//! Architecture:
//! stdin → MCP JSON-RPC → McpServer → Tool → ApstraClient → stdout
//!
//! Every tool answers with pretty-printed JSON followed by a markdown
//! instruction block telling the calling LLM how to present it.

pub mod diff;
pub mod protocol;
pub mod remediation;
pub mod report;
pub mod server;
pub mod tool_registry;
pub mod tools;
pub mod transport;

pub use protocol::{JsonRpcError, McpRequest, McpResponse, TextContent};
pub use server::{McpServer, McpServerConfig, ToolInfo};
pub use tool_registry::{BoxedTool, Tool, ToolAnnotations, ToolRegistry};

/// MCP protocol revision spoken by this server
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Default server name reported on initialize
pub const SERVER_NAME: &str = "apstra";

pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
