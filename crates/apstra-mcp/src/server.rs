//! MCP Server
//!
//! Transport-agnostic request dispatcher: handshake, tool listing and tool
//! execution on top of a [`ToolRegistry`].

use crate::protocol::{CallToolResult, JsonRpcError, McpRequest, McpResponse};
use crate::tool_registry::{ToolAnnotations, ToolRegistry};
use crate::{PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};
use apstra_core::Error;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Server configuration
#[derive(Debug, Clone, Default)]
pub struct McpServerConfig {
    /// Server name override
    pub name: Option<String>,
}

/// Tool information for MCP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

pub struct McpServer {
    config: McpServerConfig,
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(config: McpServerConfig, registry: Arc<ToolRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn name(&self) -> &str {
        self.config.name.as_deref().unwrap_or(SERVER_NAME)
    }

    /// Handle an MCP request
    pub async fn handle_request(&self, request: McpRequest) -> McpResponse {
        debug!(method = %request.method, "Handling MCP request");

        match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "ping" => McpResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request).await,
            "tools/call" => self.handle_tools_call(request).await,
            method if method.starts_with("notifications/") => {
                debug!(method, "Notification received");
                McpResponse::success(request.id, json!({}))
            }
            _ => McpResponse::error(request.id, JsonRpcError::method_not_found(&request.method)),
        }
    }

    fn handle_initialize(&self, request: McpRequest) -> McpResponse {
        let client_info = request.params.as_ref().and_then(|p| p.get("clientInfo"));
        let client_name = client_info
            .and_then(|ci| ci.get("name"))
            .and_then(|n| n.as_str())
            .unwrap_or("unknown");
        let client_version = client_info
            .and_then(|ci| ci.get("version"))
            .and_then(|v| v.as_str())
            .unwrap_or("?");

        info!(client = %client_name, version = %client_version, "Client connected");

        McpResponse::success(
            request.id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": { "listChanged": false }
                },
                "serverInfo": {
                    "name": self.name(),
                    "version": SERVER_VERSION
                }
            }),
        )
    }

    async fn handle_tools_list(&self, request: McpRequest) -> McpResponse {
        let tools: Vec<ToolInfo> = self
            .registry
            .list()
            .await
            .into_iter()
            .map(|t| {
                let annotations = t.annotations();
                ToolInfo {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    input_schema: t.input_schema(),
                    annotations: (annotations != ToolAnnotations::default()).then_some(annotations),
                }
            })
            .collect();

        McpResponse::success(request.id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, request: McpRequest) -> McpResponse {
        let params = match &request.params {
            Some(p) => p,
            None => {
                return McpResponse::error(request.id, JsonRpcError::invalid_params("Missing params"))
            }
        };

        let tool_name = match params.get("name").and_then(|n| n.as_str()) {
            Some(n) => n.to_string(),
            None => {
                return McpResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing tool name"),
                )
            }
        };

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(args) if args.is_object() => args.clone(),
            Some(_) => {
                return McpResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Tool arguments must be an object"),
                )
            }
        };

        info!(tool = %tool_name, "Tool called");

        let result = match self.registry.execute(&tool_name, arguments).await {
            Ok(content) => {
                info!(tool = %tool_name, "Tool completed");
                CallToolResult::ok(content)
            }
            Err(Error::UnknownTool(name)) => {
                warn!(tool = %name, "Unknown tool requested");
                return McpResponse::error(
                    request.id,
                    JsonRpcError::invalid_params(format!("Unknown tool: {}", name)),
                );
            }
            Err(e) => {
                error!(tool = %tool_name, error = %e, "Tool failed");
                CallToolResult::error(format!("Error in tool {}: {}", tool_name, e))
            }
        };

        match serde_json::to_value(&result) {
            Ok(value) => McpResponse::success(request.id, value),
            Err(e) => McpResponse::error(request.id, JsonRpcError::internal_error(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TextContent;
    use crate::tool_registry::Tool;
    use apstra_core::Result;
    use async_trait::async_trait;

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "explode"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {}, "additionalProperties": false})
        }
        fn annotations(&self) -> ToolAnnotations {
            ToolAnnotations::read_only("Explode")
        }
        async fn execute(&self, _arguments: Value) -> Result<Vec<TextContent>> {
            Err(Error::config("boom"))
        }
    }

    async fn server() -> McpServer {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(Arc::new(FailingTool)).await.unwrap();
        McpServer::new(McpServerConfig::default(), registry)
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = server().await;
        let resp = server
            .handle_request(McpRequest::new("initialize").with_id(1))
            .await;
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "apstra");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_name_override() {
        let registry = Arc::new(ToolRegistry::new());
        let server = McpServer::new(
            McpServerConfig {
                name: Some("lab-apstra".to_string()),
            },
            registry,
        );
        let resp = server
            .handle_request(McpRequest::new("initialize").with_id(1))
            .await;
        assert_eq!(resp.result.unwrap()["serverInfo"]["name"], "lab-apstra");
    }

    #[tokio::test]
    async fn test_tools_list_includes_annotations() {
        let server = server().await;
        let resp = server
            .handle_request(McpRequest::new("tools/list").with_id(2))
            .await;
        let tools = resp.result.unwrap()["tools"].clone();
        assert_eq!(tools[0]["name"], "explode");
        assert_eq!(tools[0]["annotations"]["readOnlyHint"], true);
        assert_eq!(tools[0]["inputSchema"]["additionalProperties"], false);
    }

    #[tokio::test]
    async fn test_tool_failure_becomes_error_text() {
        let server = server().await;
        let resp = server
            .handle_request(
                McpRequest::new("tools/call")
                    .with_id(3)
                    .with_params(json!({"name": "explode", "arguments": {}})),
            )
            .await;
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "Error in tool explode: Configuration error: boom"
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let server = server().await;
        let resp = server
            .handle_request(
                McpRequest::new("tools/call")
                    .with_id(4)
                    .with_params(json!({"name": "nope"})),
            )
            .await;
        let error = resp.error.unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = server().await;
        let resp = server
            .handle_request(McpRequest::new("resources/list").with_id(5))
            .await;
        assert_eq!(resp.error.unwrap().code, -32601);
    }
}
