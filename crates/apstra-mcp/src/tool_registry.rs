//! Tool Registry
//!
//! All tools are registered once at startup. Listing keeps registration
//! order so clients see a stable tool list.

use apstra_core::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::protocol::TextContent;

/// Behaviour hints advertised in `tools/list`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotent_hint: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_world_hint: Option<bool>,
}

impl ToolAnnotations {
    /// Fetches data, changes nothing
    pub fn read_only(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            read_only_hint: Some(true),
            destructive_hint: Some(false),
            idempotent_hint: Some(true),
            open_world_hint: Some(true),
        }
    }

    /// Modifies device state
    pub fn destructive(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            read_only_hint: Some(false),
            destructive_hint: Some(true),
            idempotent_hint: Some(false),
            open_world_hint: Some(true),
        }
    }
}

/// An MCP tool
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> Value;
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::default()
    }

    /// Run the tool. Expected failures (bad arguments, unknown blueprint,
    /// API errors) come back as text; `Err` is reserved for the unexpected.
    async fn execute(&self, arguments: Value) -> Result<Vec<TextContent>>;
}

pub type BoxedTool = Arc<dyn Tool>;

/// Name-indexed tool registry
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, BoxedTool>>,
    order: RwLock<Vec<String>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Register a tool. Names must be unique.
    pub async fn register(&self, tool: BoxedTool) -> Result<()> {
        let name = tool.name().to_string();

        let mut tools = self.tools.write().await;
        if tools.contains_key(&name) {
            return Err(Error::config(format!("tool registered twice: {}", name)));
        }
        tools.insert(name.clone(), tool);
        self.order.write().await.push(name.clone());

        debug!("Registered tool: {}", name);
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Option<BoxedTool> {
        self.tools.read().await.get(name).cloned()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, arguments: Value) -> Result<Vec<TextContent>> {
        let tool = self
            .get(name)
            .await
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;
        tool.execute(arguments).await
    }

    /// All tools in registration order
    pub async fn list(&self) -> Vec<BoxedTool> {
        let tools = self.tools.read().await;
        self.order
            .read()
            .await
            .iter()
            .filter_map(|name| tools.get(name).cloned())
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.tools.read().await.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
