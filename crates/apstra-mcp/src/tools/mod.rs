//! Apstra Tools
//!
//! One module per area. Every tool shares the same client and answers with
//! text: a JSON envelope plus instructions, or a one-line error.

pub mod anomalies;
pub mod blueprints;
pub mod config_audits;
pub mod golden_config;
pub mod security_zones;
pub mod systems;
pub mod virtual_networks;

use crate::protocol::TextContent;
use crate::tool_registry::ToolRegistry;
use apstra_api::ApstraClient;
use apstra_core::{Error, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const BLUEPRINT_ID_REQUIRED: &str = "Blueprint ID is required";

/// Register every Apstra tool
pub async fn register_all(registry: &ToolRegistry, client: Arc<ApstraClient>) -> Result<usize> {
    let mut count = 0;
    count += blueprints::register_all(registry, client.clone()).await?;
    count += systems::register_all(registry, client.clone()).await?;
    count += virtual_networks::register_all(registry, client.clone()).await?;
    count += security_zones::register_all(registry, client.clone()).await?;
    count += config_audits::register_all(registry, client.clone()).await?;
    count += anomalies::register_all(registry, client.clone()).await?;
    count += golden_config::register_all(registry, client).await?;

    info!("Loaded {} Apstra tools", count);
    Ok(count)
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Non-empty string argument
pub(crate) fn string_arg(arguments: &Value, key: &str) -> Option<String> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Schema for tools taking only a blueprint name or ID
pub(crate) fn blueprint_schema(purpose: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "blueprint_id": {
                "type": "string",
                "description": format!(
                    "The ID or name/label of the blueprint to get {} for. Can be the exact \
                     blueprint ID (UUID) or the human-readable blueprint label/name.",
                    purpose
                )
            }
        },
        "required": ["blueprint_id"],
        "additionalProperties": false
    })
}

pub(crate) fn text(message: impl Into<String>) -> Vec<TextContent> {
    vec![TextContent::new(message)]
}

/// Turn a tool outcome into its text block.
///
/// Resolution and argument errors are shown as-is, everything else gets the
/// action prefix.
pub(crate) fn respond(action: &str, outcome: Result<String>) -> Vec<TextContent> {
    match outcome {
        Ok(body) => text(body),
        Err(e) if e.is_user_facing() => {
            warn!("{}", e);
            text(e.to_string())
        }
        Err(e) => {
            let message = format!("{}: {}", action, e);
            error!("{}", message);
            text(message)
        }
    }
}

/// Separate a malformed-response error from the rest, keeping its payload
pub(crate) fn split_malformed<T>(result: Result<T>) -> Result<std::result::Result<T, Value>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(Error::MalformedResponse {
            endpoint,
            reason,
            raw,
        }) => {
            warn!(%endpoint, %reason, "Unexpected data format from Apstra API");
            Ok(Err(raw))
        }
        Err(e) => Err(e),
    }
}

/// Value or "N/A"
pub(crate) fn or_na<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or_else(|| Value::from("N/A"))
}

/// Comma-joined tags or "None"
pub(crate) fn join_tags(tags: Option<&Vec<String>>) -> String {
    match tags {
        Some(tags) if !tags.is_empty() => tags.join(", "),
        _ => "None".to_string(),
    }
}
