//! Response rendering
//!
//! A tool response is the pretty-printed JSON envelope, optionally followed
//! by a blank line and a markdown instruction block for the calling LLM.

use apstra_core::Result;
use serde::Serialize;
use serde_json::{json, Value};

/// Instruction blocks appended to tool output
pub mod prompts {
    pub const LIST_BLUEPRINTS: &str = include_str!("../prompts/list_blueprints.md");
    pub const BLUEPRINT_DETAILS: &str = include_str!("../prompts/blueprint_details.md");
    pub const SYSTEM_DETAILS: &str = include_str!("../prompts/system_details.md");
    pub const VIRTUAL_NETWORKS: &str = include_str!("../prompts/virtual_networks.md");
    pub const SECURITY_ZONES: &str = include_str!("../prompts/security_zones.md");
    pub const SECURITY_ZONES_EMPTY: &str = include_str!("../prompts/security_zones_empty.md");
    pub const CONFIG_AUDITS: &str = include_str!("../prompts/config_audits.md");
    pub const ANOMALIES: &str = include_str!("../prompts/anomalies.md");
    pub const GOLDEN_CONFIG_IN_SYNC: &str = include_str!("../prompts/golden_config_in_sync.md");
    pub const GOLDEN_CONFIG_CONFIRM: &str = include_str!("../prompts/golden_config_confirm.md");
    pub const GOLDEN_CONFIG_RESULT: &str = include_str!("../prompts/golden_config_result.md");
}

/// Message used when the upstream payload has an unexpected shape
pub const UNEXPECTED_FORMAT: &str = "Unexpected data format from Apstra API";

/// Envelope followed by an instruction block
pub fn render<T: Serialize + ?Sized>(envelope: &T, prompt: &str) -> Result<String> {
    let mut out = serde_json::to_string_pretty(envelope)?;
    out.push_str("\n\n");
    out.push_str(prompt);
    Ok(out)
}

/// Envelope on its own
pub fn render_bare<T: Serialize + ?Sized>(envelope: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(envelope)?)
}

/// `{status: "error", message, raw_data}` for payloads that failed to decode
pub fn unexpected_format(raw: Value) -> Result<String> {
    render_bare(&json!({
        "status": "error",
        "message": UNEXPECTED_FORMAT,
        "raw_data": raw,
    }))
}
