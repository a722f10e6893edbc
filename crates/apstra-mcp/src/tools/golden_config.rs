//! `apply_system_golden_config`
//!
//! Thin presentation layer over [`crate::remediation`]: the workflow decides,
//! this module renders each terminal state.

use crate::protocol::TextContent;
use crate::remediation::{self, ApplyOutcome, Remediation};
use crate::report::{self, prompts};
use crate::tool_registry::{Tool, ToolAnnotations, ToolRegistry};
use crate::tools::anomalies::AnomalyReport;
use crate::tools::{respond, string_arg, text};
use apstra_api::{AnomalyList, ApstraClient};
use apstra_core::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const SYSTEM_ID_REQUIRED: &str = "System ID is required";

pub async fn register_all(registry: &ToolRegistry, client: Arc<ApstraClient>) -> Result<usize> {
    registry
        .register(Arc::new(GoldenConfigTool::new(client)))
        .await?;
    Ok(1)
}

#[derive(Debug, Serialize)]
struct InSync<'a> {
    status: &'static str,
    message: String,
    system_id: &'a str,
    config_status: &'static str,
    action_required: bool,
}

#[derive(Debug, Serialize)]
struct ConfirmationRequired<'a> {
    status: &'static str,
    message: String,
    system_id: &'a str,
    action_pending: &'static str,
    config_anomalies: AnomalyReport,
}

#[derive(Debug, Serialize)]
struct ApplyResult<'a> {
    status: &'static str,
    message: &'a str,
    system_id: &'a str,
    action_completed: &'static str,
    success: bool,
    response_data: &'a Value,
}

fn format_in_sync(system_id: &str) -> Result<String> {
    report::render(
        &InSync {
            status: "no_action_needed",
            message: format!("System '{}' has no configuration anomalies", system_id),
            system_id,
            config_status: "in_sync",
            action_required: false,
        },
        prompts::GOLDEN_CONFIG_IN_SYNC,
    )
}

fn format_confirmation(system_id: &str, anomalies: &AnomalyList) -> Result<String> {
    report::render(
        &ConfirmationRequired {
            status: "confirmation_required",
            message: format!(
                "Configuration anomalies detected for system '{}' - confirmation required \
                 before applying golden config",
                system_id
            ),
            system_id,
            action_pending: "apply_golden_config",
            config_anomalies: AnomalyReport::build(
                &format!("system '{}'", system_id),
                system_id,
                anomalies,
            ),
        },
        prompts::GOLDEN_CONFIG_CONFIRM,
    )
}

fn format_result(system_id: &str, outcome: &ApplyOutcome, response: &Value) -> Result<String> {
    report::render(
        &ApplyResult {
            status: if outcome.success { "applied" } else { "failed" },
            message: &outcome.message,
            system_id,
            action_completed: "apply_golden_config",
            success: outcome.success,
            response_data: response,
        },
        prompts::GOLDEN_CONFIG_RESULT,
    )
}

/// Render a finished workflow
pub fn format_remediation(system_id: &str, remediation: &Remediation) -> Result<String> {
    match remediation {
        Remediation::NoAction => format_in_sync(system_id),
        Remediation::AwaitingConfirmation { anomalies } => {
            format_confirmation(system_id, anomalies)
        }
        Remediation::Applied { outcome, response } => format_result(system_id, outcome, response),
    }
}

pub struct GoldenConfigTool {
    client: Arc<ApstraClient>,
}

impl GoldenConfigTool {
    pub fn new(client: Arc<ApstraClient>) -> Self {
        Self { client }
    }

    async fn run(&self, system_id: &str, confirmation: Option<&str>) -> Result<String> {
        let outcome = remediation::run(&self.client, system_id, confirmation).await?;
        format_remediation(system_id, &outcome)
    }
}

#[async_trait]
impl Tool for GoldenConfigTool {
    fn name(&self) -> &str {
        "apply_system_golden_config"
    }

    fn description(&self) -> &str {
        "Apply golden configuration to a specific system to resolve configuration anomalies. \
         First checks the system for config anomalies and shows the configuration diff. \
         Nothing is changed unless confirmation is set to 'yes', 'y', 'confirm' or 'apply', \
         in which case anomalies are re-checked and the full golden configuration is pushed."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "system_id": {
                    "type": "string",
                    "description": "The system ID (serial number) to apply the golden configuration to"
                },
                "confirmation": {
                    "type": "string",
                    "description": "Set to 'yes' after reviewing the diff to apply the golden configuration"
                }
            },
            "required": ["system_id"],
            "additionalProperties": false
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::destructive("Apply golden config")
    }

    async fn execute(&self, arguments: Value) -> Result<Vec<TextContent>> {
        let Some(system_id) = string_arg(&arguments, "system_id") else {
            return Ok(text(SYSTEM_ID_REQUIRED));
        };
        let confirmation = arguments.get("confirmation").and_then(Value::as_str);
        Ok(respond(
            "Error applying golden config",
            self.run(&system_id, confirmation).await,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(out: &str) -> Value {
        let (json_part, prompt) = out.split_once("\n\n---").unwrap();
        assert!(prompt.contains("INSTRUCTION"));
        serde_json::from_str(json_part).unwrap()
    }

    #[test]
    fn test_in_sync() {
        let parsed = envelope(&format_remediation("S1", &Remediation::NoAction).unwrap());
        assert_eq!(parsed["status"], "no_action_needed");
        assert_eq!(parsed["message"], "System 'S1' has no configuration anomalies");
        assert_eq!(parsed["config_status"], "in_sync");
        assert_eq!(parsed["action_required"], false);
    }

    #[test]
    fn test_confirmation_embeds_report() {
        let anomalies: AnomalyList = serde_json::from_value(json!({"items": [
            {"anomaly_type": "config", "identity": {"system_id": "S1"},
             "expected": {"config": "a\nb\n"}, "actual": {"config": "a\nc\n"}}
        ]}))
        .unwrap();

        let out = format_remediation("S1", &Remediation::AwaitingConfirmation { anomalies }).unwrap();
        let parsed = envelope(&out);
        assert_eq!(parsed["status"], "confirmation_required");
        assert_eq!(parsed["action_pending"], "apply_golden_config");
        let report = &parsed["config_anomalies"];
        assert_eq!(report["context"], "system 'S1'");
        assert_eq!(report["total_anomalies"], 1);
        let diff = report["anomalies_by_type"]["config"][0]["ACTUAL_STATE"]
            .as_str()
            .unwrap();
        assert!(diff.contains("-b") && diff.contains("+c"));
    }

    #[test]
    fn test_apply_result() {
        let response = json!({"error": "locked", "message": "Device busy"});
        let outcome = ApplyOutcome::classify(&response);
        let parsed = envelope(
            &format_remediation("S1", &Remediation::Applied { outcome, response }).unwrap(),
        );
        assert_eq!(parsed["status"], "failed");
        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["response_data"]["error"], "locked");
        assert_eq!(
            parsed["message"],
            "Failed to apply golden configuration: Device busy"
        );
    }
}
