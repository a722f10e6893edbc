//! `get_config_audits`: deployment and drift state of a blueprint

use crate::protocol::TextContent;
use crate::report::{self, prompts};
use crate::tool_registry::{Tool, ToolAnnotations, ToolRegistry};
use crate::tools::{
    blueprint_schema, or_na, respond, split_malformed, string_arg, text, BLUEPRINT_ID_REQUIRED,
};
use apstra_api::{ApstraClient, ConfigMismatch, ConfigurationStatus, DeploymentStats, DeviceStatus};
use apstra_core::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub async fn register_all(registry: &ToolRegistry, client: Arc<ApstraClient>) -> Result<usize> {
    registry
        .register(Arc::new(ConfigAuditsTool::new(client)))
        .await?;
    Ok(1)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct MismatchRecord {
    pub system_id: Value,
    pub config_mismatched_since: Value,
}

impl From<&ConfigMismatch> for MismatchRecord {
    fn from(m: &ConfigMismatch) -> Self {
        Self {
            system_id: or_na(m.system_id.clone()),
            config_mismatched_since: or_na(m.config_mismatched_since.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DeviceRecord {
    pub system_id: Value,
    pub state: Value,
    pub config_type: Value,
    pub deploy_stage: Value,
    pub error_message: String,
    pub last_modified_at: Value,
}

impl From<&DeviceStatus> for DeviceRecord {
    fn from(d: &DeviceStatus) -> Self {
        Self {
            system_id: or_na(d.system_id.clone()),
            state: or_na(d.state.clone()),
            config_type: or_na(d.config_type.clone()),
            deploy_stage: or_na(d.deploy_stage.clone()),
            error_message: d
                .error_message
                .clone()
                .filter(|msg| !msg.is_empty())
                .unwrap_or_else(|| "None".to_string()),
            last_modified_at: or_na(d.last_modified_at.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DeploymentRecord {
    pub succeeded: u64,
    pub failed: u64,
    pub pending: u64,
}

impl From<&DeploymentStats> for DeploymentRecord {
    fn from(s: &DeploymentStats) -> Self {
        Self {
            succeeded: s.num_succeeded.unwrap_or(0),
            failed: s.num_failed.unwrap_or(0),
            pending: s.num_pending.unwrap_or(0),
        }
    }
}

pub fn format_config_audits(blueprint_name: &str, status: &ConfigurationStatus) -> Result<String> {
    let mismatches: Vec<MismatchRecord> = status
        .config_mismatch
        .iter()
        .flatten()
        .map(Into::into)
        .collect();
    let devices: Vec<DeviceRecord> = status
        .device_status
        .iter()
        .flatten()
        .map(Into::into)
        .collect();
    let deployment: BTreeMap<String, DeploymentRecord> = status
        .deployment_status
        .iter()
        .flatten()
        .map(|(config_type, stats)| (config_type.to_uppercase(), stats.into()))
        .collect();

    report::render(
        &json!({
            "status": "success",
            "message": format!(
                "Retrieved configuration audit data for blueprint '{}'",
                blueprint_name
            ),
            "blueprint_name": blueprint_name,
            "total_devices": status.total_devices.unwrap_or(0),
            "overall_state": or_na(status.state.clone()),
            "last_modified_at": or_na(status.last_modified_at.clone()),
            "config_mismatches": {
                "total_count": mismatches.len(),
                "mismatches": mismatches,
            },
            "device_status": {
                "total_count": devices.len(),
                "devices": devices,
            },
            "deployment_status": deployment,
        }),
        prompts::CONFIG_AUDITS,
    )
}

pub struct ConfigAuditsTool {
    client: Arc<ApstraClient>,
}

impl ConfigAuditsTool {
    pub fn new(client: Arc<ApstraClient>) -> Self {
        Self { client }
    }

    async fn run(&self, blueprint: &str) -> Result<String> {
        let resolved = self.client.resolve_blueprint(blueprint).await?;
        let name = resolved.display_name();
        info!(blueprint = name, id = %resolved.id, "Fetching configuration audit");

        match split_malformed(self.client.configuration(&resolved.id).await)? {
            Ok(status) => format_config_audits(name, &status),
            Err(raw) => report::unexpected_format(raw),
        }
    }
}

#[async_trait]
impl Tool for ConfigAuditsTool {
    fn name(&self) -> &str {
        "get_config_audits"
    }

    fn description(&self) -> &str {
        "Get configuration audit information for a specific blueprint. \
         Accepts blueprint ID or name. Returns configuration mismatches, per-device deployment \
         status, and deployment counters by config type."
    }

    fn input_schema(&self) -> Value {
        blueprint_schema("configuration audits")
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only("Configuration audits")
    }

    async fn execute(&self, arguments: Value) -> Result<Vec<TextContent>> {
        let Some(blueprint) = string_arg(&arguments, "blueprint_id") else {
            return Ok(text(BLUEPRINT_ID_REQUIRED));
        };
        Ok(respond(
            "Error getting configuration audits",
            self.run(&blueprint).await,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_envelope() {
        let status: ConfigurationStatus = serde_json::from_value(json!({
            "config_mismatch": [
                {"system_id": "S1", "config_mismatched_since": "2024-05-01T10:00:00Z"}
            ],
            "device_status": [
                {"system_id": "S1", "state": "deployed", "error_message": ""},
                {"system_id": "S2", "state": "error", "error_message": "commit failed"}
            ],
            "deployment_status": {
                "service_config": {"num_succeeded": 3, "num_failed": 1},
                "drain": {"num_pending": 2}
            },
            "total_devices": 2,
            "state": "mismatch"
        }))
        .unwrap();

        let out = format_config_audits("dc1", &status).unwrap();
        let (json_part, _) = out.split_once("\n\n---").unwrap();
        let parsed: Value = serde_json::from_str(json_part).unwrap();

        assert_eq!(parsed["total_devices"], 2);
        assert_eq!(parsed["overall_state"], "mismatch");
        assert_eq!(parsed["last_modified_at"], "N/A");
        assert_eq!(parsed["config_mismatches"]["total_count"], 1);
        assert_eq!(parsed["device_status"]["devices"][0]["ERROR_MESSAGE"], "None");
        assert_eq!(
            parsed["device_status"]["devices"][1]["ERROR_MESSAGE"],
            "commit failed"
        );
        assert_eq!(parsed["deployment_status"]["SERVICE_CONFIG"]["FAILED"], 1);
        assert_eq!(parsed["deployment_status"]["DRAIN"]["PENDING"], 2);
        assert_eq!(parsed["deployment_status"]["DRAIN"]["SUCCEEDED"], 0);
    }

    #[test]
    fn test_empty_audit() {
        let out = format_config_audits("dc1", &ConfigurationStatus::default()).unwrap();
        let (json_part, _) = out.split_once("\n\n---").unwrap();
        let parsed: Value = serde_json::from_str(json_part).unwrap();
        assert_eq!(parsed["total_devices"], 0);
        assert_eq!(parsed["device_status"]["total_count"], 0);
        assert_eq!(parsed["deployment_status"], json!({}));
    }
}
