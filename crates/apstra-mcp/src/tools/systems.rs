//! `get_system_details`: switches and servers of one blueprint

use crate::protocol::TextContent;
use crate::report::{self, prompts};
use crate::tool_registry::{Tool, ToolAnnotations, ToolRegistry};
use crate::tools::{
    blueprint_schema, join_tags, or_na, respond, split_malformed, string_arg, text,
    BLUEPRINT_ID_REQUIRED,
};
use apstra_api::{ApstraClient, SystemInfo};
use apstra_core::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub async fn register_all(registry: &ToolRegistry, client: Arc<ApstraClient>) -> Result<usize> {
    registry
        .register(Arc::new(SystemDetailsTool::new(client)))
        .await?;
    Ok(1)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SystemRecord {
    pub name: Value,
    pub hostname: Value,
    pub serial_no: Value,
    pub device_role: Value,
    pub loopback_address: Value,
    pub ebgp_asn: Value,
    pub deploy_mode: Value,
    pub management_level: Value,
    pub tags: String,
}

impl From<&SystemInfo> for SystemRecord {
    fn from(system: &SystemInfo) -> Self {
        Self {
            name: or_na(system.label.clone()),
            hostname: or_na(system.hostname.clone()),
            serial_no: or_na(system.system_id.clone()),
            device_role: or_na(system.role.clone()),
            loopback_address: or_na(
                system
                    .loopback
                    .as_ref()
                    .and_then(|lo| lo.ipv4_addr.clone()),
            ),
            ebgp_asn: or_na(system.domain_id.clone()),
            deploy_mode: or_na(system.deploy_mode.clone()),
            management_level: or_na(system.management_level.clone()),
            tags: join_tags(system.tags.as_ref()),
        }
    }
}

pub fn format_systems(blueprint_name: &str, systems: &[SystemInfo]) -> Result<String> {
    if systems.is_empty() {
        return report::render_bare(&json!({
            "status": "no_data",
            "message": format!("No systems found in blueprint '{}'", blueprint_name),
            "blueprint_name": blueprint_name,
            "total_systems": 0,
            "systems": [],
        }));
    }

    let records: Vec<SystemRecord> = systems.iter().map(Into::into).collect();
    report::render(
        &json!({
            "status": "success",
            "message": format!(
                "Retrieved {} systems from blueprint '{}'",
                records.len(),
                blueprint_name
            ),
            "blueprint_name": blueprint_name,
            "total_systems": records.len(),
            "systems": records,
        }),
        prompts::SYSTEM_DETAILS,
    )
}

pub struct SystemDetailsTool {
    client: Arc<ApstraClient>,
}

impl SystemDetailsTool {
    pub fn new(client: Arc<ApstraClient>) -> Self {
        Self { client }
    }

    async fn run(&self, blueprint: &str) -> Result<String> {
        let resolved = self.client.resolve_blueprint(blueprint).await?;
        let name = resolved.display_name();
        info!(blueprint = name, id = %resolved.id, "Fetching system info");

        match split_malformed(self.client.system_info(&resolved.id).await)? {
            Ok(list) => format_systems(name, &list.data),
            Err(raw) => report::unexpected_format(raw),
        }
    }
}

#[async_trait]
impl Tool for SystemDetailsTool {
    fn name(&self) -> &str {
        "get_system_details"
    }

    fn description(&self) -> &str {
        "Get detailed system information for all switches/systems in a specific blueprint. \
         Accepts blueprint ID or name. Returns a table with system names, hostnames, serial numbers, \
         device roles, loopback addresses, ASNs, deploy modes, management levels, and tags."
    }

    fn input_schema(&self) -> Value {
        blueprint_schema("system details")
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only("System details")
    }

    async fn execute(&self, arguments: Value) -> Result<Vec<TextContent>> {
        let Some(blueprint) = string_arg(&arguments, "blueprint_id") else {
            return Ok(text(BLUEPRINT_ID_REQUIRED));
        };
        Ok(respond("Error getting system details", self.run(&blueprint).await))
    }
}
