//! `get_virtual_networks`

use crate::protocol::TextContent;
use crate::report::{self, prompts};
use crate::tool_registry::{Tool, ToolAnnotations, ToolRegistry};
use crate::tools::{
    blueprint_schema, join_tags, or_na, respond, split_malformed, string_arg, text,
    BLUEPRINT_ID_REQUIRED,
};
use apstra_api::{ApstraClient, VirtualNetwork};
use apstra_core::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub async fn register_all(registry: &ToolRegistry, client: Arc<ApstraClient>) -> Result<usize> {
    registry
        .register(Arc::new(VirtualNetworksTool::new(client)))
        .await?;
    Ok(1)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct VirtualNetworkRecord {
    pub name: Value,
    pub id: Value,
    pub ipv4_cidr: Value,
    pub ipv4_anycast_gw: Value,
    pub ipv6_cidr: Value,
    pub ipv6_anycast_gw: Value,
    pub vxlan_vnid: Value,
    pub vrf_target: Value,
    pub mtu: Value,
    pub vlan_id: Value,
    pub tags: String,
}

impl VirtualNetworkRecord {
    /// `key` is the map key, used when the network carries no `id`
    fn new(key: &str, vn: &VirtualNetwork) -> Self {
        Self {
            name: or_na(vn.label.clone()),
            id: Value::from(vn.id.clone().unwrap_or_else(|| key.to_string())),
            ipv4_cidr: or_na(vn.ipv4_subnet.clone()),
            ipv4_anycast_gw: or_na(vn.virtual_gateway_ipv4.clone()),
            ipv6_cidr: or_na(vn.ipv6_subnet.clone()),
            ipv6_anycast_gw: or_na(vn.virtual_gateway_ipv6.clone()),
            vxlan_vnid: or_na(vn.vn_id.clone()),
            vrf_target: or_na(vn.route_target.clone()),
            mtu: or_na(vn.l3_mtu.clone()),
            vlan_id: or_na(vn.reserved_vlan_id.clone()),
            tags: join_tags(vn.tags.as_ref()),
        }
    }
}

pub fn format_virtual_networks(
    blueprint_name: &str,
    networks: &BTreeMap<String, VirtualNetwork>,
) -> Result<String> {
    if networks.is_empty() {
        return report::render_bare(&json!({
            "status": "no_data",
            "message": format!("No virtual networks found in blueprint '{}'", blueprint_name),
            "blueprint_name": blueprint_name,
            "total_virtual_networks": 0,
            "virtual_networks": [],
        }));
    }

    let records: Vec<VirtualNetworkRecord> = networks
        .iter()
        .map(|(key, vn)| VirtualNetworkRecord::new(key, vn))
        .collect();

    report::render(
        &json!({
            "status": "success",
            "message": format!(
                "Retrieved {} virtual networks from blueprint '{}'",
                records.len(),
                blueprint_name
            ),
            "blueprint_name": blueprint_name,
            "total_virtual_networks": records.len(),
            "virtual_networks": records,
        }),
        prompts::VIRTUAL_NETWORKS,
    )
}

pub struct VirtualNetworksTool {
    client: Arc<ApstraClient>,
}

impl VirtualNetworksTool {
    pub fn new(client: Arc<ApstraClient>) -> Self {
        Self { client }
    }

    async fn run(&self, blueprint: &str) -> Result<String> {
        let resolved = self.client.resolve_blueprint(blueprint).await?;
        let name = resolved.display_name();
        info!(blueprint = name, id = %resolved.id, "Fetching virtual networks");

        match split_malformed(self.client.virtual_networks(&resolved.id).await)? {
            Ok(map) => format_virtual_networks(name, &map.into_networks()),
            Err(raw) => report::unexpected_format(raw),
        }
    }
}

#[async_trait]
impl Tool for VirtualNetworksTool {
    fn name(&self) -> &str {
        "get_virtual_networks"
    }

    fn description(&self) -> &str {
        "Get virtual networks information for a specific blueprint. \
         Accepts blueprint ID or name. Returns a table with VN names, IDs, IPv4/IPv6 subnets, \
         anycast gateways, VXLAN VNIs, VRF targets, MTU, VLAN IDs, and tags."
    }

    fn input_schema(&self) -> Value {
        blueprint_schema("virtual networks")
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only("Virtual networks")
    }

    async fn execute(&self, arguments: Value) -> Result<Vec<TextContent>> {
        let Some(blueprint) = string_arg(&arguments, "blueprint_id") else {
            return Ok(text(BLUEPRINT_ID_REQUIRED));
        };
        Ok(respond("Error getting virtual networks", self.run(&blueprint).await))
    }
}
