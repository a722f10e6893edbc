//! Blueprint Tools
//!
//! `list_blueprints` and `get_blueprint_details`.

use crate::protocol::TextContent;
use crate::report::{self, prompts};
use crate::tool_registry::{Tool, ToolAnnotations, ToolRegistry};
use crate::tools::{
    blueprint_schema, or_na, respond, split_malformed, string_arg, text, BLUEPRINT_ID_REQUIRED,
};
use apstra_api::{ApstraClient, BlueprintGraph, BlueprintNode, BlueprintSummary};
use apstra_core::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub async fn register_all(registry: &ToolRegistry, client: Arc<ApstraClient>) -> Result<usize> {
    registry
        .register(Arc::new(ListBlueprintsTool::new(client.clone())))
        .await?;
    registry
        .register(Arc::new(BlueprintDetailsTool::new(client)))
        .await?;
    Ok(2)
}

/// Infrastructure row of `list_blueprints`
#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct BlueprintRecord {
    pub name: Value,
    pub id: Value,
    pub spines: u64,
    pub leafs: u64,
    pub generic_systems: u64,
    pub virtual_networks: u64,
    pub security_zones: u64,
    pub modified_at: Value,
    pub build_errors: u64,
}

impl From<&BlueprintSummary> for BlueprintRecord {
    fn from(bp: &BlueprintSummary) -> Self {
        Self {
            name: or_na(bp.label.clone()),
            id: or_na(bp.id.clone()),
            spines: bp.spine_count.unwrap_or(0),
            leafs: bp.leaf_count.unwrap_or(0),
            generic_systems: bp.generic_count.unwrap_or(0),
            virtual_networks: bp.virtual_network_count.unwrap_or(0),
            security_zones: bp.security_zone_count.unwrap_or(0),
            modified_at: or_na(bp.last_modified_at.clone()),
            build_errors: bp.build_errors_count.unwrap_or(0),
        }
    }
}

/// Anomaly-count row of `list_blueprints`, one column per anomaly family
#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct BlueprintAnomalyRecord {
    pub blueprint_name: Value,
    pub blueprint_id: Value,
    pub arp: u64,
    pub mlag: u64,
    pub interface: u64,
    pub series: u64,
    pub config: u64,
    pub hostname: u64,
    pub route: u64,
    pub all: u64,
    pub bgp: u64,
    pub liveness: u64,
    pub counter: u64,
    pub blueprint_rendering: u64,
    pub probe: u64,
    pub deployment: u64,
    pub cabling: u64,
    pub lag: u64,
    pub mac: u64,
    pub streaming: u64,
}

impl From<&BlueprintSummary> for BlueprintAnomalyRecord {
    fn from(bp: &BlueprintSummary) -> Self {
        Self {
            blueprint_name: or_na(bp.label.clone()),
            blueprint_id: or_na(bp.id.clone()),
            arp: bp.anomaly_count("arp"),
            mlag: bp.anomaly_count("mlag"),
            interface: bp.anomaly_count("interface"),
            series: bp.anomaly_count("series"),
            config: bp.anomaly_count("config"),
            hostname: bp.anomaly_count("hostname"),
            route: bp.anomaly_count("route"),
            all: bp.anomaly_count("all"),
            bgp: bp.anomaly_count("bgp"),
            liveness: bp.anomaly_count("liveness"),
            counter: bp.anomaly_count("counter"),
            blueprint_rendering: bp.anomaly_count("blueprint_rendering"),
            probe: bp.anomaly_count("probe"),
            deployment: bp.anomaly_count("deployment"),
            cabling: bp.anomaly_count("cabling"),
            lag: bp.anomaly_count("lag"),
            mac: bp.anomaly_count("mac"),
            streaming: bp.anomaly_count("streaming"),
        }
    }
}

/// Render the blueprint listing
pub fn format_blueprint_list(blueprints: &[BlueprintSummary]) -> Result<String> {
    if blueprints.is_empty() {
        return report::render_bare(&json!({
            "status": "no_data",
            "message": "No blueprints found in the system",
            "total_blueprints": 0,
            "blueprints": [],
            "anomalies": [],
        }));
    }

    let records: Vec<BlueprintRecord> = blueprints.iter().map(Into::into).collect();
    let anomalies: Vec<BlueprintAnomalyRecord> = blueprints.iter().map(Into::into).collect();

    report::render(
        &json!({
            "status": "success",
            "message": format!("Retrieved {} blueprints from Apstra", blueprints.len()),
            "blueprints": records,
            "anomalies": anomalies,
        }),
        prompts::LIST_BLUEPRINTS,
    )
}

pub struct ListBlueprintsTool {
    client: Arc<ApstraClient>,
}

impl ListBlueprintsTool {
    pub fn new(client: Arc<ApstraClient>) -> Self {
        Self { client }
    }

    async fn run(&self) -> Result<String> {
        info!("Fetching blueprints from Apstra");
        match split_malformed(self.client.list_blueprints().await)? {
            Ok(blueprints) => {
                info!(count = blueprints.len(), "Retrieved blueprints");
                format_blueprint_list(&blueprints)
            }
            Err(raw) => report::unexpected_format(raw),
        }
    }
}

#[async_trait]
impl Tool for ListBlueprintsTool {
    fn name(&self) -> &str {
        "list_blueprints"
    }

    fn description(&self) -> &str {
        "List all Apstra blueprints with their name, design type, status, and infrastructure counts \
         (leaf/spine switches, gateways, security zones, virtual networks). \
         Returns a formatted table with suggestions for next actions."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only("List blueprints")
    }

    async fn execute(&self, _arguments: Value) -> Result<Vec<TextContent>> {
        Ok(respond("Error listing blueprints", self.run().await))
    }
}

// ============================================================================
// Blueprint details
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct BlueprintDetailsRecord {
    pub blueprint_id: Value,
    pub name: Value,
    pub design_type: String,
    pub status: Value,
    pub created_at: Value,
    pub last_modified: Value,
    pub leaf_count: u64,
    pub spine_count: u64,
    pub remote_gateway_count: u64,
    pub security_zone_count: u64,
    pub virtual_network_count: u64,
    pub build_errors: u64,
    pub build_warnings: u64,
}

impl From<&BlueprintSummary> for BlueprintDetailsRecord {
    fn from(bp: &BlueprintSummary) -> Self {
        Self {
            blueprint_id: or_na(bp.id.clone()),
            name: or_na(bp.label.clone()),
            design_type: bp
                .design
                .as_deref()
                .map(design_title)
                .unwrap_or_else(|| "N/A".to_string()),
            status: or_na(bp.status.clone()),
            created_at: or_na(bp.created_at.clone()),
            last_modified: or_na(bp.last_modified_at.clone()),
            leaf_count: bp.leaf_count.unwrap_or(0),
            spine_count: bp.spine_count.unwrap_or(0),
            remote_gateway_count: bp.remote_gateway_count.unwrap_or(0),
            security_zone_count: bp.security_zone_count.unwrap_or(0),
            virtual_network_count: bp.virtual_network_count.unwrap_or(0),
            build_errors: bp.build_errors_count.unwrap_or(0),
            build_warnings: bp.build_warnings_count.unwrap_or(0),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GraphSystemRecord {
    pub name: Value,
    pub role: Value,
    pub system_type: Value,
    pub hostname: Value,
    pub device_key: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GraphVirtualNetworkRecord {
    pub name: Value,
    pub vn_type: Value,
    pub vn_id: Value,
    pub vlan_id: Value,
    pub ipv4_subnet: Value,
    pub gateway_ipv4: Value,
    pub l3_mtu: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GraphSecurityZoneRecord {
    pub vrf_name: Value,
    pub sz_type: Value,
    pub vni_id: Value,
    pub vrf_id: Value,
    pub l3_mtu: Value,
    pub evpn_irb_mode: Value,
}

impl From<BlueprintNode> for GraphSystemRecord {
    fn from(node: BlueprintNode) -> Self {
        Self {
            name: or_na(node.label),
            role: or_na(node.role),
            system_type: or_na(node.system_type),
            hostname: or_na(node.hostname),
            device_key: or_na(node.device_key),
        }
    }
}

impl From<BlueprintNode> for GraphVirtualNetworkRecord {
    fn from(node: BlueprintNode) -> Self {
        Self {
            name: or_na(node.label),
            vn_type: or_na(node.vn_type),
            vn_id: or_na(node.vn_id),
            vlan_id: or_na(node.reserved_vlan_id),
            ipv4_subnet: or_na(node.ipv4_subnet),
            gateway_ipv4: or_na(node.virtual_gateway_ipv4),
            l3_mtu: or_na(node.l3_mtu),
        }
    }
}

impl From<BlueprintNode> for GraphSecurityZoneRecord {
    fn from(node: BlueprintNode) -> Self {
        Self {
            vrf_name: or_na(node.vrf_name),
            sz_type: or_na(node.sz_type),
            vni_id: or_na(node.vni_id),
            vrf_id: or_na(node.vrf_id),
            l3_mtu: or_na(node.l3_mtu),
            evpn_irb_mode: or_na(node.junos_evpn_irb_mode),
        }
    }
}

/// "two_stage_l3clos" -> "Two Stage L3Clos": underscores become spaces and
/// every letter following a non-letter is upper-cased.
pub fn design_title(design: &str) -> String {
    let mut out = String::with_capacity(design.len());
    let mut prev_is_letter = false;
    for c in design.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Render blueprint details from its listing entry and node graph
pub fn format_blueprint_details(summary: &BlueprintSummary, graph: &BlueprintGraph) -> Result<String> {
    let systems: Vec<GraphSystemRecord> = graph.nodes_of_type("system").map(Into::into).collect();
    let virtual_networks: Vec<GraphVirtualNetworkRecord> = graph
        .nodes_of_type("virtual_network")
        .map(Into::into)
        .collect();
    let security_zones: Vec<GraphSecurityZoneRecord> = graph
        .nodes_of_type("security_zone")
        .map(Into::into)
        .collect();

    report::render(
        &json!({
            "status": "success",
            "message": format!(
                "Retrieved comprehensive details for blueprint '{}'",
                summary.label.as_deref().unwrap_or("N/A")
            ),
            "blueprint_details": BlueprintDetailsRecord::from(summary),
            "systems": {
                "total_count": systems.len(),
                "systems": systems,
            },
            "virtual_networks": {
                "total_count": virtual_networks.len(),
                "virtual_networks": virtual_networks,
            },
            "security_zones": {
                "total_count": security_zones.len(),
                "security_zones": security_zones,
            },
        }),
        prompts::BLUEPRINT_DETAILS,
    )
}

pub struct BlueprintDetailsTool {
    client: Arc<ApstraClient>,
}

impl BlueprintDetailsTool {
    pub fn new(client: Arc<ApstraClient>) -> Self {
        Self { client }
    }

    async fn run(&self, blueprint: &str) -> Result<String> {
        info!(blueprint, "Fetching blueprint details");
        let resolved = self.client.resolve_blueprint(blueprint).await?;

        match split_malformed(self.client.blueprint_graph(&resolved.id).await)? {
            Ok(graph) => format_blueprint_details(&resolved.item, &graph),
            Err(raw) => report::unexpected_format(raw),
        }
    }
}

#[async_trait]
impl Tool for BlueprintDetailsTool {
    fn name(&self) -> &str {
        "get_blueprint_details"
    }

    fn description(&self) -> &str {
        "Get detailed information about a specific Apstra blueprint. \
         Accepts blueprint ID or name. Returns comprehensive report with: \
         basic info, infrastructure summary, virtual networks table, systems table, and security zones table. \
         Use for blueprint configuration review and network topology analysis."
    }

    fn input_schema(&self) -> Value {
        blueprint_schema("details")
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only("Blueprint details")
    }

    async fn execute(&self, arguments: Value) -> Result<Vec<TextContent>> {
        let Some(blueprint) = string_arg(&arguments, "blueprint_id") else {
            return Ok(text(BLUEPRINT_ID_REQUIRED));
        };
        Ok(respond(
            "Error getting blueprint details",
            self.run(&blueprint).await,
        ))
    }
}
