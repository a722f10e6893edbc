//! `get_security_zones`: routing zones (VRFs) of a blueprint

use crate::protocol::TextContent;
use crate::report::{self, prompts};
use crate::tool_registry::{Tool, ToolAnnotations, ToolRegistry};
use crate::tools::{
    blueprint_schema, join_tags, or_na, respond, string_arg, text, BLUEPRINT_ID_REQUIRED,
};
use apstra_api::{ApstraClient, SecurityZone, SecurityZoneMap};
use apstra_core::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn register_all(registry: &ToolRegistry, client: Arc<ApstraClient>) -> Result<usize> {
    registry
        .register(Arc::new(SecurityZonesTool::new(client)))
        .await?;
    Ok(1)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SecurityZoneRecord {
    pub name: String,
    pub id: String,
    #[serde(rename = "TYPE")]
    pub zone_type: Value,
    pub evpn_vrf: Value,
    pub vrf_target: Value,
    pub vxlan_vnid: Value,
    pub mtu: Value,
    pub vlan_id: Value,
    pub tags: String,
    pub routing_policy: Value,
    pub import_policy: Value,
    pub evpn_irb_mode: Value,
    pub vrf_description: Value,
    pub tenant: Value,
}

impl SecurityZoneRecord {
    fn new(key: &str, zone: &SecurityZone) -> Self {
        Self {
            name: zone.label.clone().unwrap_or_else(|| key.to_string()),
            id: key.to_string(),
            zone_type: or_na(zone.sz_type.clone()),
            evpn_vrf: or_na(zone.vrf_name.clone()),
            vrf_target: or_na(zone.vrf_target()),
            vxlan_vnid: or_na(zone.vni_id.clone()),
            mtu: or_na(zone.l3_mtu.clone()),
            vlan_id: or_na(zone.vlan_id.clone()),
            tags: join_tags(zone.tags.as_ref()),
            routing_policy: or_na(zone.routing_policy_id.clone()),
            import_policy: or_na(zone.import_policy.clone()),
            evpn_irb_mode: or_na(zone.junos_evpn_irb_mode.clone()),
            vrf_description: or_na(zone.vrf_description.clone()),
            tenant: or_na(zone.tenant.clone()),
        }
    }
}

pub fn format_security_zones(blueprint_name: &str, zones: &SecurityZoneMap) -> Result<String> {
    if zones.items.is_empty() {
        // Every blueprint ships a default zone, so an empty map is suspicious
        return report::render(
            &json!({
                "status": "no_data",
                "message": format!(
                    "No security zones found in blueprint '{}'. This is unusual - every Apstra \
                     blueprint should have at least one default security zone.",
                    blueprint_name
                ),
                "blueprint_name": blueprint_name,
                "total_security_zones": 0,
                "security_zones": [],
                "note": "This may indicate an API access issue, blueprint corruption, or \
                         unexpected blueprint state. Check blueprint status in Apstra UI.",
                "troubleshooting": "Try using get_blueprint_details to verify blueprint health \
                                    and accessibility.",
            }),
            prompts::SECURITY_ZONES_EMPTY,
        );
    }

    let records: Vec<SecurityZoneRecord> = zones
        .items
        .iter()
        .map(|(key, zone)| SecurityZoneRecord::new(key, zone))
        .collect();

    report::render(
        &json!({
            "status": "success",
            "message": format!(
                "Retrieved {} security zones from blueprint '{}'",
                records.len(),
                blueprint_name
            ),
            "blueprint_name": blueprint_name,
            "total_security_zones": records.len(),
            "security_zones": records,
        }),
        prompts::SECURITY_ZONES,
    )
}

/// Envelope for a zone payload that is neither a zone map nor `{items}`
pub fn invalid_security_zones(blueprint_name: &str) -> Result<String> {
    report::render_bare(&json!({
        "status": "error",
        "message": format!(
            "Invalid security zones data structure for blueprint '{}'",
            blueprint_name
        ),
        "blueprint_name": blueprint_name,
        "total_security_zones": 0,
        "security_zones": [],
        "error_details": "API response was not in expected format",
    }))
}

pub struct SecurityZonesTool {
    client: Arc<ApstraClient>,
}

impl SecurityZonesTool {
    pub fn new(client: Arc<ApstraClient>) -> Self {
        Self { client }
    }

    async fn run(&self, blueprint: &str) -> Result<String> {
        let resolved = self.client.resolve_blueprint(blueprint).await?;
        let name = resolved.display_name();
        info!(blueprint = name, id = %resolved.id, "Fetching security zones");

        match self.client.security_zones(&resolved.id).await {
            Ok(zones) => format_security_zones(name, &zones),
            Err(Error::MalformedResponse { reason, .. }) => {
                warn!(blueprint = name, %reason, "Invalid security zone payload");
                invalid_security_zones(name)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Tool for SecurityZonesTool {
    fn name(&self) -> &str {
        "get_security_zones"
    }

    fn description(&self) -> &str {
        "Get security zones (routing zones/VRFs) information for a specific blueprint. \
         Accepts blueprint ID or name. Returns a table with zone names, types, EVPN VRFs, \
         VRF targets, VXLAN VNIs, MTU, VLAN IDs, routing policies, and tags."
    }

    fn input_schema(&self) -> Value {
        blueprint_schema("security zones")
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only("Security zones")
    }

    async fn execute(&self, arguments: Value) -> Result<Vec<TextContent>> {
        let Some(blueprint) = string_arg(&arguments, "blueprint_id") else {
            return Ok(text(BLUEPRINT_ID_REQUIRED));
        };
        Ok(respond("Error getting security zones", self.run(&blueprint).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn zone_map(raw: Value) -> SecurityZoneMap {
        let items: BTreeMap<String, SecurityZone> = serde_json::from_value(raw).unwrap();
        SecurityZoneMap { items }
    }

    #[test]
    fn test_zone_records() {
        let zones = zone_map(json!({
            "sz-default": {"sz_type": "l3_fabric", "vrf_name": "default"},
            "sz-blue": {
                "label": "blue",
                "sz_type": "evpn",
                "vrf_name": "blue",
                "rt_policy": {"export_rt": "65000:100", "import_rts": []},
                "vni_id": 10100,
                "vlan_id": 100,
                "tags": ["tenant-a"]
            }
        }));

        let out = format_security_zones("dc1", &zones).unwrap();
        let (json_part, prompt) = out.split_once("\n\n---").unwrap();
        let parsed: Value = serde_json::from_str(json_part).unwrap();

        assert_eq!(parsed["total_security_zones"], 2);
        let blue = &parsed["security_zones"][0];
        assert_eq!(blue["ID"], "sz-blue");
        assert_eq!(blue["TYPE"], "evpn");
        assert_eq!(blue["VRF_TARGET"], "65000:100");
        assert_eq!(blue["VXLAN_VNID"], 10100);
        assert_eq!(blue["TAGS"], "tenant-a");
        let default = &parsed["security_zones"][1];
        assert_eq!(default["NAME"], "sz-default");
        assert_eq!(default["VRF_TARGET"], "N/A");
        assert!(prompt.contains("INSTRUCTION"));
    }

    #[test]
    fn test_empty_zones_explained() {
        let out = format_security_zones("dc1", &SecurityZoneMap::default()).unwrap();
        let (json_part, _) = out.split_once("\n\n---").unwrap();
        let parsed: Value = serde_json::from_str(json_part).unwrap();
        assert_eq!(parsed["status"], "no_data");
        assert!(parsed["message"]
            .as_str()
            .unwrap()
            .contains("at least one default security zone"));
        assert!(parsed["troubleshooting"]
            .as_str()
            .unwrap()
            .contains("get_blueprint_details"));
    }

    #[test]
    fn test_invalid_structure() {
        let parsed: Value = serde_json::from_str(&invalid_security_zones("dc1").unwrap()).unwrap();
        assert_eq!(parsed["status"], "error");
        assert_eq!(
            parsed["message"],
            "Invalid security zones data structure for blueprint 'dc1'"
        );
        assert_eq!(parsed["error_details"], "API response was not in expected format");
    }
}
