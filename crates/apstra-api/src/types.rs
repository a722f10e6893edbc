//! Wire schemas for the Apstra endpoints
//!
//! Every field the upstream may omit is an `Option`; the tools decide what a
//! missing value renders as. Numeric-or-string fields stay `Value`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// `{ "items": [...] }` listing envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Collection<T> {
    pub items: Vec<T>,
}

// ============================================================================
// Blueprints
// ============================================================================

/// One entry of `GET /api/blueprints`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlueprintSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    /// Reference design (e.g. "two_stage_l3clos")
    #[serde(default)]
    pub design: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_modified_at: Option<String>,
    #[serde(default)]
    pub spine_count: Option<u64>,
    #[serde(default)]
    pub leaf_count: Option<u64>,
    #[serde(default)]
    pub generic_count: Option<u64>,
    #[serde(default)]
    pub remote_gateway_count: Option<u64>,
    #[serde(default)]
    pub virtual_network_count: Option<u64>,
    #[serde(default)]
    pub security_zone_count: Option<u64>,
    #[serde(default)]
    pub build_errors_count: Option<u64>,
    #[serde(default)]
    pub build_warnings_count: Option<u64>,
    /// Anomaly family name -> count
    #[serde(default)]
    pub anomaly_counts: Option<BTreeMap<String, u64>>,
}

impl BlueprintSummary {
    /// Anomaly count for one family, zero when absent
    pub fn anomaly_count(&self, family: &str) -> u64 {
        self.anomaly_counts
            .as_ref()
            .and_then(|counts| counts.get(family).copied())
            .unwrap_or(0)
    }
}

/// `GET /api/blueprints/{id}`: the blueprint node graph
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlueprintGraph {
    #[serde(default)]
    pub nodes: BTreeMap<String, Value>,
}

impl BlueprintGraph {
    /// Nodes that decode as [`BlueprintNode`], in node-ID order.
    ///
    /// Nodes with an unexpected shape are skipped.
    pub fn typed_nodes(&self) -> impl Iterator<Item = BlueprintNode> + '_ {
        self.nodes.iter().filter_map(|(id, raw)| {
            if !raw.is_object() {
                return None;
            }
            match BlueprintNode::deserialize(raw) {
                Ok(node) => Some(node),
                Err(e) => {
                    debug!(node = %id, error = %e, "Skipping undecodable blueprint node");
                    None
                }
            }
        })
    }

    /// Nodes of one graph type ("system", "virtual_network", "security_zone")
    pub fn nodes_of_type<'a>(&'a self, node_type: &'a str) -> impl Iterator<Item = BlueprintNode> + 'a {
        self.typed_nodes()
            .filter(move |node| node.node_type.as_deref() == Some(node_type))
    }
}

/// A node of the blueprint graph. Fields are the union of the system,
/// virtual network and security zone node attributes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlueprintNode {
    #[serde(rename = "type", default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,

    // system
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub system_type: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub device_key: Option<String>,

    // virtual_network
    #[serde(default)]
    pub vn_type: Option<String>,
    #[serde(default)]
    pub vn_id: Option<Value>,
    #[serde(default)]
    pub reserved_vlan_id: Option<Value>,
    #[serde(default)]
    pub ipv4_subnet: Option<String>,
    #[serde(default)]
    pub virtual_gateway_ipv4: Option<String>,
    #[serde(default)]
    pub l3_mtu: Option<Value>,

    // security_zone
    #[serde(default)]
    pub vrf_name: Option<String>,
    #[serde(default)]
    pub sz_type: Option<String>,
    #[serde(default)]
    pub vni_id: Option<Value>,
    #[serde(default)]
    pub vrf_id: Option<Value>,
    #[serde(default)]
    pub junos_evpn_irb_mode: Option<String>,
}

// ============================================================================
// Systems
// ============================================================================

/// `GET /api/blueprints/{id}/experience/web/system-info`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemInfoList {
    #[serde(default)]
    pub data: Vec<SystemInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    /// Device serial number
    #[serde(default)]
    pub system_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub loopback: Option<Loopback>,
    /// eBGP ASN
    #[serde(default)]
    pub domain_id: Option<Value>,
    #[serde(default)]
    pub deploy_mode: Option<String>,
    #[serde(default)]
    pub management_level: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Loopback {
    #[serde(default)]
    pub ipv4_addr: Option<String>,
}

// ============================================================================
// Virtual networks and security zones
// ============================================================================

/// `GET /api/blueprints/{id}/virtual-networks`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VirtualNetworkMap {
    #[serde(default)]
    pub virtual_networks: Option<BTreeMap<String, VirtualNetwork>>,
}

impl VirtualNetworkMap {
    pub fn into_networks(self) -> BTreeMap<String, VirtualNetwork> {
        self.virtual_networks.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VirtualNetwork {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub ipv4_subnet: Option<String>,
    #[serde(default)]
    pub virtual_gateway_ipv4: Option<String>,
    #[serde(default)]
    pub ipv6_subnet: Option<String>,
    #[serde(default)]
    pub virtual_gateway_ipv6: Option<String>,
    /// VXLAN VNI
    #[serde(default)]
    pub vn_id: Option<Value>,
    #[serde(default)]
    pub route_target: Option<String>,
    #[serde(default)]
    pub l3_mtu: Option<Value>,
    #[serde(default)]
    pub reserved_vlan_id: Option<Value>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Security zones keyed by zone ID
#[derive(Debug, Clone, Default)]
pub struct SecurityZoneMap {
    pub items: BTreeMap<String, SecurityZone>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityZone {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub sz_type: Option<String>,
    #[serde(default)]
    pub vrf_name: Option<String>,
    #[serde(default)]
    pub route_target: Option<String>,
    #[serde(default)]
    pub rt_policy: Option<RtPolicy>,
    #[serde(default)]
    pub vni_id: Option<Value>,
    #[serde(default)]
    pub l3_mtu: Option<Value>,
    #[serde(default)]
    pub vlan_id: Option<Value>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub routing_policy_id: Option<String>,
    #[serde(default)]
    pub import_policy: Option<Value>,
    #[serde(default)]
    pub junos_evpn_irb_mode: Option<String>,
    #[serde(default)]
    pub vrf_description: Option<String>,
    #[serde(default)]
    pub tenant: Option<Value>,
}

impl SecurityZone {
    /// `route_target`, falling back to the export RT of the RT policy
    pub fn vrf_target(&self) -> Option<Value> {
        if let Some(rt) = self.route_target.as_deref().filter(|rt| !rt.is_empty()) {
            return Some(Value::String(rt.to_string()));
        }
        self.rt_policy
            .as_ref()
            .and_then(|policy| policy.export_rt.clone())
            .filter(|rt| !rt.is_null() && rt.as_array().map_or(true, |a| !a.is_empty()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RtPolicy {
    #[serde(default)]
    pub export_rt: Option<Value>,
    #[serde(default)]
    pub import_rts: Option<Value>,
}

// ============================================================================
// Configuration audit
// ============================================================================

/// `GET /api/blueprints/{id}/configuration`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigurationStatus {
    #[serde(default)]
    pub config_mismatch: Option<Vec<ConfigMismatch>>,
    #[serde(default)]
    pub device_status: Option<Vec<DeviceStatus>>,
    /// Config type -> counters
    #[serde(default)]
    pub deployment_status: Option<BTreeMap<String, DeploymentStats>>,
    #[serde(default)]
    pub total_devices: Option<u64>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub last_modified_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigMismatch {
    #[serde(default)]
    pub system_id: Option<String>,
    #[serde(default)]
    pub config_mismatched_since: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceStatus {
    #[serde(default)]
    pub system_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub config_type: Option<String>,
    #[serde(default)]
    pub deploy_stage: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub last_modified_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentStats {
    #[serde(default)]
    pub num_succeeded: Option<u64>,
    #[serde(default)]
    pub num_failed: Option<u64>,
    #[serde(default)]
    pub num_pending: Option<u64>,
}

// ============================================================================
// Anomalies
// ============================================================================

/// Anomaly family. Families without special handling keep their name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnomalyKind {
    Config,
    Route,
    Bgp,
    Interface,
    Other(String),
}

impl AnomalyKind {
    pub fn as_str(&self) -> &str {
        match self {
            AnomalyKind::Config => "config",
            AnomalyKind::Route => "route",
            AnomalyKind::Bgp => "bgp",
            AnomalyKind::Interface => "interface",
            AnomalyKind::Other(name) => name,
        }
    }
}

impl Default for AnomalyKind {
    fn default() -> Self {
        AnomalyKind::Other("unknown".to_string())
    }
}

impl From<String> for AnomalyKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "config" => AnomalyKind::Config,
            "route" => AnomalyKind::Route,
            "bgp" => AnomalyKind::Bgp,
            "interface" => AnomalyKind::Interface,
            _ => AnomalyKind::Other(value),
        }
    }
}

impl From<AnomalyKind> for String {
    fn from(kind: AnomalyKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `GET /api/systems/{id}/anomalies` and `GET /api/blueprints/{id}/anomalies`.
///
/// Items are decoded one at a time; entries that are not objects are
/// counted in `skipped` instead of failing the whole listing.
#[derive(Debug, Clone, Default)]
pub struct AnomalyList {
    pub items: Vec<Anomaly>,
    pub skipped: usize,
}

impl<'de> Deserialize<'de> for AnomalyList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Collection::<Value>::deserialize(deserializer)?;
        let mut list = AnomalyList::default();

        for (index, item) in raw.items.iter().enumerate() {
            if !item.is_object() {
                debug!(index, "Skipping non-object anomaly entry");
                list.skipped += 1;
                continue;
            }
            match Anomaly::deserialize(item) {
                Ok(anomaly) => list.items.push(anomaly),
                Err(e) => {
                    debug!(index, error = %e, "Skipping undecodable anomaly entry");
                    list.skipped += 1;
                }
            }
        }
        Ok(list)
    }
}

/// Decode a field, treating a value of the wrong type as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// One anomaly. `identity`, `expected` and `actual` are kept as sent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Anomaly {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub anomaly_type: Option<AnomalyKind>,
    #[serde(default, deserialize_with = "lenient")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub anomalous_node_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_modified_at: Option<String>,
    #[serde(default)]
    pub identity: Option<Value>,
    #[serde(default)]
    pub expected: Option<Value>,
    #[serde(default)]
    pub actual: Option<Value>,
}

impl Anomaly {
    pub fn kind(&self) -> AnomalyKind {
        self.anomaly_type.clone().unwrap_or_default()
    }

    pub fn is_config(&self) -> bool {
        self.anomaly_type == Some(AnomalyKind::Config)
    }

    /// Typed view of the known identity keys
    pub fn identity(&self) -> AnomalyIdentity {
        self.identity
            .as_ref()
            .filter(|raw| raw.is_object())
            .and_then(|raw| AnomalyIdentity::deserialize(raw).ok())
            .unwrap_or_default()
    }

    /// Identity object as sent, `{}` when absent
    pub fn metadata(&self) -> Value {
        self.identity
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()))
    }

    pub fn expected_value(&self) -> Option<Value> {
        state_value(self.expected.as_ref())
    }

    pub fn actual_value(&self) -> Option<Value> {
        state_value(self.actual.as_ref())
    }

    /// Full device configuration text (config anomalies)
    pub fn expected_config(&self) -> Option<&str> {
        state_config(self.expected.as_ref())
    }

    pub fn actual_config(&self) -> Option<&str> {
        state_config(self.actual.as_ref())
    }
}

/// `value` of a state object; a bare scalar or array is its own value
fn state_value(state: Option<&Value>) -> Option<Value> {
    match state? {
        Value::Null => None,
        Value::Object(map) => map.get("value").filter(|v| !v.is_null()).cloned(),
        other => Some(other.clone()),
    }
}

fn state_config(state: Option<&Value>) -> Option<&str> {
    state?
        .get("config")
        .and_then(Value::as_str)
        .filter(|config| !config.is_empty())
}

/// Known identity keys of an anomaly
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnomalyIdentity {
    #[serde(default, deserialize_with = "lenient")]
    pub system_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub hostname: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub prefix: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub vrf_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub route_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub peer_ip: Option<String>,
    #[serde(default)]
    pub asn: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub address_family: Option<String>,
}
