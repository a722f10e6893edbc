//! Anomaly report
//!
//! `get_blueprint_anomalies` groups the anomalies of a blueprint or of a
//! single system by family. Route, config and BGP anomalies get extra
//! columns; config anomalies carry the diff between golden and running
//! configuration. The same report is embedded by the golden-config tool.

use crate::diff::config_diff;
use crate::protocol::TextContent;
use crate::report::{self, prompts};
use crate::tool_registry::{Tool, ToolAnnotations, ToolRegistry};
use crate::tools::{or_na, respond, split_malformed, string_arg, text};
use apstra_api::{Anomaly, AnomalyKind, AnomalyList, ApstraClient};
use apstra_core::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::info;

pub async fn register_all(registry: &ToolRegistry, client: Arc<ApstraClient>) -> Result<usize> {
    registry
        .register(Arc::new(AnomaliesTool::new(client)))
        .await?;
    Ok(1)
}

/// One anomaly as rendered in the report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AnomalyRecord {
    pub severity: Value,
    pub anomaly_type: String,
    pub anomalous_node_id: Value,
    pub system_id: Value,
    pub hostname: Value,
    pub anomaly_metadata: Value,
    pub expected_state: Value,
    pub actual_state: Value,
    pub last_modified: Value,
    pub role: Value,
    pub anomaly_id: Value,

    // route
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_prefix: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_type: Option<Value>,

    // bgp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_ip: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_family: Option<Value>,

    // route and bgp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrf_name: Option<Value>,
}

/// Empty strings, empty collections, zero, false and null count as unset
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

impl From<&Anomaly> for AnomalyRecord {
    fn from(anomaly: &Anomaly) -> Self {
        let kind = anomaly.kind();
        let identity = anomaly.identity();

        let mut record = Self {
            severity: or_na(anomaly.severity.clone()),
            anomaly_type: kind.to_string(),
            anomalous_node_id: or_na(anomaly.anomalous_node_id.clone()),
            system_id: or_na(identity.system_id.clone()),
            hostname: or_na(identity.hostname.clone()),
            anomaly_metadata: anomaly.metadata(),
            expected_state: or_na(anomaly.expected_value()),
            actual_state: or_na(anomaly.actual_value()),
            last_modified: or_na(anomaly.last_modified_at.clone()),
            role: or_na(anomaly.role.clone()),
            anomaly_id: or_na(anomaly.id.clone()),
            route_prefix: None,
            route_type: None,
            peer_ip: None,
            asn: None,
            address_family: None,
            vrf_name: None,
        };

        match kind {
            AnomalyKind::Route => {
                record.route_prefix = Some(or_na(identity.prefix));
                record.vrf_name = Some(or_na(identity.vrf_name));
                record.route_type = Some(or_na(identity.route_type));

                let expected = anomaly.expected_value().filter(is_set);
                let actual = anomaly.actual_value().filter(is_set);
                if expected.is_some() || actual.is_some() {
                    record.expected_state =
                        expected.unwrap_or_else(|| Value::from("Route should be present"));
                    record.actual_state =
                        actual.unwrap_or_else(|| Value::from("Route missing or incorrect"));
                }
            }
            AnomalyKind::Config => {
                record.expected_state = Value::from("Working config");
                record.actual_state = match (anomaly.expected_config(), anomaly.actual_config()) {
                    (Some(expected), Some(actual)) => Value::from(config_diff(expected, actual)),
                    _ => Value::from("Config deviation detected"),
                };
            }
            AnomalyKind::Bgp => {
                record.peer_ip = Some(or_na(identity.peer_ip));
                record.asn = Some(or_na(identity.asn));
                record.vrf_name = Some(or_na(identity.vrf_name));
                record.address_family = Some(or_na(identity.address_family));
            }
            _ => {}
        }

        record
    }
}

/// Anomalies grouped by family, with system to node mapping
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyReport {
    pub status: &'static str,
    pub message: String,
    pub context: String,
    pub identifier: String,
    pub total_anomalies: usize,
    pub anomalies_by_type: BTreeMap<String, Vec<AnomalyRecord>>,
    pub anomaly_type_counts: BTreeMap<String, usize>,
    pub system_node_mapping: BTreeMap<String, BTreeSet<String>>,
    pub affected_systems: usize,
    pub affected_nodes: usize,
    /// Listing entries that could not be read as anomalies
    #[serde(skip_serializing_if = "is_zero")]
    pub unreadable_entries: usize,
}

fn is_zero(count: &usize) -> bool {
    *count == 0
}

impl AnomalyReport {
    pub fn build(context: &str, identifier: &str, anomalies: &AnomalyList) -> Self {
        let mut by_type: BTreeMap<String, Vec<AnomalyRecord>> = BTreeMap::new();
        let mut mapping: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for anomaly in &anomalies.items {
            let record = AnomalyRecord::from(anomaly);

            // Only pairs where both sides are known
            let system = anomaly.identity().system_id;
            if let (Some(system), Some(node)) = (system, anomaly.anomalous_node_id.clone()) {
                mapping.entry(system).or_default().insert(node);
            }

            by_type
                .entry(record.anomaly_type.clone())
                .or_default()
                .push(record);
        }

        let counts = by_type
            .iter()
            .map(|(kind, records)| (kind.clone(), records.len()))
            .collect();
        let total = anomalies.items.len();

        Self {
            status: "success",
            message: format!("Retrieved {} anomalies for {}", total, context),
            context: context.to_string(),
            identifier: identifier.to_string(),
            total_anomalies: total,
            anomalies_by_type: by_type,
            anomaly_type_counts: counts,
            affected_systems: mapping.len(),
            affected_nodes: mapping.values().map(BTreeSet::len).sum(),
            system_node_mapping: mapping,
            unreadable_entries: anomalies.skipped,
        }
    }
}

/// Envelope for an anomaly listing that did not decode
pub fn unusable_anomalies(context: &str, identifier: &str, raw: Value) -> Result<String> {
    report::render_bare(&json!({
        "status": "no_data",
        "message": format!("No anomalies found for {} or unexpected data format", context),
        "context": context,
        "identifier": identifier,
        "total_anomalies": 0,
        "anomalies_by_type": {},
        "raw_data": raw,
    }))
}

/// What to fetch anomalies for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnomalyScope {
    Blueprint(String),
    System(String),
}

impl AnomalyScope {
    /// Exactly one of `system_id` and `blueprint_id`
    pub fn from_arguments(arguments: &Value) -> Result<Self> {
        match (
            string_arg(arguments, "system_id"),
            string_arg(arguments, "blueprint_id"),
        ) {
            (Some(system), None) => Ok(AnomalyScope::System(system)),
            (None, Some(blueprint)) => Ok(AnomalyScope::Blueprint(blueprint)),
            (Some(_), Some(_)) => Err(Error::invalid_argument(
                "Provide either system_id or blueprint_id, not both",
            )),
            (None, None) => Err(Error::invalid_argument(
                "Either system_id or blueprint_id is required",
            )),
        }
    }
}

pub struct AnomaliesTool {
    client: Arc<ApstraClient>,
}

impl AnomaliesTool {
    pub fn new(client: Arc<ApstraClient>) -> Self {
        Self { client }
    }

    async fn run(&self, scope: AnomalyScope) -> Result<String> {
        let (context, identifier, listing) = match scope {
            AnomalyScope::System(system_id) => {
                info!(system_id = %system_id, "Fetching system anomalies");
                let listing = self.client.system_anomalies(&system_id).await;
                (format!("system '{}'", system_id), system_id, listing)
            }
            AnomalyScope::Blueprint(blueprint) => {
                let resolved = self.client.resolve_blueprint(&blueprint).await?;
                info!(blueprint = resolved.display_name(), id = %resolved.id, "Fetching blueprint anomalies");
                let listing = self.client.blueprint_anomalies(&resolved.id).await;
                (
                    format!("blueprint '{}'", resolved.display_name()),
                    resolved.id,
                    listing,
                )
            }
        };

        match split_malformed(listing)? {
            Ok(anomalies) => report::render(
                &AnomalyReport::build(&context, &identifier, &anomalies),
                prompts::ANOMALIES,
            ),
            Err(raw) => unusable_anomalies(&context, &identifier, raw),
        }
    }
}

#[async_trait]
impl Tool for AnomaliesTool {
    fn name(&self) -> &str {
        "get_blueprint_anomalies"
    }

    fn description(&self) -> &str {
        "Get anomalies either for an entire blueprint or for a specific system. \
         Provide exactly one of blueprint_id (ID or name) or system_id. \
         Returns anomalies grouped by type with severity, affected nodes and systems, \
         expected vs actual state, and a unified diff for configuration anomalies."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "system_id": {
                    "type": "string",
                    "description": "The system ID (serial number) to get anomalies for"
                },
                "blueprint_id": {
                    "type": "string",
                    "description": "The ID or name/label of the blueprint to get anomalies for"
                }
            },
            "oneOf": [
                {"required": ["system_id"]},
                {"required": ["blueprint_id"]}
            ],
            "additionalProperties": false
        })
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only("Anomalies")
    }

    async fn execute(&self, arguments: Value) -> Result<Vec<TextContent>> {
        let scope = match AnomalyScope::from_arguments(&arguments) {
            Ok(scope) => scope,
            Err(e) => return Ok(text(e.to_string())),
        };
        Ok(respond("Error getting anomalies", self.run(scope).await))
    }
}
