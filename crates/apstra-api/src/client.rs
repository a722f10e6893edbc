//! Apstra API Client
//!
//! Thin authenticated gateway over the Apstra REST API. Every request carries
//! the token in the `AUTHTOKEN` header. Apstra controllers usually run with a
//! self-signed certificate, so verification is off unless configured.
//!
//! No retries: a failed call is reported once and the caller decides.

use apstra_core::{ApstraConfig, Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::types::{
    AnomalyList, BlueprintGraph, BlueprintSummary, Collection, ConfigurationStatus,
    SecurityZone, SecurityZoneMap, SystemInfoList, VirtualNetworkMap,
};

/// Header carrying the API token
pub const AUTH_HEADER: &str = "AUTHTOKEN";

/// Endpoint paths relative to the base URL
pub mod endpoints {
    pub const BLUEPRINTS: &str = "/api/blueprints";

    pub fn blueprint(id: &str) -> String {
        format!("/api/blueprints/{}", id)
    }

    pub fn security_zones(blueprint_id: &str) -> String {
        format!("/api/blueprints/{}/security-zones", blueprint_id)
    }

    pub fn virtual_networks(blueprint_id: &str) -> String {
        format!("/api/blueprints/{}/virtual-networks", blueprint_id)
    }

    pub fn configuration(blueprint_id: &str) -> String {
        format!("/api/blueprints/{}/configuration", blueprint_id)
    }

    pub fn system_info(blueprint_id: &str) -> String {
        format!("/api/blueprints/{}/experience/web/system-info", blueprint_id)
    }

    pub fn blueprint_anomalies(blueprint_id: &str) -> String {
        format!("/api/blueprints/{}/anomalies", blueprint_id)
    }

    pub fn system_anomalies(system_id: &str) -> String {
        format!("/api/systems/{}/anomalies", system_id)
    }

    pub fn apply_full_config(system_id: &str) -> String {
        format!("/api/systems/{}/apply-full-config", system_id)
    }
}

/// Apstra API client
#[derive(Clone)]
pub struct ApstraClient {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for ApstraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApstraClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApstraClient {
    /// Build a client from the loaded configuration
    pub fn new(config: &ApstraConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::config("APSTRA_BASE_URL environment variable is required"));
        }
        if config.api_token.is_empty() {
            return Err(Error::config("APSTRA_API_TOKEN environment variable is required"));
        }

        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        info!(
            base_url = %config.base_url,
            timeout_secs = config.timeout.as_secs(),
            verify_tls = config.verify_tls,
            "Apstra client ready"
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one request and return the decoded JSON body.
    ///
    /// Only GET and POST are accepted. An empty success body yields `null`.
    pub async fn call(&self, endpoint: &str, method: Method, body: Option<&Value>) -> Result<Value> {
        if method != Method::GET && method != Method::POST {
            return Err(Error::UnsupportedMethod(method.to_string()));
        }

        let url = format!("{}{}", self.base_url, endpoint);
        debug!("{} {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .header(AUTH_HEADER, &self.token)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), endpoint, "Apstra API returned an error");
            return Err(Error::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            Error::malformed(endpoint, format!("invalid JSON: {}", e), Value::String(text.clone()))
        })
    }

    /// GET an endpoint and decode it into `T`
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let raw = self.call(endpoint, Method::GET, None).await?;
        decode(endpoint, raw)
    }

    // =========================================================================
    // Endpoints
    // =========================================================================

    pub async fn list_blueprints(&self) -> Result<Vec<BlueprintSummary>> {
        let listing: Collection<BlueprintSummary> = self.get(endpoints::BLUEPRINTS).await?;
        Ok(listing.items)
    }

    pub async fn blueprint_graph(&self, blueprint_id: &str) -> Result<BlueprintGraph> {
        self.get(&endpoints::blueprint(blueprint_id)).await
    }

    pub async fn system_info(&self, blueprint_id: &str) -> Result<SystemInfoList> {
        self.get(&endpoints::system_info(blueprint_id)).await
    }

    pub async fn virtual_networks(&self, blueprint_id: &str) -> Result<VirtualNetworkMap> {
        self.get(&endpoints::virtual_networks(blueprint_id)).await
    }

    /// Security zones, keyed by zone ID.
    ///
    /// Accepts `{"items": {...}}`, a bare zone map, or an empty body.
    pub async fn security_zones(&self, blueprint_id: &str) -> Result<SecurityZoneMap> {
        let endpoint = endpoints::security_zones(blueprint_id);
        let raw = self.call(&endpoint, Method::GET, None).await?;

        let zones = match raw {
            Value::Null => {
                warn!(blueprint = blueprint_id, "Empty security zone response");
                Value::Object(Default::default())
            }
            Value::Object(mut map) => match map.remove("items") {
                Some(items) => items,
                None => Value::Object(map),
            },
            other => {
                return Err(Error::malformed(&endpoint, "expected a JSON object", other));
            }
        };

        let items = decode_map::<SecurityZone>(&endpoint, zones)?;
        debug!(blueprint = blueprint_id, count = items.len(), "Security zones decoded");
        Ok(SecurityZoneMap { items })
    }

    pub async fn configuration(&self, blueprint_id: &str) -> Result<ConfigurationStatus> {
        self.get(&endpoints::configuration(blueprint_id)).await
    }

    pub async fn blueprint_anomalies(&self, blueprint_id: &str) -> Result<AnomalyList> {
        self.get(&endpoints::blueprint_anomalies(blueprint_id)).await
    }

    pub async fn system_anomalies(&self, system_id: &str) -> Result<AnomalyList> {
        self.get(&endpoints::system_anomalies(system_id)).await
    }

    /// Push the full golden configuration to a system. The response is
    /// returned untouched for the caller to classify.
    pub async fn apply_full_config(&self, system_id: &str) -> Result<Value> {
        info!(system_id, "Applying full configuration");
        self.call(&endpoints::apply_full_config(system_id), Method::POST, None)
            .await
    }
}

/// Decode a JSON object into `T`, keeping the payload on failure
pub fn decode<T: DeserializeOwned>(endpoint: &str, raw: Value) -> Result<T> {
    if !raw.is_object() {
        return Err(Error::malformed(endpoint, "expected a JSON object", raw));
    }
    let decoded = T::deserialize(&raw);
    decoded.map_err(|e| Error::malformed(endpoint, e.to_string(), raw))
}

fn decode_map<T: DeserializeOwned>(
    endpoint: &str,
    raw: Value,
) -> Result<std::collections::BTreeMap<String, T>> {
    decode(endpoint, raw)
}
