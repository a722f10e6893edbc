//! Golden configuration remediation workflow
//!
//! ```text
//! START -> CHECKING_ANOMALIES -> NO_ACTION              (no config anomaly)
//!                             -> AWAITING_CONFIRMATION  (not confirmed)
//!                             -> APPLYING -> RESULT
//! ```
//!
//! The gate is stateless: a call without a recognised confirmation only
//! reports, and the confirming call re-checks anomalies before applying.

use apstra_api::{AnomalyList, ApstraClient};
use apstra_core::{Error, Result};
use serde_json::Value;
use tracing::info;

/// Confirmation tokens that allow the apply call (after trim + lowercase)
pub const ACCEPTED_CONFIRMATIONS: &[&str] = &["yes", "y", "confirm", "apply"];

/// `status` values that mark an apply response as failed
const FAILURE_STATUSES: &[&str] = &["error", "failed", "failure"];

/// Whether the caller-supplied confirmation allows applying
pub fn is_confirmed(confirmation: Option<&str>) -> bool {
    confirmation
        .map(|c| c.trim().to_lowercase())
        .map_or(false, |c| ACCEPTED_CONFIRMATIONS.contains(&c.as_str()))
}

/// Terminal state of one workflow invocation
#[derive(Debug, Clone)]
pub enum Remediation {
    /// No config anomaly; apply was not called
    NoAction,
    /// Config drift found but not confirmed; apply was not called
    AwaitingConfirmation { anomalies: AnomalyList },
    /// Apply was called once
    Applied { outcome: ApplyOutcome, response: Value },
}

/// Classified apply response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub success: bool,
    pub message: String,
}

impl ApplyOutcome {
    /// Classify the apply-full-config response.
    ///
    /// Explicit failure markers win; an object without them counts as
    /// accepted, anything else (including an empty body) as completed.
    pub fn classify(response: &Value) -> Self {
        let Some(object) = response.as_object() else {
            return Self {
                success: true,
                message: "Golden configuration application completed".to_string(),
            };
        };

        let status = object
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_lowercase);

        let failed = object.contains_key("error")
            || status
                .as_deref()
                .map_or(false, |s| FAILURE_STATUSES.contains(&s));
        if failed {
            let detail = match object.get("message") {
                Some(Value::String(msg)) => msg.clone(),
                Some(other) => other.to_string(),
                None => response.to_string(),
            };
            return Self {
                success: false,
                message: format!("Failed to apply golden configuration: {}", detail),
            };
        }

        let message = if status.as_deref() == Some("success") {
            "Golden configuration applied successfully"
        } else {
            "Golden configuration application initiated"
        };
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

/// Run the workflow for one system.
///
/// The anomaly check always precedes the apply call, and apply happens at
/// most once.
pub async fn run(
    client: &ApstraClient,
    system_id: &str,
    confirmation: Option<&str>,
) -> Result<Remediation> {
    if system_id.trim().is_empty() {
        return Err(Error::invalid_argument("System ID is required"));
    }

    let anomalies = client.system_anomalies(system_id).await?;
    let config_anomalies = anomalies.items.iter().filter(|a| a.is_config()).count();

    if config_anomalies == 0 {
        info!(system_id, "No config anomalies, nothing to apply");
        return Ok(Remediation::NoAction);
    }

    if !is_confirmed(confirmation) {
        info!(system_id, config_anomalies, "Config drift found, awaiting confirmation");
        return Ok(Remediation::AwaitingConfirmation { anomalies });
    }

    info!(system_id, config_anomalies, "Confirmed, applying golden config");
    let response = client.apply_full_config(system_id).await?;
    let outcome = ApplyOutcome::classify(&response);
    info!(system_id, success = outcome.success, "Golden config apply finished");

    Ok(Remediation::Applied { outcome, response })
}
