//! End-to-end tool calls through the MCP server against a mock controller

use apstra_api::ApstraClient;
use apstra_core::ApstraConfig;
use apstra_mcp::transport::serve_lines;
use apstra_mcp::{tools, McpRequest, McpServer, McpServerConfig, ToolRegistry};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, McpServer) {
    let mock = MockServer::start().await;
    let client = ApstraClient::new(&ApstraConfig::new(mock.uri(), "test-token")).unwrap();

    let registry = Arc::new(ToolRegistry::new());
    tools::register_all(&registry, Arc::new(client)).await.unwrap();
    let server = McpServer::new(McpServerConfig::default(), registry);
    (mock, server)
}

async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> Value {
    let request = McpRequest::new("tools/call")
        .with_id(1)
        .with_params(json!({"name": name, "arguments": arguments}));
    let response = server.handle_request(request).await;
    assert!(response.is_success(), "unexpected error: {:?}", response.error);
    response.result.unwrap()
}

fn text_of(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap()
}

/// JSON part of a tool answer, without the instruction block
fn envelope(result: &Value) -> Value {
    let text = text_of(result);
    let json_part = text.split("\n\n---").next().unwrap();
    serde_json::from_str(json_part).unwrap()
}

async fn mount_blueprints(mock: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/blueprints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "bp-1", "label": "Fabric-1", "design": "two_stage_l3clos"}]
        })))
        .mount(mock)
        .await;
}

async fn mount_config_drift(mock: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/systems/S1/anomalies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "an-1",
                "anomaly_type": "config",
                "severity": "critical",
                "identity": {"system_id": "S1"},
                "expected": {"config": "a\nb\n"},
                "actual": {"config": "a\nc\n"}
            }]
        })))
        .mount(mock)
        .await;
}

#[tokio::test]
async fn test_tools_list_exposes_all_tools() {
    let (_mock, server) = setup().await;
    let response = server
        .handle_request(McpRequest::new("tools/list").with_id(1))
        .await;
    let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();

    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        [
            "list_blueprints",
            "get_blueprint_details",
            "get_system_details",
            "get_virtual_networks",
            "get_security_zones",
            "get_config_audits",
            "get_blueprint_anomalies",
            "apply_system_golden_config",
        ]
    );

    let golden = &tools[7];
    assert_eq!(golden["annotations"]["destructiveHint"], true);
    assert_eq!(tools[0]["annotations"]["readOnlyHint"], true);
}

#[tokio::test]
async fn test_golden_config_requires_confirmation() {
    let (mock, server) = setup().await;
    mount_config_drift(&mock).await;
    Mock::given(method("POST"))
        .and(path("/api/systems/S1/apply-full-config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(0)
        .mount(&mock)
        .await;

    let result = call_tool(&server, "apply_system_golden_config", json!({"system_id": "S1"})).await;
    let parsed = envelope(&result);

    assert_eq!(parsed["status"], "confirmation_required");
    let diff = parsed["config_anomalies"]["anomalies_by_type"]["config"][0]["ACTUAL_STATE"]
        .as_str()
        .unwrap();
    assert!(diff.contains("-b"));
    assert!(diff.contains("+c"));
}

#[tokio::test]
async fn test_golden_config_applies_when_confirmed() {
    let (mock, server) = setup().await;
    mount_config_drift(&mock).await;
    Mock::given(method("POST"))
        .and(path("/api/systems/S1/apply-full-config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&mock)
        .await;

    let result = call_tool(
        &server,
        "apply_system_golden_config",
        json!({"system_id": "S1", "confirmation": "yes"}),
    )
    .await;
    let parsed = envelope(&result);

    assert_eq!(parsed["status"], "applied");
    assert_eq!(parsed["success"], true);
    assert_eq!(parsed["response_data"]["status"], "success");
}

#[tokio::test]
async fn test_golden_config_in_sync_never_applies() {
    let (mock, server) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/systems/S1/anomalies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"anomaly_type": "bgp", "identity": {"system_id": "S1"}}]
        })))
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/systems/S1/apply-full-config"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock)
        .await;

    let result = call_tool(
        &server,
        "apply_system_golden_config",
        json!({"system_id": "S1", "confirmation": "yes"}),
    )
    .await;
    assert_eq!(envelope(&result)["status"], "no_action_needed");
}

#[tokio::test]
async fn test_golden_config_apply_failure() {
    let (mock, server) = setup().await;
    mount_config_drift(&mock).await;
    Mock::given(method("POST"))
        .and(path("/api/systems/S1/apply-full-config"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock)
        .await;

    let result = call_tool(
        &server,
        "apply_system_golden_config",
        json!({"system_id": "S1", "confirmation": "yes"}),
    )
    .await;
    assert_eq!(
        text_of(&result),
        "Error applying golden config: API request failed: 500 - boom"
    );
}

#[tokio::test]
async fn test_golden_config_confirmation_tokens() {
    let cases: [(&str, u64, &str); 7] = [
        ("", 0, "confirmation_required"),
        ("no", 0, "confirmation_required"),
        ("cancel", 0, "confirmation_required"),
        ("YES", 1, "applied"),
        ("y", 1, "applied"),
        ("confirm", 1, "applied"),
        ("apply", 1, "applied"),
    ];

    for (token, applies, status) in cases {
        let (mock, server) = setup().await;
        mount_config_drift(&mock).await;
        Mock::given(method("POST"))
            .and(path("/api/systems/S1/apply-full-config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(applies)
            .mount(&mock)
            .await;

        let result = call_tool(
            &server,
            "apply_system_golden_config",
            json!({"system_id": "S1", "confirmation": token}),
        )
        .await;
        assert_eq!(envelope(&result)["status"], status, "confirmation {token:?}");
        mock.verify().await;
    }
}

#[tokio::test]
async fn test_golden_config_tolerates_odd_anomaly_entries() {
    let (mock, server) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/systems/S1/anomalies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "an-1",
                    "anomaly_type": "config",
                    "identity": {"system_id": "S1"},
                    "expected": {"config": "a\nb\n"},
                    "actual": {"config": "a\nc\n"}
                },
                {"anomaly_type": "telemetry", "expected": "n/a", "actual": 5}
            ]
        })))
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/systems/S1/apply-full-config"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock)
        .await;

    let result = call_tool(&server, "apply_system_golden_config", json!({"system_id": "S1"})).await;
    let parsed = envelope(&result);
    assert_eq!(parsed["status"], "confirmation_required");
    let report = &parsed["config_anomalies"];
    assert_eq!(report["total_anomalies"], 2);
    assert!(report["anomalies_by_type"]["config"][0]["ACTUAL_STATE"]
        .as_str()
        .unwrap()
        .contains("+c"));

    let result = call_tool(&server, "get_blueprint_anomalies", json!({"system_id": "S1"})).await;
    let parsed = envelope(&result);
    assert_eq!(parsed["status"], "success");
    let odd = &parsed["anomalies_by_type"]["telemetry"][0];
    assert_eq!(odd["EXPECTED_STATE"], "n/a");
    assert_eq!(odd["ACTUAL_STATE"], 5);
}

#[tokio::test]
async fn test_golden_config_missing_system_id() {
    let (_mock, server) = setup().await;
    let result = call_tool(&server, "apply_system_golden_config", json!({})).await;
    assert_eq!(text_of(&result), "System ID is required");
}

#[tokio::test]
async fn test_list_blueprints_empty() {
    let (mock, server) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/blueprints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&mock)
        .await;

    let result = call_tool(&server, "list_blueprints", json!({})).await;
    let parsed = envelope(&result);
    assert_eq!(parsed["status"], "no_data");
    assert_eq!(parsed["total_blueprints"], 0);
}

#[tokio::test]
async fn test_list_blueprints_api_error() {
    let (mock, server) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/blueprints"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&mock)
        .await;

    let result = call_tool(&server, "list_blueprints", json!({})).await;
    assert_eq!(
        text_of(&result),
        "Error listing blueprints: API request failed: 500 - internal"
    );
}

#[tokio::test]
async fn test_blueprint_not_found() {
    let (mock, server) = setup().await;
    mount_blueprints(&mock).await;

    let result = call_tool(&server, "get_virtual_networks", json!({"blueprint_id": "dc9"})).await;
    assert_eq!(text_of(&result), "Blueprint 'dc9' not found");
}

#[tokio::test]
async fn test_virtual_networks_by_label() {
    let (mock, server) = setup().await;
    mount_blueprints(&mock).await;
    Mock::given(method("GET"))
        .and(path("/api/blueprints/bp-1/virtual-networks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "virtual_networks": {"vn-1": {"id": "vn-1", "label": "app", "vn_id": "10010"}}
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let result = call_tool(&server, "get_virtual_networks", json!({"blueprint_id": "fabric-1"})).await;
    let parsed = envelope(&result);
    assert_eq!(parsed["blueprint_name"], "Fabric-1");
    assert_eq!(parsed["virtual_networks"][0]["VXLAN_VNID"], "10010");
}

#[tokio::test]
async fn test_security_zones_bad_shape() {
    let (mock, server) = setup().await;
    mount_blueprints(&mock).await;
    Mock::given(method("GET"))
        .and(path("/api/blueprints/bp-1/security-zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["not", "zones"])))
        .mount(&mock)
        .await;

    let result = call_tool(&server, "get_security_zones", json!({"blueprint_id": "bp-1"})).await;
    let parsed = envelope(&result);
    assert_eq!(parsed["status"], "error");
    assert_eq!(
        parsed["message"],
        "Invalid security zones data structure for blueprint 'Fabric-1'"
    );
}

#[tokio::test]
async fn test_blueprint_anomalies_resolves_label() {
    let (mock, server) = setup().await;
    mount_blueprints(&mock).await;
    Mock::given(method("GET"))
        .and(path("/api/blueprints/bp-1/anomalies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"anomaly_type": "liveness", "anomalous_node_id": "n1",
                       "identity": {"system_id": "S1"}}]
        })))
        .mount(&mock)
        .await;

    let result = call_tool(&server, "get_blueprint_anomalies", json!({"blueprint_id": "Fabric-1"})).await;
    let parsed = envelope(&result);
    assert_eq!(parsed["context"], "blueprint 'Fabric-1'");
    assert_eq!(parsed["identifier"], "bp-1");
    assert_eq!(parsed["affected_systems"], 1);
}

#[tokio::test]
async fn test_anomalies_reject_both_arguments() {
    let (_mock, server) = setup().await;
    let result = call_tool(
        &server,
        "get_blueprint_anomalies",
        json!({"blueprint_id": "bp-1", "system_id": "S1"}),
    )
    .await;
    assert_eq!(
        text_of(&result),
        "Provide either system_id or blueprint_id, not both"
    );
}

#[tokio::test]
async fn test_unknown_tool_is_invalid_params() {
    let (_mock, server) = setup().await;
    let request = McpRequest::new("tools/call")
        .with_id(7)
        .with_params(json!({"name": "reboot_fabric", "arguments": {}}));
    let response = server.handle_request(request).await;

    let error = response.error.unwrap();
    assert_eq!(error.code, -32602);
    assert_eq!(error.message, "Unknown tool: reboot_fabric");
}

#[tokio::test]
async fn test_stdio_session() {
    let (_mock, server) = setup().await;
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"clientInfo":{"name":"test"}}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        "not json\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        "\n",
    );
    let mut output = Vec::new();
    serve_lines(input.as_bytes(), &mut output, &server).await.unwrap();

    let lines: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(lines[1]["error"]["code"], -32700);
    assert_eq!(lines[1]["id"], Value::Null);
    assert_eq!(lines[2]["result"]["tools"].as_array().unwrap().len(), 8);
}
