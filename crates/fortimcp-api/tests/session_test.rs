#![allow(clippy::unwrap_used)]
// Integration tests for `DeviceSession` using wiremock.

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fortimcp_api::{AuthMode, DeviceConfig, DeviceSession, DeviceSettings, Error, HttpMethod};

// ── Helpers ─────────────────────────────────────────────────────────

fn session_for(server: &MockServer, settings: &DeviceSettings) -> DeviceSession {
    let config = DeviceConfig::from_settings("fw1", settings).unwrap();
    DeviceSession::with_base_url("fw1", config, format!("{}/api/v2", server.uri())).unwrap()
}

async fn setup() -> (MockServer, DeviceSession) {
    let server = MockServer::start().await;
    let settings = DeviceSettings::new("127.0.0.1").with_api_token("test-token");
    let session = session_for(&server, &settings);
    (server, session)
}

// ── Request shape ───────────────────────────────────────────────────

#[tokio::test]
async fn test_get_sends_bearer_token_and_default_vdom() {
    let (server, session) = setup().await;

    let body = json!({
        "http_method": "GET",
        "results": [{ "policyid": 1, "name": "allow-web" }],
        "vdom": "root",
        "status": "success"
    });

    Mock::given(method("GET"))
        .and(path("/api/v2/cmdb/firewall/policy"))
        .and(query_param("vdom", "root"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let result = session.get("cmdb/firewall/policy", None).await.unwrap();
    assert_eq!(result, body);
}

#[tokio::test]
async fn test_vdom_override_replaces_default() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/cmdb/firewall/address"))
        .and(query_param("vdom", "customer-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let result = session
        .execute(
            HttpMethod::Get,
            "/cmdb/firewall/address",
            &[("vdom", "ignored")],
            None,
            Some("customer-a"),
        )
        .await
        .unwrap();
    assert_eq!(result, json!({ "results": [] }));
}

#[tokio::test]
async fn test_basic_auth_mode() {
    let server = MockServer::start().await;
    let settings = DeviceSettings::new("127.0.0.1").with_basic("admin", "pw");
    let session = session_for(&server, &settings);
    assert_eq!(session.auth_mode(), AuthMode::Basic);

    Mock::given(method("GET"))
        .and(path("/api/v2/monitor/system/status"))
        .and(header("authorization", "Basic YWRtaW46cHc="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    session.system_status().await.unwrap();
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let (server, session) = setup().await;

    let payload = json!({ "name": "web01", "type": "ipmask", "subnet": "10.0.0.10/32" });

    Mock::given(method("POST"))
        .and(path("/api/v2/cmdb/firewall/address"))
        .and(header("content-type", "application/json"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success", "mkey": "web01" })))
        .expect(1)
        .mount(&server)
        .await;

    let result = session
        .post("cmdb/firewall/address", &payload, None)
        .await
        .unwrap();
    assert_eq!(result["mkey"], "web01");
}

#[tokio::test]
async fn test_interface_status_passes_interface_query() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/monitor/system/interface"))
        .and(query_param("interface", "port1"))
        .and(query_param("vdom", "root"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": { "port1": { "link": true } } })))
        .expect(1)
        .mount(&server)
        .await;

    let result = session.interface_status("port1", None).await.unwrap();
    assert_eq!(result["results"]["port1"]["link"], true);
}

// ── Success body handling ───────────────────────────────────────────

#[tokio::test]
async fn test_empty_success_body_is_synthesized() {
    let (server, session) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v2/cmdb/firewall/policy/7"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result = session.delete("cmdb/firewall/policy/7", None).await.unwrap();
    assert_eq!(result, json!({ "status": "success" }));
}

// ── Error classification ────────────────────────────────────────────

#[tokio::test]
async fn test_forbidden_is_api_error_with_body() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/cmdb/router/static"))
        .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
        .expect(1)
        .mount(&server)
        .await;

    let err = session.get("cmdb/router/static", None).await.unwrap_err();
    match err {
        Error::Api {
            device_id,
            status,
            message,
        } => {
            assert_eq!(device_id, "fw1");
            assert_eq!(status, 403);
            assert!(message.contains("permission denied"), "got: {message}");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_json_error_field_is_appended() {
    let (server, session) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v2/cmdb/firewall/policy/3"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "status": "error", "error": -651 })),
        )
        .mount(&server)
        .await;

    let err = session
        .put("cmdb/firewall/policy/3", &json!({ "name": "x" }), None)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "API request failed: 500 - -651");
}

#[tokio::test]
async fn test_timeout_is_network_error_after_single_attempt() {
    let server = MockServer::start().await;
    let mut settings = DeviceSettings::new("127.0.0.1").with_api_token("test-token");
    settings.timeout = 1;
    let session = session_for(&server, &settings);

    Mock::given(method("GET"))
        .and(path("/api/v2/monitor/system/status"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .expect(1)
        .mount(&server)
        .await;

    let started = Instant::now();
    let err = session.system_status().await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(err.is_network(), "expected Network error, got: {err:?}");
    assert_eq!(err.status(), None);
    assert!(err.to_string().contains("timed out"), "got: {err}");
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let settings = DeviceSettings::new("127.0.0.1").with_api_token("test-token");
    let config = DeviceConfig::from_settings("fw1", &settings).unwrap();
    let session = DeviceSession::with_base_url("fw1", config, "http://127.0.0.1:1/api/v2").unwrap();

    let err = session.get("monitor/system/status", None).await.unwrap_err();
    assert!(matches!(err, Error::Network { ref device_id, .. } if device_id == "fw1"));
}

// ── Connection probe ────────────────────────────────────────────────

#[tokio::test]
async fn test_connection_probe_reports_bool() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/monitor/system/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    assert!(session.test_connection().await);

    Mock::given(method("GET"))
        .and(path("/api/v2/monitor/system/status"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert!(!session.test_connection().await);
}

#[test]
fn test_default_base_url_keeps_port() {
    let settings = DeviceSettings::new("fw.example.net").with_api_token("t");
    let config = DeviceConfig::from_settings("edge", &settings).unwrap();
    let session = DeviceSession::new("edge", config).unwrap();
    assert_eq!(session.base_url(), "https://fw.example.net:443/api/v2");
    assert_eq!(session.default_vdom(), "root");
}
