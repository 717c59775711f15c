#![allow(clippy::unwrap_used)]
// Resource operations routed through the registry, against wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fortimcp_core::{
    CoreError, DeviceConfig, DeviceRegistry, DeviceSession, DeviceSettings, NewVirtualIp,
    Resolution, ResourceKind, Resources, RiskLevel,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DeviceRegistry) {
    let server = MockServer::start().await;
    let settings = DeviceSettings::new("127.0.0.1").with_api_token("tok");
    let config = DeviceConfig::from_settings("fw1", &settings).unwrap();
    let session =
        DeviceSession::with_base_url("fw1", config, format!("{}/api/v2", server.uri())).unwrap();

    let registry = DeviceRegistry::new();
    registry.insert(session).unwrap();
    (server, registry)
}

fn wan_policy() -> serde_json::Value {
    json!({
        "results": [{
            "policyid": 7,
            "name": "inbound-web",
            "action": "accept",
            "srcintf": [{ "name": "wan1" }],
            "dstintf": [{ "name": "lan" }],
            "srcaddr": [{ "name": "all" }],
            "dstaddr": [{ "name": "web01" }, { "name": "ghost" }],
            "service": [{ "name": "HTTPS" }],
            "schedule": "business-hours",
            "logtraffic": "all",
            "av-profile": "default",
            "ips-sensor": ""
        }]
    })
}

// ── CRUD ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unknown_device_fails_before_network() {
    let (server, registry) = setup().await;
    let resources = Resources::new(&registry);

    let err = resources
        .list("missing", ResourceKind::FirewallPolicy, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::UnknownDevice { ref device_id } if device_id == "missing"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_uses_collection_path_and_vdom() {
    let (server, registry) = setup().await;
    let payload = json!({ "results": [{ "name": "web01", "subnet": "10.0.0.10 255.255.255.255" }] });

    Mock::given(method("GET"))
        .and(path("/api/v2/cmdb/firewall/address"))
        .and(query_param("vdom", "tenant"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&payload))
        .expect(1)
        .mount(&server)
        .await;

    let result = Resources::new(&registry)
        .list("fw1", ResourceKind::Address, Some("tenant"))
        .await
        .unwrap();
    assert_eq!(result, payload);
}

#[tokio::test]
async fn test_delete_encodes_object_name() {
    let (server, registry) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v2/cmdb/firewall/address/LAN%2010.0.0.0%2F24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let result = Resources::new(&registry)
        .delete("fw1", ResourceKind::Address, "LAN 10.0.0.0/24", None)
        .await
        .unwrap();
    assert_eq!(result["status"], "success");
}

#[tokio::test]
async fn test_create_virtual_ip_posts_defaults() {
    let (server, registry) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/cmdb/firewall/vip"))
        .and(body_json(json!({
            "name": "web-vip",
            "extip": "203.0.113.10",
            "mappedip": "10.0.0.10",
            "extintf": "wan1",
            "portforward": "disable",
            "protocol": "tcp"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success", "mkey": "web-vip" })))
        .expect(1)
        .mount(&server)
        .await;

    let vip = NewVirtualIp {
        name: "web-vip".into(),
        extip: "203.0.113.10".into(),
        mappedip: "10.0.0.10".into(),
        extintf: "wan1".into(),
        portforward: "disable".into(),
        protocol: "tcp".into(),
        extport: None,
        mappedport: None,
    };
    let result = Resources::new(&registry)
        .create("fw1", ResourceKind::VirtualIp, &vip.to_body(), None)
        .await
        .unwrap();
    assert_eq!(result["mkey"], "web-vip");
}

#[tokio::test]
async fn test_api_failure_keeps_status() {
    let (server, registry) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v2/cmdb/router/static/3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = Resources::new(&registry)
        .update("fw1", ResourceKind::StaticRoute, "3", &json!({ "gateway": "10.0.0.254" }), None)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.device_id(), Some("fw1"));
}

#[tokio::test]
async fn test_interface_status_requires_name() {
    let (_server, registry) = setup().await;

    let err = Resources::new(&registry)
        .interface_status("fw1", " ", None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Parameter 'interface_name' is required");
}

// ── Policy detail ───────────────────────────────────────────────────

#[tokio::test]
async fn test_policy_detail_resolves_and_scores() {
    let (server, registry) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/cmdb/firewall/policy/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wan_policy()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/cmdb/firewall/address"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "name": "web01", "subnet": "10.0.0.10 255.255.255.255" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/cmdb/firewall.service/custom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "name": "HTTPS", "tcp-portrange": "443" }]
        })))
        .mount(&server)
        .await;

    let detail = Resources::new(&registry)
        .policy_detail("fw1", "7", None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(detail.schedule, "business-hours");
    assert_eq!(
        detail.resolved_destinations.unwrap(),
        vec![
            Resolution::Resolved {
                name: "web01".into(),
                value: "10.0.0.10 255.255.255.255".into()
            },
            Resolution::Unresolved {
                name: "ghost".into()
            },
        ]
    );
    assert_eq!(
        detail.resolved_services.unwrap(),
        vec![Resolution::Resolved {
            name: "HTTPS".into(),
            value: "TCP 443".into()
        }]
    );
    // srcaddr all (3) + no IPS (1) + wan to lan without IPS (2)
    assert_eq!(detail.risk.score, 6);
    assert_eq!(detail.risk.level(), RiskLevel::Medium);
}

#[tokio::test]
async fn test_policy_detail_survives_missing_tables() {
    let (server, registry) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/cmdb/firewall/policy/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wan_policy()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/cmdb/firewall/address"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/cmdb/firewall.service/custom"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let detail = Resources::new(&registry)
        .policy_detail("fw1", "7", None)
        .await
        .unwrap()
        .unwrap();

    assert!(detail.resolved_sources.is_none());
    assert!(detail.resolved_destinations.is_none());
    assert!(detail.resolved_services.is_none());
    assert_eq!(detail.destinations, vec!["web01", "ghost"]);
}

#[tokio::test]
async fn test_policy_detail_empty_result_is_none() {
    let (server, registry) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/cmdb/firewall/policy/99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    let detail = Resources::new(&registry)
        .policy_detail("fw1", "99", None)
        .await
        .unwrap();
    assert!(detail.is_none());
}

#[tokio::test]
async fn test_policy_fetch_failure_propagates() {
    let (server, registry) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/cmdb/firewall/policy/7"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = Resources::new(&registry)
        .policy_detail("fw1", "7", None)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}

// ── Fleet probes ────────────────────────────────────────────────────

#[tokio::test]
async fn test_probe_all_reports_each_device() {
    let (server, registry) = setup().await;
    let offline = DeviceSettings {
        port: 1,
        timeout: 2,
        ..DeviceSettings::new("127.0.0.1").with_api_token("tok")
    };
    registry.register_settings("offline", &offline).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v2/monitor/system/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "v7.4.3" })))
        .mount(&server)
        .await;

    let results = registry.probe_all().await;
    assert_eq!(results.keys().collect::<Vec<_>>(), vec!["fw1", "offline"]);
    assert_eq!(results["fw1"].as_ref().unwrap()["version"], "v7.4.3");
    assert!(results["offline"].as_ref().unwrap_err().is_network());
}
