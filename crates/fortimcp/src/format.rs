//! Text reports for tool results.
//!
//! Pure functions from appliance JSON (or core types) to the markdown-ish
//! text returned in MCP content blocks. List reports accept the raw
//! `{"results": [...]}` payload and fall back to a "No ... found" line when
//! the list is missing or empty.

use std::fmt::Write as _;

use chrono::Local;
use serde_json::Value;

use fortimcp_core::{DeviceSummary, PolicyDetail, Resolution, is_truthy};

use crate::tools::HealthReport;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Field helpers ────────────────────────────────────────────────────

fn results(payload: &Value) -> Option<&[Value]> {
    match payload.get("results")? {
        Value::Array(items) if !items.is_empty() => Some(items),
        _ => None,
    }
}

/// Scalar field as display text. Empty strings count as absent.
fn text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_or(value: &Value, key: &str, default: &str) -> String {
    text(value, key).unwrap_or_else(|| default.to_owned())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

fn names_or_any(names: &[String]) -> String {
    if names.is_empty() {
        "any".into()
    } else {
        names.join(", ")
    }
}

/// Names in a `[{"name": ..}]` / `["..."]` field, comma-joined.
fn joined_names(value: &Value, key: &str) -> String {
    fortimcp_core::extract_names(value, key).join(", ")
}

/// VIP address fields come as a string or as `[{"range": ".."}]`.
fn ranges(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("range").and_then(Value::as_str).or(item.as_str()))
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

fn push(lines: &mut Vec<String>, line: impl Into<String>) {
    lines.push(line.into());
}

fn list_report(title: &str, empty: &str, payload: &Value, item: impl Fn(&Value, &mut Vec<String>)) -> String {
    let mut lines = vec![format!("**{title}**"), String::new()];
    match results(payload) {
        Some(items) => {
            for entry in items {
                item(entry, &mut lines);
                lines.push(String::new());
            }
        }
        None => lines.push(empty.to_owned()),
    }
    lines.join("\n")
}

// ── Devices ──────────────────────────────────────────────────────────

pub fn device_list(devices: &[DeviceSummary]) -> String {
    if devices.is_empty() {
        return "No FortiGate devices configured".into();
    }

    let mut lines = vec!["**FortiGate Devices**".to_owned(), String::new()];
    for device in devices {
        lines.extend([
            format!("**{}**", device.id),
            format!("   • Host: {}:{}", device.host, device.port),
            format!("   • VDOM: {}", device.vdom),
            format!("   • Auth: {}", device.auth_mode),
            format!("   • SSL Verify: {}", yes_no(device.verify_tls)),
            String::new(),
        ]);
    }
    lines.join("\n")
}

/// `monitor/system/status`: model data lives under `results`, firmware and
/// serial at the top level.
pub fn device_status(device_id: &str, status: &Value) -> String {
    let mut lines = vec![format!("**Device Status: {device_id}**"), String::new()];

    let Some(info) = status.get("results").filter(|r| r.is_object()) else {
        lines.push("No status information available".into());
        return lines.join("\n");
    };

    let model = format!(
        "{} {}",
        text_or(info, "model_name", "Unknown"),
        text_or(info, "model_number", "")
    );
    lines.extend([
        "**System Information**".to_owned(),
        format!("   • Model: {}", model.trim_end()),
        format!("   • Hostname: {}", text_or(info, "hostname", "Unknown")),
        format!("   • Version: {}", text_or(status, "version", "Unknown")),
        format!("   • Serial: {}", text_or(status, "serial", "Unknown")),
        format!("   • VDOM: {}", text_or(status, "vdom", "Unknown")),
    ]);
    if let Some(disk) = text(info, "log_disk_status") {
        push(&mut lines, format!("   • Log Disk: {disk}"));
    }
    if let Some(time) = text(info, "current_time") {
        push(&mut lines, format!("   • Current Time: {time}"));
    }
    lines.join("\n")
}

pub fn connection_test(device_id: &str, success: bool, error: Option<&str>) -> String {
    let status = if success { "SUCCESS" } else { "FAILED" };
    let outcome = match (success, error) {
        (true, _) => "Connection established successfully".to_owned(),
        (false, Some(e)) => format!("Connection failed: {e}"),
        (false, None) => "Connection failed".to_owned(),
    };
    format!("Connection Test {status}\nDevice: {device_id}\n\n{outcome}")
}

pub fn vdoms(payload: &Value) -> String {
    list_report("Virtual Domains (VDOMs)", "No VDOMs found", payload, |vdom, lines| {
        lines.extend([
            format!("**{}**", text_or(vdom, "name", "Unnamed")),
            format!("   • Enabled: {}", yes_no(is_truthy(vdom.get("enabled")))),
        ]);
        if let Some(comments) = text(vdom, "comments") {
            push(lines, format!("   • Comments: {comments}"));
        }
    })
}

// ── Firewall ─────────────────────────────────────────────────────────

pub fn policies(payload: &Value) -> String {
    list_report("Firewall Policies", "No firewall policies found", payload, |policy, lines| {
        let state = if text(policy, "status").as_deref() == Some("enable") {
            "enabled"
        } else {
            "disabled"
        };
        let action = text_or(policy, "action", "unknown");
        lines.extend([
            format!("**Policy {}** ({state}, {action})", text_or(policy, "policyid", "N/A")),
            format!("   • Name: {}", text_or(policy, "name", "Unnamed")),
            format!(
                "   • Source: {}",
                names_or_any(&fortimcp_core::extract_names(policy, "srcaddr"))
            ),
            format!(
                "   • Destination: {}",
                names_or_any(&fortimcp_core::extract_names(policy, "dstaddr"))
            ),
            format!(
                "   • Service: {}",
                names_or_any(&fortimcp_core::extract_names(policy, "service"))
            ),
            format!("   • Action: {action}"),
        ]);
    })
}

pub fn policy_not_found(device_id: &str) -> String {
    format!("Policy not found on device {device_id}")
}

fn resolution_lines(lines: &mut Vec<String>, heading: &str, resolved: Option<&[Resolution]>) {
    let Some(resolved) = resolved else { return };
    push(lines, format!("• {heading}:"));
    for entry in resolved {
        match entry {
            Resolution::Resolved { name, value } => push(lines, format!("  - {name}: {value}")),
            Resolution::Unresolved { name } => push(lines, format!("  - {name}: unresolved")),
        }
    }
}

pub fn policy_detail(device_id: &str, detail: &PolicyDetail) -> String {
    let policy = &detail.policy;
    let mut lines = vec![format!("**Policy Detail - Device: {device_id}**"), String::new()];

    let enabled = text(policy, "status").as_deref() == Some("enable");
    lines.extend([
        "## Overview".to_owned(),
        format!("• Policy ID: {}", text_or(policy, "policyid", "N/A")),
        format!("• Name: {}", text_or(policy, "name", "Unnamed")),
        format!("• Status: {}", if enabled { "Enabled" } else { "Disabled" }),
        format!("• UUID: {}", text_or(policy, "uuid", "N/A")),
        String::new(),
        "## Traffic Direction".to_owned(),
        format!("• Source Interface: {}", detail.source_interfaces.join(", ")),
        format!("• Destination Interface: {}", detail.destination_interfaces.join(", ")),
        String::new(),
        "## Source".to_owned(),
        format!("• Address Objects: {}", detail.sources.join(", ")),
        format!("• Object Count: {}", detail.sources.len()),
    ]);
    resolution_lines(&mut lines, "Resolved Addresses", detail.resolved_sources.as_deref());

    lines.extend([
        String::new(),
        "## Destination".to_owned(),
        format!("• Address Objects: {}", detail.destinations.join(", ")),
        format!("• Object Count: {}", detail.destinations.len()),
    ]);
    resolution_lines(
        &mut lines,
        "Resolved Addresses",
        detail.resolved_destinations.as_deref(),
    );

    lines.extend([
        String::new(),
        "## Services".to_owned(),
        format!("• Service Objects: {}", detail.services.join(", ")),
        format!("• Service Count: {}", detail.services.len()),
    ]);
    resolution_lines(&mut lines, "Resolved Services", detail.resolved_services.as_deref());

    let nat = text(policy, "nat").as_deref() == Some("enable");
    let logs_all = text(policy, "logtraffic").as_deref() == Some("all");
    lines.extend([
        String::new(),
        "## Action and Security".to_owned(),
        format!("• Action: {}", text_or(policy, "action", "unknown").to_uppercase()),
        format!("• Log Traffic: {}", yes_no(logs_all)),
        format!("• NAT: {}", yes_no(nat)),
        format!("• Schedule: {}", detail.schedule),
    ]);

    if let Some(comments) = text(policy, "comments") {
        lines.extend([String::new(), "## Comments".to_owned(), comments]);
    }

    lines.extend([
        String::new(),
        "## Security Analysis".to_owned(),
        format!(
            "• Risk Score: {}/10 ({})",
            detail.risk.score,
            detail.risk.level()
        ),
        String::new(),
        "### Risk Factors".to_owned(),
    ]);
    lines.extend(detail.risk.factors.iter().map(|f| format!("• {f}")));

    if !detail.recommendations.is_empty() {
        lines.extend([String::new(), "## Recommendations".to_owned()]);
        lines.extend(
            detail
                .recommendations
                .iter()
                .enumerate()
                .map(|(i, r)| format!("{}. {r}", i + 1)),
        );
    }

    let has = |key: &str| yes_no(is_truthy(policy.get(key)));
    lines.extend([
        String::new(),
        "## Technical Details".to_owned(),
        format!("• Sequence Number: {}", text_or(policy, "seq-num", "N/A")),
        format!(
            "• Internet Service: {}",
            yes_no(text(policy, "internet-service").as_deref() == Some("enable"))
        ),
        format!("• Application Control: {}", has("application-list")),
        format!("• Antivirus: {}", has("av-profile")),
        format!("• Web Filter: {}", has("webfilter-profile")),
        format!("• IPS: {}", has("ips-sensor")),
    ]);

    lines.join("\n")
}

// ── Objects ──────────────────────────────────────────────────────────

pub fn addresses(payload: &Value) -> String {
    list_report("Address Objects", "No address objects found", payload, |addr, lines| {
        lines.extend([
            format!("**{}**", text_or(addr, "name", "Unnamed")),
            format!("   • Type: {}", text_or(addr, "type", "unknown")),
        ]);
        if let Some(subnet) = text(addr, "subnet") {
            push(lines, format!("   • Subnet: {subnet}"));
        } else if let (Some(start), Some(end)) = (text(addr, "start-ip"), text(addr, "end-ip")) {
            push(lines, format!("   • Range: {start} - {end}"));
        } else if let Some(fqdn) = text(addr, "fqdn") {
            push(lines, format!("   • FQDN: {fqdn}"));
        }
        if let Some(comment) = text(addr, "comment") {
            push(lines, format!("   • Comment: {comment}"));
        }
    })
}

pub fn services(payload: &Value) -> String {
    list_report("Service Objects", "No service objects found", payload, |svc, lines| {
        push(
            lines,
            format!(
                "**{}** ({})",
                text_or(svc, "name", "Unnamed"),
                text_or(svc, "protocol", "unknown").to_uppercase()
            ),
        );
        if let Some(tcp) = text(svc, "tcp-portrange") {
            push(lines, format!("   • TCP Ports: {tcp}"));
        }
        if let Some(udp) = text(svc, "udp-portrange") {
            push(lines, format!("   • UDP Ports: {udp}"));
        }
        if let Some(comment) = text(svc, "comment") {
            push(lines, format!("   • Comment: {comment}"));
        }
    })
}

pub fn virtual_ips(payload: &Value) -> String {
    list_report("Virtual IPs", "No virtual IPs found", payload, |vip, lines| {
        lines.extend([
            format!("**{}**", text_or(vip, "name", "Unnamed")),
            format!("   • External IP: {}", ranges(vip, "extip").unwrap_or_else(|| "N/A".into())),
            format!(
                "   • Mapped IP: {}",
                ranges(vip, "mappedip").unwrap_or_else(|| "N/A".into())
            ),
            format!("   • Interface: {}", text_or(vip, "extintf", "any")),
            format!("   • Port Forward: {}", text_or(vip, "portforward", "disable")),
        ]);
        if text(vip, "portforward").as_deref() == Some("enable") {
            push(
                lines,
                format!(
                    "   • Ports: {} {} -> {}",
                    text_or(vip, "protocol", "tcp").to_uppercase(),
                    text_or(vip, "extport", "N/A"),
                    text_or(vip, "mappedport", "N/A")
                ),
            );
        }
        if let Some(comment) = text(vip, "comment") {
            push(lines, format!("   • Comment: {comment}"));
        }
    })
}

// ── Routing ──────────────────────────────────────────────────────────

pub fn static_routes(payload: &Value) -> String {
    list_report("Static Routes", "No static routes found", payload, |route, lines| {
        let state = if text(route, "status").as_deref() == Some("enable") {
            "enabled"
        } else {
            "disabled"
        };
        lines.extend([
            format!("**Route {}** ({state})", text_or(route, "seq-num", "N/A")),
            format!("   • Destination: {}", text_or(route, "dst", "0.0.0.0/0")),
            format!("   • Gateway: {}", text_or(route, "gateway", "N/A")),
            format!("   • Device: {}", text_or(route, "device", "N/A")),
            format!("   • Distance: {}", text_or(route, "distance", "N/A")),
        ]);
        if let Some(comment) = text(route, "comment") {
            push(lines, format!("   • Comment: {comment}"));
        }
    })
}

pub fn interfaces(payload: &Value) -> String {
    list_report("Network Interfaces", "No interfaces found", payload, |intf, lines| {
        let state = if text(intf, "status").as_deref() == Some("up") { "up" } else { "down" };
        lines.extend([
            format!("**{}** ({state})", text_or(intf, "name", "Unnamed")),
            format!("   • Type: {}", text_or(intf, "type", "unknown")),
            format!("   • Mode: {}", text_or(intf, "mode", "unknown")),
        ]);
        if let Some(ip) = text(intf, "ip") {
            push(lines, format!("   • IP: {ip}"));
        }
        if let Some(alias) = text(intf, "alias") {
            push(lines, format!("   • Alias: {alias}"));
        }
    })
}

// ── Results & errors ─────────────────────────────────────────────────

pub fn operation_result(
    operation: &str,
    device_id: &str,
    success: bool,
    details: Option<&str>,
    error: Option<&str>,
) -> String {
    let status = if success { "SUCCESS" } else { "FAILED" };
    let mut out = format!(
        "Operation {status}\n   • Operation: {operation}\n   • Device: {device_id}\n   • Time: {}\n",
        Local::now().format(TIME_FORMAT)
    );
    match (success, details, error) {
        (true, Some(details), _) => {
            let _ = write!(out, "\nDetails:\n   {details}\n");
        }
        (false, _, Some(error)) => {
            let _ = write!(out, "\nError:\n   {error}\n");
        }
        _ => {}
    }
    out
}

pub fn error(operation: &str, device_id: &str, message: &str) -> String {
    format!("Error in operation: {operation}\nDevice: {device_id}\nError: {message}\n")
}

pub fn not_found(label: &str, key: &str, device_id: &str) -> String {
    format!("No {label} '{key}' found on device {device_id}")
}

pub fn health(report: &HealthReport) -> String {
    let mut lines = vec![
        "**FortiGate MCP Server Health**".to_owned(),
        format!("   • Status: {}", report.status),
        format!("   • Server: {} {}", report.server, report.version),
        format!("   • Timestamp: {}", report.timestamp),
        format!("   • Registered Devices: {}", report.registered_devices),
    ];
    if !report.device_connections.is_empty() {
        lines.extend([String::new(), "**Device Connections**".to_owned()]);
        lines.extend(
            report
                .device_connections
                .iter()
                .map(|(id, state)| format!("   • {id}: {state}")),
        );
    }
    lines.join("\n")
}

/// Pretty JSON, optionally under a title line.
pub fn json(title: Option<&str>, data: &Value) -> String {
    let body = serde_json::to_string_pretty(data).unwrap_or_default();
    match title {
        Some(title) => format!("{title}\n\n{body}"),
        None => body,
    }
}
