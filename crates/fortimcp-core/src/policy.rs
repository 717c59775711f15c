//! Firewall policy analysis.
//!
//! A policy document references interfaces, addresses, services and its
//! schedule by name, and the appliance spells each reference either as a
//! bare string or as `{"name": ...}`. [`NameRef`] absorbs both shapes at the
//! boundary; everything past [`extract_names`] works with plain names.
//!
//! On top of that this module provides:
//!
//! - name resolution against the address and service tables, with missing
//!   names reported as [`Resolution::Unresolved`]
//! - an additive 0-10 risk score with one factor line per triggered check
//! - an ordered list of hardening recommendations

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::CoreError;
use crate::resource::{ResourceKind, Resources, normalize_detail};

// ── Name references ──────────────────────────────────────────────────

/// A reference to a named object inside a policy field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameRef {
    /// `"all"`
    Raw(String),
    /// `{"name": "all", "q_origin_key": "all"}`
    Named { name: String },
}

impl NameRef {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Raw(s.clone())),
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .map(|name| Self::Named {
                    name: name.to_owned(),
                }),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Raw(name) | Self::Named { name } => name,
        }
    }

    pub fn into_name(self) -> String {
        match self {
            Self::Raw(name) | Self::Named { name } => name,
        }
    }
}

/// All references in `field`, which may be a list or a single value.
/// Entries that carry no name are skipped.
pub fn extract_refs(field: Option<&Value>) -> Vec<NameRef> {
    match field {
        Some(Value::Array(items)) => items.iter().filter_map(NameRef::from_value).collect(),
        Some(single) => NameRef::from_value(single).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Names referenced by `policy[field]`.
pub fn extract_names(policy: &Value, field: &str) -> Vec<String> {
    extract_refs(policy.get(field))
        .into_iter()
        .map(NameRef::into_name)
        .collect()
}

/// Absent, null, empty string, empty collection, zero and `false` all
/// count as "not configured".
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
    }
}

fn any_named(names: &[String], wanted: &str) -> bool {
    names.iter().any(|n| n == wanted)
}

fn any_contains(names: &[String], needles: &[&str]) -> bool {
    names.iter().any(|n| {
        let lower = n.to_lowercase();
        needles.iter().any(|needle| lower.contains(needle))
    })
}

fn logs_all_traffic(policy: &Value) -> bool {
    policy.get("logtraffic").and_then(Value::as_str) == Some("all")
}

// ── Risk scoring ─────────────────────────────────────────────────────

pub const MAX_RISK_SCORE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    /// 0..=10
    pub score: u8,
    /// One line per triggered check, in check order.
    pub factors: Vec<String>,
}

impl RiskAssessment {
    pub fn level(&self) -> RiskLevel {
        match self.score {
            7.. => RiskLevel::High,
            4..=6 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

/// Score a policy document.
///
/// | check                                                    | points |
/// |----------------------------------------------------------|--------|
/// | any source address is `all`                              | 3      |
/// | any destination address is `all`                         | 2      |
/// | any service is `ALL`                                     | 2      |
/// | `logtraffic` is not `all`                                | 1      |
/// | no `av-profile`                                          | 1      |
/// | no `ips-sensor`                                          | 1      |
/// | source interface `*wan*` to `*internal*`/`*lan*`, no IPS | 2      |
///
/// The sum is capped at [`MAX_RISK_SCORE`].
pub fn assess_risk(policy: &Value) -> RiskAssessment {
    let mut score: u8 = 0;
    let mut factors = Vec::new();
    let mut flag = |points: u8, factor: &str| {
        score += points;
        factors.push(factor.to_owned());
    };

    if any_named(&extract_names(policy, "srcaddr"), "all") {
        flag(3, "Source address 'all' - global access");
    }
    if any_named(&extract_names(policy, "dstaddr"), "all") {
        flag(2, "Destination address 'all' - broad destination access");
    }
    if any_named(&extract_names(policy, "service"), "ALL") {
        flag(2, "Service 'ALL' - every port open");
    }
    if !logs_all_traffic(policy) {
        flag(1, "Traffic logging disabled");
    }
    if !is_truthy(policy.get("av-profile")) {
        flag(1, "No antivirus profile");
    }
    let has_ips = is_truthy(policy.get("ips-sensor"));
    if !has_ips {
        flag(1, "No IPS sensor");
    }

    let wan_to_lan = any_contains(&extract_names(policy, "srcintf"), &["wan"])
        && any_contains(&extract_names(policy, "dstintf"), &["internal", "lan"]);
    if wan_to_lan && !has_ips {
        flag(2, "WAN to LAN access without IPS protection");
    }

    if factors.is_empty() {
        factors.push("No significant security risk detected".to_owned());
    }

    RiskAssessment {
        score: score.min(MAX_RISK_SCORE),
        factors,
    }
}

/// Hardening advice, in a fixed order.
pub fn recommendations(policy: &Value) -> Vec<String> {
    let mut out = Vec::new();
    let mut advise = |text: &str| out.push(text.to_owned());

    if any_named(&extract_names(policy, "srcaddr"), "all") {
        advise("Narrow the source address to specific IP ranges");
    }
    if any_named(&extract_names(policy, "service"), "ALL") {
        advise("Limit the service definition to specific ports");
    }
    if !logs_all_traffic(policy) {
        advise("Enable traffic logging (security and utm)");
    }
    if !is_truthy(policy.get("av-profile")) {
        advise("Attach an antivirus profile");
    }
    if !is_truthy(policy.get("ips-sensor")) {
        advise("Attach an IPS sensor");
    }
    if !is_truthy(policy.get("application-list")) {
        advise("Attach an application control profile");
    }
    if !is_truthy(policy.get("webfilter-profile")) {
        advise("Attach a web filtering profile");
    }

    let accepts = policy.get("action").and_then(Value::as_str) == Some("accept");
    if accepts
        && !is_truthy(policy.get("nat"))
        && any_contains(&extract_names(policy, "dstintf"), &["wan"])
    {
        advise("Enable NAT for internet egress");
    }

    out
}

// ── Name resolution ──────────────────────────────────────────────────

/// Outcome of looking a referenced name up in an object table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Resolution {
    Resolved { name: String, value: String },
    Unresolved { name: String },
}

impl Resolution {
    pub fn name(&self) -> &str {
        match self {
            Self::Resolved { name, .. } | Self::Unresolved { name } => name,
        }
    }
}

fn str_field<'v>(object: &'v Value, key: &str) -> Option<&'v str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Subnet, else `start-ip - end-ip`, else FQDN, else the object type.
pub fn address_summary(object: &Value) -> String {
    if let Some(subnet) = str_field(object, "subnet") {
        return subnet.to_owned();
    }
    if let (Some(start), Some(end)) = (str_field(object, "start-ip"), str_field(object, "end-ip")) {
        return format!("{start} - {end}");
    }
    str_field(object, "fqdn")
        .or_else(|| str_field(object, "type"))
        .unwrap_or("unknown")
        .to_owned()
}

/// `TCP {range}`, else `UDP {range}`, else the upper-cased protocol.
pub fn service_summary(object: &Value) -> String {
    if let Some(range) = str_field(object, "tcp-portrange") {
        return format!("TCP {range}");
    }
    if let Some(range) = str_field(object, "udp-portrange") {
        return format!("UDP {range}");
    }
    str_field(object, "protocol")
        .unwrap_or("unknown")
        .to_uppercase()
}

/// Resolve `names` against a collection payload (`{"results": [...]}`).
///
/// Returns `None` when the payload has no `results` list, so callers can
/// tell "table unavailable" apart from "name not in table".
pub fn resolve(
    names: &[String],
    collection: &Value,
    summarize: fn(&Value) -> String,
) -> Option<Vec<Resolution>> {
    let items = collection.get("results")?.as_array()?;
    let by_name: HashMap<&str, &Value> = items
        .iter()
        .filter_map(|item| Some((item.get("name")?.as_str()?, item)))
        .collect();

    Some(
        names
            .iter()
            .map(|name| match by_name.get(name.as_str()) {
                Some(object) => Resolution::Resolved {
                    name: name.clone(),
                    value: summarize(object),
                },
                None => Resolution::Unresolved { name: name.clone() },
            })
            .collect(),
    )
}

// ── Policy detail ────────────────────────────────────────────────────

/// A firewall policy with its references resolved and analysed.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyDetail {
    /// The policy document as returned by the appliance.
    pub policy: Value,
    pub source_interfaces: Vec<String>,
    pub destination_interfaces: Vec<String>,
    pub sources: Vec<String>,
    pub destinations: Vec<String>,
    pub services: Vec<String>,
    pub schedule: String,
    /// `None` when the address table could not be fetched.
    pub resolved_sources: Option<Vec<Resolution>>,
    pub resolved_destinations: Option<Vec<Resolution>>,
    /// `None` when the service table could not be fetched.
    pub resolved_services: Option<Vec<Resolution>>,
    pub risk: RiskAssessment,
    pub recommendations: Vec<String>,
}

impl PolicyDetail {
    pub fn build(policy: &Value, addresses: Option<&Value>, services: Option<&Value>) -> Self {
        let sources = extract_names(policy, "srcaddr");
        let destinations = extract_names(policy, "dstaddr");
        let service_names = extract_names(policy, "service");

        let resolved_sources = addresses.and_then(|a| resolve(&sources, a, address_summary));
        let resolved_destinations =
            addresses.and_then(|a| resolve(&destinations, a, address_summary));
        let resolved_services =
            services.and_then(|s| resolve(&service_names, s, service_summary));

        let schedule = extract_names(policy, "schedule")
            .into_iter()
            .next()
            .unwrap_or_else(|| "always".to_owned());

        Self {
            source_interfaces: extract_names(policy, "srcintf"),
            destination_interfaces: extract_names(policy, "dstintf"),
            sources,
            destinations,
            services: service_names,
            schedule,
            resolved_sources,
            resolved_destinations,
            resolved_services,
            risk: assess_risk(policy),
            recommendations: recommendations(policy),
            policy: policy.clone(),
        }
    }
}

impl Resources<'_> {
    /// Fetch a policy and cross-reference it against the address and
    /// service tables.
    ///
    /// A failure fetching the policy itself propagates. Failures fetching
    /// the tables only make the matching resolution `None`. Returns
    /// `Ok(None)` when the appliance has no such policy.
    pub async fn policy_detail(
        &self,
        device_id: &str,
        policy_id: &str,
        vdom: Option<&str>,
    ) -> Result<Option<PolicyDetail>, CoreError> {
        let payload = self
            .get_detail(device_id, ResourceKind::FirewallPolicy, policy_id, vdom)
            .await?;
        let Some(policy) = normalize_detail(&payload) else {
            return Ok(None);
        };

        let (addresses, services) = tokio::join!(
            self.list(device_id, ResourceKind::Address, vdom),
            self.list(device_id, ResourceKind::Service, vdom),
        );
        let addresses = addresses
            .inspect_err(|e| debug!(device = device_id, error = %e, "address table unavailable"))
            .ok();
        let services = services
            .inspect_err(|e| debug!(device = device_id, error = %e, "service table unavailable"))
            .ok();

        Ok(Some(PolicyDetail::build(
            policy,
            addresses.as_ref(),
            services.as_ref(),
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn risky_policy() -> Value {
        json!({
            "policyid": 1,
            "name": "wan-in",
            "action": "accept",
            "srcintf": [{ "name": "wan1" }],
            "dstintf": [{ "name": "internal" }],
            "srcaddr": [{ "name": "all" }],
            "dstaddr": ["all"],
            "service": [{ "name": "ALL" }],
            "logtraffic": "utm",
            "av-profile": "",
            "ips-sensor": ""
        })
    }

    #[test]
    fn name_refs_accept_both_shapes() {
        let field = json!(["web", { "name": "db", "q_origin_key": "db" }, 7, {}]);
        let refs = extract_refs(Some(&field));
        assert_eq!(
            refs,
            vec![
                NameRef::Raw("web".into()),
                NameRef::Named { name: "db".into() }
            ]
        );
        assert_eq!(refs[1].name(), "db");
    }

    #[test]
    fn single_value_field_is_one_ref() {
        let policy = json!({ "schedule": "always" });
        assert_eq!(extract_names(&policy, "schedule"), vec!["always"]);
        assert!(extract_names(&policy, "missing").is_empty());
    }

    #[test]
    fn fully_open_wan_policy_is_capped_at_ten() {
        let risk = assess_risk(&risky_policy());
        // 3 + 2 + 2 + 1 + 1 + 1 + 2 = 12, capped
        assert_eq!(risk.score, 10);
        assert_eq!(risk.level(), RiskLevel::High);
        assert_eq!(
            risk.factors,
            vec![
                "Source address 'all' - global access",
                "Destination address 'all' - broad destination access",
                "Service 'ALL' - every port open",
                "Traffic logging disabled",
                "No antivirus profile",
                "No IPS sensor",
                "WAN to LAN access without IPS protection",
            ]
        );
    }

    #[test]
    fn hardened_policy_has_no_risk() {
        let policy = json!({
            "srcaddr": [{ "name": "branch-net" }],
            "dstaddr": [{ "name": "dmz-web" }],
            "service": [{ "name": "HTTPS" }],
            "logtraffic": "all",
            "av-profile": "default",
            "ips-sensor": "default",
        });
        let risk = assess_risk(&policy);
        assert_eq!(risk.score, 0);
        assert_eq!(risk.level(), RiskLevel::Low);
        assert_eq!(risk.factors, vec!["No significant security risk detected"]);
    }

    #[test]
    fn score_is_exact_sum_below_cap() {
        let policy = json!({
            "srcaddr": ["all"],
            "dstaddr": ["web"],
            "service": ["HTTPS"],
            "logtraffic": "all",
            "av-profile": "default",
        });
        let risk = assess_risk(&policy);
        // source all (3) + no IPS (1)
        assert_eq!(risk.score, 4);
        assert_eq!(risk.level(), RiskLevel::Medium);
        assert_eq!(risk.factors.len(), 2);
    }

    #[test]
    fn wan_to_lan_bonus_needs_missing_ips() {
        let mut policy = risky_policy();
        policy["ips-sensor"] = json!("default");
        let risk = assess_risk(&policy);
        assert!(!risk.factors.iter().any(|f| f.contains("WAN to LAN")));
        // 3 + 2 + 2 + 1 + 1
        assert_eq!(risk.score, 9);
    }

    #[test]
    fn scoring_is_deterministic() {
        let policy = risky_policy();
        assert_eq!(assess_risk(&policy), assess_risk(&policy));
    }

    #[test]
    fn recommendations_follow_check_order() {
        let mut policy = risky_policy();
        policy["dstintf"] = json!([{ "name": "wan2" }]);

        assert_eq!(
            recommendations(&policy),
            vec![
                "Narrow the source address to specific IP ranges",
                "Limit the service definition to specific ports",
                "Enable traffic logging (security and utm)",
                "Attach an antivirus profile",
                "Attach an IPS sensor",
                "Attach an application control profile",
                "Attach a web filtering profile",
                "Enable NAT for internet egress",
            ]
        );
    }

    #[test]
    fn configured_nat_suppresses_nat_advice() {
        let mut policy = risky_policy();
        policy["dstintf"] = json!([{ "name": "wan2" }]);
        policy["nat"] = json!("enable");
        assert!(!recommendations(&policy).iter().any(|r| r.contains("NAT")));
    }

    #[test]
    fn unresolved_names_are_reported() {
        let addresses = json!({
            "results": [
                { "name": "web", "subnet": "10.0.0.10 255.255.255.255" },
                { "name": "pool", "start-ip": "10.0.1.1", "end-ip": "10.0.1.9" },
                { "name": "site", "fqdn": "example.com" }
            ]
        });
        let names = vec!["web".to_owned(), "pool".to_owned(), "ghost".to_owned(), "site".to_owned()];

        let resolved = resolve(&names, &addresses, address_summary).unwrap();
        assert_eq!(
            resolved,
            vec![
                Resolution::Resolved {
                    name: "web".into(),
                    value: "10.0.0.10 255.255.255.255".into()
                },
                Resolution::Resolved {
                    name: "pool".into(),
                    value: "10.0.1.1 - 10.0.1.9".into()
                },
                Resolution::Unresolved {
                    name: "ghost".into()
                },
                Resolution::Resolved {
                    name: "site".into(),
                    value: "example.com".into()
                },
            ]
        );
    }

    #[test]
    fn service_summary_prefers_tcp_then_udp_then_protocol() {
        assert_eq!(service_summary(&json!({ "tcp-portrange": "443" })), "TCP 443");
        assert_eq!(service_summary(&json!({ "udp-portrange": "53" })), "UDP 53");
        assert_eq!(service_summary(&json!({ "protocol": "icmp" })), "ICMP");
    }

    #[test]
    fn missing_table_means_no_resolution() {
        let detail = PolicyDetail::build(&risky_policy(), None, Some(&json!({ "status": "error" })));
        assert!(detail.resolved_sources.is_none());
        assert!(detail.resolved_services.is_none());
        assert_eq!(detail.schedule, "always");
        assert_eq!(detail.source_interfaces, vec!["wan1"]);
    }
}
