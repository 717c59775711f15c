//! MCP tool catalogue and dispatch.
//!
//! Every tool is one row in [`TOOLS`]; the same table feeds `tools/list`,
//! `get_schema_info` and the required-parameter check that runs before a
//! handler is invoked. Handlers resolve the device through the registry,
//! call a core operation and render the outcome with [`crate::format`].
//! Failures become an error report (`isError: true`) naming the operation
//! and the device, with HTTP statuses mapped to actionable messages.

use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{info, warn};

use fortimcp_config::ServerConfig;
use fortimcp_core::{
    CoreError, DeviceRegistry, DeviceSettings, NewAddress, NewService, NewStaticRoute,
    NewVirtualIp, ResourceKind, Resources, normalize_detail,
};

use crate::format;

pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

// ── Catalogue ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    DeviceTools,
    FirewallTools,
    NetworkTools,
    RoutingTools,
    VirtualIpTools,
    ServerTools,
}

#[derive(Debug)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct ToolSpec {
    pub name: &'static str,
    pub category: Category,
    pub description: &'static str,
    pub params: &'static [Param],
}

const fn req(name: &'static str, kind: ParamKind, description: &'static str) -> Param {
    Param {
        name,
        kind,
        required: true,
        description,
    }
}

const fn opt(name: &'static str, kind: ParamKind, description: &'static str) -> Param {
    Param {
        name,
        kind,
        required: false,
        description,
    }
}

const DEVICE_ID: Param = req("device_id", ParamKind::String, "Registered device identifier");
const VDOM: Param = opt(
    "vdom",
    ParamKind::String,
    "Virtual domain; defaults to the device's configured VDOM",
);

macro_rules! tool {
    ($name:literal, $category:ident, $description:literal, [$($param:expr),* $(,)?]) => {
        ToolSpec {
            name: $name,
            category: Category::$category,
            description: $description,
            params: &[$($param),*],
        }
    };
}

use ParamKind::{Boolean, Integer, Object, String as Str};

pub static TOOLS: &[ToolSpec] = &[
    // Devices
    tool!("list_devices", DeviceTools, "List all registered FortiGate devices", []),
    tool!("get_device_status", DeviceTools, "Get device system status", [DEVICE_ID]),
    tool!("test_device_connection", DeviceTools, "Test device connection", [DEVICE_ID]),
    tool!("discover_vdoms", DeviceTools, "Discover device VDOMs", [DEVICE_ID]),
    tool!("add_device", DeviceTools, "Add a new FortiGate device", [
        DEVICE_ID,
        req("host", Str, "Management IP address or hostname"),
        opt("port", Integer, "HTTPS port (default 443)"),
        opt("username", Str, "Username for basic authentication"),
        opt("password", Str, "Password for basic authentication"),
        opt("api_token", Str, "REST API token (preferred over username/password)"),
        opt("vdom", Str, "Default virtual domain (default root)"),
        opt("verify_ssl", Boolean, "Verify the device TLS certificate (default false)"),
        opt("timeout", Integer, "Request timeout in seconds (default 30)"),
    ]),
    tool!("remove_device", DeviceTools, "Remove a FortiGate device", [DEVICE_ID]),
    // Firewall policies
    tool!("list_firewall_policies", FirewallTools, "List firewall policies", [DEVICE_ID, VDOM]),
    tool!("create_firewall_policy", FirewallTools, "Create firewall policy", [
        DEVICE_ID,
        req("policy_data", Object, "Policy document in FortiGate CMDB format"),
        VDOM,
    ]),
    tool!("update_firewall_policy", FirewallTools, "Update firewall policy", [
        DEVICE_ID,
        req("policy_id", Str, "Policy identifier"),
        req("policy_data", Object, "Fields to change"),
        VDOM,
    ]),
    tool!(
        "get_firewall_policy_detail",
        FirewallTools,
        "Get detailed information for a specific firewall policy",
        [DEVICE_ID, req("policy_id", Str, "Policy identifier"), VDOM]
    ),
    tool!("delete_firewall_policy", FirewallTools, "Delete firewall policy", [
        DEVICE_ID,
        req("policy_id", Str, "Policy identifier"),
        VDOM,
    ]),
    // Address objects
    tool!("list_address_objects", NetworkTools, "List address objects", [DEVICE_ID, VDOM]),
    tool!("create_address_object", NetworkTools, "Create address object", [
        DEVICE_ID,
        req("name", Str, "Object name"),
        req("address_type", Str, "Address type, e.g. ipmask, iprange, fqdn"),
        req("address", Str, "Address value, e.g. 192.168.1.0/24"),
        VDOM,
    ]),
    tool!("get_address_object_detail", NetworkTools, "Get address object detail", [
        DEVICE_ID,
        req("name", Str, "Object name"),
        VDOM,
    ]),
    tool!("update_address_object", NetworkTools, "Update address object", [
        DEVICE_ID,
        req("name", Str, "Object name"),
        req("address_data", Object, "Fields to change"),
        VDOM,
    ]),
    tool!("delete_address_object", NetworkTools, "Delete address object", [
        DEVICE_ID,
        req("name", Str, "Object name"),
        VDOM,
    ]),
    // Service objects
    tool!("list_service_objects", NetworkTools, "List service objects", [DEVICE_ID, VDOM]),
    tool!("create_service_object", NetworkTools, "Create service object", [
        DEVICE_ID,
        req("name", Str, "Object name"),
        req("service_type", Str, "Service type"),
        req("protocol", Str, "Protocol, e.g. TCP/UDP/SCTP"),
        opt("port", Str, "Port or port range"),
        VDOM,
    ]),
    tool!("get_service_object_detail", NetworkTools, "Get service object detail", [
        DEVICE_ID,
        req("name", Str, "Object name"),
        VDOM,
    ]),
    tool!("update_service_object", NetworkTools, "Update service object", [
        DEVICE_ID,
        req("name", Str, "Object name"),
        req("service_data", Object, "Fields to change"),
        VDOM,
    ]),
    tool!("delete_service_object", NetworkTools, "Delete service object", [
        DEVICE_ID,
        req("name", Str, "Object name"),
        VDOM,
    ]),
    // Routing
    tool!("list_static_routes", RoutingTools, "List static routes", [DEVICE_ID, VDOM]),
    tool!("create_static_route", RoutingTools, "Create static route", [
        DEVICE_ID,
        req("dst", Str, "Destination network, e.g. 10.10.0.0/16"),
        req("gateway", Str, "Next-hop gateway address"),
        opt("device", Str, "Outgoing interface"),
        VDOM,
    ]),
    tool!("update_static_route", RoutingTools, "Update static route", [
        DEVICE_ID,
        req("route_id", Str, "Route sequence number"),
        req("route_data", Object, "Fields to change"),
        VDOM,
    ]),
    tool!("delete_static_route", RoutingTools, "Delete static route", [
        DEVICE_ID,
        req("route_id", Str, "Route sequence number"),
        VDOM,
    ]),
    tool!("get_static_route_detail", RoutingTools, "Get static route detail", [
        DEVICE_ID,
        req("route_id", Str, "Route sequence number"),
        VDOM,
    ]),
    tool!("get_routing_table", RoutingTools, "Get routing table", [DEVICE_ID, VDOM]),
    tool!("list_interfaces", RoutingTools, "List network interfaces", [DEVICE_ID, VDOM]),
    tool!("get_interface_status", RoutingTools, "Get interface status", [
        DEVICE_ID,
        req("interface_name", Str, "Interface name, e.g. port1"),
        VDOM,
    ]),
    // Virtual IPs
    tool!("list_virtual_ips", VirtualIpTools, "List virtual IPs", [DEVICE_ID, VDOM]),
    tool!("create_virtual_ip", VirtualIpTools, "Create virtual IP", [
        DEVICE_ID,
        req("name", Str, "Virtual IP name"),
        req("extip", Str, "External IP address"),
        req("mappedip", Str, "Mapped internal IP address"),
        req("extintf", Str, "External interface"),
        opt("portforward", Str, "enable or disable (default disable)"),
        opt("protocol", Str, "tcp, udp or sctp (default tcp)"),
        opt("extport", Str, "External port or range"),
        opt("mappedport", Str, "Mapped port or range"),
        VDOM,
    ]),
    tool!("update_virtual_ip", VirtualIpTools, "Update virtual IP", [
        DEVICE_ID,
        req("name", Str, "Virtual IP name"),
        req("vip_data", Object, "Fields to change"),
        VDOM,
    ]),
    tool!("get_virtual_ip_detail", VirtualIpTools, "Get virtual IP detail", [
        DEVICE_ID,
        req("name", Str, "Virtual IP name"),
        VDOM,
    ]),
    tool!("delete_virtual_ip", VirtualIpTools, "Delete virtual IP", [
        DEVICE_ID,
        req("name", Str, "Virtual IP name"),
        VDOM,
    ]),
    // Server
    tool!("test_connection", ServerTools, "Test FortiGate connection", []),
    tool!("health", ServerTools, "Health check for FortiGate MCP server", []),
    tool!(
        "get_schema_info",
        ServerTools,
        "Get schema information for all available tools",
        []
    ),
];

pub fn find(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|spec| spec.name == name)
}

/// `tools/list` entries with a JSON-schema `inputSchema` per tool.
pub fn definitions() -> Vec<Value> {
    TOOLS
        .iter()
        .map(|spec| {
            let properties: serde_json::Map<String, Value> = spec
                .params
                .iter()
                .map(|p| {
                    (
                        p.name.to_owned(),
                        json!({ "type": p.kind.to_string(), "description": p.description }),
                    )
                })
                .collect();
            let required: Vec<&str> = spec
                .params
                .iter()
                .filter(|p| p.required)
                .map(|p| p.name)
                .collect();

            json!({
                "name": spec.name,
                "description": spec.description,
                "inputSchema": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }
            })
        })
        .collect()
}

// ── Context & results ────────────────────────────────────────────────

/// Shared state every tool call runs against.
#[derive(Debug)]
pub struct ToolContext {
    pub registry: Arc<DeviceRegistry>,
    pub server: ServerConfig,
}

impl ToolContext {
    pub fn new(registry: Arc<DeviceRegistry>, server: ServerConfig) -> Self {
        Self { registry, server }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "http://{}:{}{}",
            self.server.host, self.server.port, self.server.path
        )
    }

    fn resources(&self) -> Resources<'_> {
        Resources::new(&self.registry)
    }
}

/// Result of an MCP tool call, ready for a `tools/call` response.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// MCP content blocks; always a single text block here.
    pub content: Vec<Value>,
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": text.into() })],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }

    #[cfg(test)]
    pub fn text_content(&self) -> &str {
        self.content
            .first()
            .and_then(|c| c.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Connectivity {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub server: String,
    pub version: String,
    pub timestamp: String,
    pub registered_devices: usize,
    pub device_connections: IndexMap<String, Connectivity>,
}

// ── Arguments ────────────────────────────────────────────────────────

/// Borrowed view over a `tools/call` `arguments` object.
#[derive(Debug, Clone, Copy)]
struct Args<'a>(&'a Value);

impl<'a> Args<'a> {
    fn raw(self, name: &str) -> Option<&'a Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    /// Required string; numbers are accepted and stringified (policy ids).
    fn key(self, name: &str) -> Result<String, CoreError> {
        match self.raw(name) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_owned()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(CoreError::missing(name)),
        }
    }

    fn opt_str(self, name: &str) -> Option<&'a str> {
        self.raw(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    fn object(self, name: &str) -> Result<&'a Value, CoreError> {
        match self.raw(name) {
            Some(v @ Value::Object(_)) => Ok(v),
            Some(_) => Err(CoreError::InvalidArgument {
                name: name.to_owned(),
                reason: "must be an object".into(),
            }),
            None => Err(CoreError::missing(name)),
        }
    }

    fn int<T: TryFrom<u64>>(self, name: &str, default: T) -> Result<T, CoreError> {
        let Some(value) = self.raw(name) else {
            return Ok(default);
        };
        value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .and_then(|n| T::try_from(n).ok())
            .ok_or_else(|| CoreError::InvalidArgument {
                name: name.to_owned(),
                reason: "must be a positive integer in range".into(),
            })
    }

    fn flag(self, name: &str, default: bool) -> bool {
        self.raw(name).and_then(Value::as_bool).unwrap_or(default)
    }

    fn device(self) -> Result<String, CoreError> {
        self.key("device_id")
    }

    fn vdom(self) -> Option<&'a str> {
        self.opt_str("vdom")
    }

    fn parse<T: DeserializeOwned>(self) -> Result<T, CoreError> {
        serde_json::from_value(self.0.clone()).map_err(|e| CoreError::InvalidArgument {
            name: "arguments".into(),
            reason: e.to_string(),
        })
    }

    /// The check every handler relies on: required parameters are present
    /// and non-blank.
    fn check_required(self, spec: &ToolSpec) -> Result<(), CoreError> {
        for param in spec.params.iter().filter(|p| p.required) {
            match param.kind {
                ParamKind::Object => {
                    self.object(param.name)?;
                }
                _ => {
                    self.key(param.name)?;
                }
            }
        }
        Ok(())
    }
}

// ── Error presentation ───────────────────────────────────────────────

/// Human label for a tool, e.g. `list_firewall_policies` -> `list firewall policies`.
pub fn operation_label(tool: &str) -> String {
    tool.replace('_', " ")
}

/// Map a core error to the message shown to the caller.
pub fn friendly_message(err: &CoreError) -> String {
    match err.status() {
        Some(401) => return "Authentication failed. Check device credentials.".into(),
        Some(403) => {
            return "Permission denied. Insufficient privileges for this operation.".into();
        }
        Some(404) => return "Resource not found. The specified item may not exist.".into(),
        Some(500) => return "FortiGate internal server error. Check device status.".into(),
        _ => {}
    }

    if let CoreError::Network { message, .. } = err {
        let hint = if message.contains("timed out") {
            "Operation timed out. Check network connectivity."
        } else {
            "Connection failed. Check device network settings."
        };
        return format!("{hint} ({message})");
    }

    err.to_string()
}

// ── Dispatch ─────────────────────────────────────────────────────────

/// Run one tool call. Never fails: errors are rendered into the result.
pub async fn handle_tool_call(name: &str, args: &Value, ctx: &ToolContext) -> ToolResult {
    let Some(spec) = find(name) else {
        return ToolResult::error(format!("Unknown tool: {name}"));
    };

    let args = Args(args);
    let device = args.opt_str("device_id").unwrap_or("all").to_owned();
    let started = Instant::now();

    let outcome = match args.check_required(spec) {
        Ok(()) => dispatch(spec, args, ctx).await,
        Err(e) => Err(e),
    };
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(result) => {
            info!(tool = name, device = %device, success = !result.is_error, elapsed_ms, "tool call");
            result
        }
        Err(err) => {
            warn!(tool = name, device = %device, success = false, elapsed_ms, error = %err, "tool call");
            ToolResult::error(format::error(
                &operation_label(name),
                &device,
                &friendly_message(&err),
            ))
        }
    }
}

#[allow(clippy::too_many_lines)]
async fn dispatch(spec: &ToolSpec, args: Args<'_>, ctx: &ToolContext) -> Result<ToolResult, CoreError> {
    let res = ctx.resources();
    let vdom = args.vdom();

    match spec.name {
        // ── Devices ──
        "list_devices" => Ok(ToolResult::text(format::device_list(&ctx.registry.describe()))),
        "get_device_status" => {
            let id = args.device()?;
            let status = res.system_status(&id).await?;
            Ok(ToolResult::text(format::device_status(&id, &status)))
        }
        "test_device_connection" => Ok(test_device_connection(args, ctx).await),
        "discover_vdoms" => {
            let id = args.device()?;
            Ok(ToolResult::text(format::vdoms(&res.vdoms(&id).await?)))
        }
        "add_device" => add_device(args, ctx),
        "remove_device" => {
            let id = args.device()?;
            ctx.registry.remove(&id)?;
            Ok(done("remove device", &id, format!("Device '{id}' removed successfully")))
        }

        // ── Firewall policies ──
        "list_firewall_policies" => {
            let id = args.device()?;
            let payload = res.list(&id, ResourceKind::FirewallPolicy, vdom).await?;
            Ok(ToolResult::text(format::policies(&payload)))
        }
        "create_firewall_policy" => {
            let id = args.device()?;
            let body = args.object("policy_data")?;
            res.create(&id, ResourceKind::FirewallPolicy, body, vdom).await?;
            Ok(done("create firewall policy", &id, "Policy created successfully".into()))
        }
        "update_firewall_policy" => {
            let id = args.device()?;
            let policy_id = args.key("policy_id")?;
            let body = args.object("policy_data")?;
            res.update(&id, ResourceKind::FirewallPolicy, &policy_id, body, vdom)
                .await?;
            Ok(done(
                "update firewall policy",
                &id,
                format!("Policy {policy_id} updated successfully"),
            ))
        }
        "get_firewall_policy_detail" => {
            let id = args.device()?;
            let policy_id = args.key("policy_id")?;
            let text = match res.policy_detail(&id, &policy_id, vdom).await? {
                Some(detail) => format::policy_detail(&id, &detail),
                None => format::policy_not_found(&id),
            };
            Ok(ToolResult::text(text))
        }
        "delete_firewall_policy" => {
            let id = args.device()?;
            let policy_id = args.key("policy_id")?;
            res.delete(&id, ResourceKind::FirewallPolicy, &policy_id, vdom)
                .await?;
            Ok(done(
                "delete firewall policy",
                &id,
                format!("Policy {policy_id} deleted successfully"),
            ))
        }

        // ── Address objects ──
        "list_address_objects" => {
            let id = args.device()?;
            let payload = res.list(&id, ResourceKind::Address, vdom).await?;
            Ok(ToolResult::text(format::addresses(&payload)))
        }
        "create_address_object" => {
            let id = args.device()?;
            let address: NewAddress = args.parse()?;
            address.validate()?;
            res.create(&id, ResourceKind::Address, &address.to_body(), vdom)
                .await?;
            Ok(done(
                "create address object",
                &id,
                format!("Address object '{}' created successfully", address.name),
            ))
        }
        "get_address_object_detail" => detail(args, ctx, ResourceKind::Address, "name").await,
        "update_address_object" => {
            update(args, ctx, ResourceKind::Address, "name", "address_data").await
        }
        "delete_address_object" => delete(args, ctx, ResourceKind::Address, "name").await,

        // ── Service objects ──
        "list_service_objects" => {
            let id = args.device()?;
            let payload = res.list(&id, ResourceKind::Service, vdom).await?;
            Ok(ToolResult::text(format::services(&payload)))
        }
        "create_service_object" => {
            let id = args.device()?;
            let service: NewService = args.parse()?;
            service.validate()?;
            res.create(&id, ResourceKind::Service, &service.to_body(), vdom)
                .await?;
            Ok(done(
                "create service object",
                &id,
                format!("Service object '{}' created successfully", service.name),
            ))
        }
        "get_service_object_detail" => detail(args, ctx, ResourceKind::Service, "name").await,
        "update_service_object" => {
            update(args, ctx, ResourceKind::Service, "name", "service_data").await
        }
        "delete_service_object" => delete(args, ctx, ResourceKind::Service, "name").await,

        // ── Routing ──
        "list_static_routes" => {
            let id = args.device()?;
            let payload = res.list(&id, ResourceKind::StaticRoute, vdom).await?;
            Ok(ToolResult::text(format::static_routes(&payload)))
        }
        "create_static_route" => {
            let id = args.device()?;
            let route: NewStaticRoute = args.parse()?;
            route.validate()?;
            res.create(&id, ResourceKind::StaticRoute, &route.to_body(), vdom)
                .await?;
            Ok(done(
                "create static route",
                &id,
                format!("Static route to {} created successfully", route.dst),
            ))
        }
        "update_static_route" => {
            update(args, ctx, ResourceKind::StaticRoute, "route_id", "route_data").await
        }
        "delete_static_route" => delete(args, ctx, ResourceKind::StaticRoute, "route_id").await,
        "get_static_route_detail" => {
            detail(args, ctx, ResourceKind::StaticRoute, "route_id").await
        }
        "get_routing_table" => {
            let id = args.device()?;
            let table = res.routing_table(&id, vdom).await?;
            Ok(ToolResult::text(format::json(Some("Routing Table"), &table)))
        }
        "list_interfaces" => {
            let id = args.device()?;
            let payload = res.list(&id, ResourceKind::Interface, vdom).await?;
            Ok(ToolResult::text(format::interfaces(&payload)))
        }
        "get_interface_status" => {
            let id = args.device()?;
            let interface = args.key("interface_name")?;
            let status = res.interface_status(&id, &interface, vdom).await?;
            Ok(ToolResult::text(format::json(
                Some(&format!("Interface Status: {interface}")),
                &status,
            )))
        }

        // ── Virtual IPs ──
        "list_virtual_ips" => {
            let id = args.device()?;
            let payload = res.list(&id, ResourceKind::VirtualIp, vdom).await?;
            Ok(ToolResult::text(format::virtual_ips(&payload)))
        }
        "create_virtual_ip" => {
            let id = args.device()?;
            let vip: NewVirtualIp = args.parse()?;
            vip.validate()?;
            res.create(&id, ResourceKind::VirtualIp, &vip.to_body(), vdom)
                .await?;
            Ok(done(
                "create virtual IP",
                &id,
                format!("Virtual IP '{}' created successfully", vip.name),
            ))
        }
        "update_virtual_ip" => update(args, ctx, ResourceKind::VirtualIp, "name", "vip_data").await,
        "get_virtual_ip_detail" => detail(args, ctx, ResourceKind::VirtualIp, "name").await,
        "delete_virtual_ip" => delete(args, ctx, ResourceKind::VirtualIp, "name").await,

        // ── Server ──
        "test_connection" => Ok(ToolResult::text(format::json(
            None,
            &connection_summary(ctx).await,
        ))),
        "health" => Ok(ToolResult::text(format::health(&health_report(ctx).await))),
        "get_schema_info" => Ok(ToolResult::text(format::json(None, &schema_info(ctx)))),

        other => Err(CoreError::InvalidArgument {
            name: "name".into(),
            reason: format!("has no handler for tool '{other}'"),
        }),
    }
}

fn done(operation: &str, device_id: &str, details: String) -> ToolResult {
    ToolResult::text(format::operation_result(
        operation,
        device_id,
        true,
        Some(&details),
        None,
    ))
}

async fn detail(
    args: Args<'_>,
    ctx: &ToolContext,
    kind: ResourceKind,
    key_param: &str,
) -> Result<ToolResult, CoreError> {
    let id = args.device()?;
    let key = args.key(key_param)?;
    let payload = ctx
        .resources()
        .get_detail(&id, kind, &key, args.vdom())
        .await?;

    let text = match normalize_detail(&payload) {
        Some(object) => format::json(Some(&format!("{} {key}", capitalize(kind.label()))), object),
        None => format::not_found(kind.label(), &key, &id),
    };
    Ok(ToolResult::text(text))
}

async fn update(
    args: Args<'_>,
    ctx: &ToolContext,
    kind: ResourceKind,
    key_param: &str,
    body_param: &str,
) -> Result<ToolResult, CoreError> {
    let id = args.device()?;
    let key = args.key(key_param)?;
    let body = args.object(body_param)?;
    ctx.resources()
        .update(&id, kind, &key, body, args.vdom())
        .await?;

    Ok(done(
        &format!("update {}", kind.label()),
        &id,
        format!("{} updated successfully", subject(kind, &key)),
    ))
}

async fn delete(
    args: Args<'_>,
    ctx: &ToolContext,
    kind: ResourceKind,
    key_param: &str,
) -> Result<ToolResult, CoreError> {
    let id = args.device()?;
    let key = args.key(key_param)?;
    ctx.resources().delete(&id, kind, &key, args.vdom()).await?;

    Ok(done(
        &format!("delete {}", kind.label()),
        &id,
        format!("{} deleted successfully", subject(kind, &key)),
    ))
}

/// `Address object 'web01'`, or `Static route 3` for numbered routes.
fn subject(kind: ResourceKind, key: &str) -> String {
    let label = capitalize(kind.label());
    match kind {
        ResourceKind::StaticRoute => format!("{label} {key}"),
        _ => format!("{label} '{key}'"),
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Reports FAILED instead of an error result: an unreachable device is an
/// answer to this question, not a failure of it.
async fn test_device_connection(args: Args<'_>, ctx: &ToolContext) -> ToolResult {
    let id = args.opt_str("device_id").unwrap_or_default();
    match ctx.registry.get(id) {
        Ok(session) => {
            let reachable = session.test_connection().await;
            ToolResult::text(format::connection_test(id, reachable, None))
        }
        Err(e) => ToolResult::text(format::connection_test(id, false, Some(&e.to_string()))),
    }
}

fn add_device(args: Args<'_>, ctx: &ToolContext) -> Result<ToolResult, CoreError> {
    let id = args.device()?;
    if ctx.registry.contains(&id) {
        return Ok(ToolResult::error(format::operation_result(
            "add device",
            &id,
            false,
            None,
            Some(&format!("Device '{id}' already exists")),
        )));
    }

    let mut settings = DeviceSettings::new(args.key("host")?);
    settings.port = args.int("port", settings.port)?;
    settings.timeout = args.int("timeout", settings.timeout)?;
    settings.verify_ssl = args.flag("verify_ssl", false);
    settings.username = args.opt_str("username").map(str::to_owned);
    settings.password = args.opt_str("password").map(str::to_owned);
    settings.api_token = args.opt_str("api_token").map(str::to_owned);
    if let Some(vdom) = args.vdom() {
        settings.vdom = vdom.to_owned();
    }

    ctx.registry.register_settings(&id, &settings)?;
    Ok(done("add device", &id, format!("Device '{id}' added successfully")))
}

// ── Server-level reports ─────────────────────────────────────────────

async fn connection_summary(ctx: &ToolContext) -> Value {
    let probes = ctx.registry.probe_all().await;
    let total = probes.len();
    let devices: serde_json::Map<String, Value> = probes
        .into_iter()
        .map(|(id, result)| {
            let entry = match result {
                Ok(_) => json!({ "connected": true, "status": "connected" }),
                Err(e) => json!({ "connected": false, "status": "failed", "error": e.to_string() }),
            };
            (id, entry)
        })
        .collect();

    json!({ "devices": devices, "total_devices": total })
}

pub async fn health_report(ctx: &ToolContext) -> HealthReport {
    let device_connections: IndexMap<String, Connectivity> = ctx
        .registry
        .test_all()
        .await
        .into_iter()
        .map(|(id, ok)| {
            let state = if ok {
                Connectivity::Connected
            } else {
                Connectivity::Disconnected
            };
            (id, state)
        })
        .collect();

    let status = if device_connections
        .values()
        .all(|c| *c == Connectivity::Connected)
    {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    HealthReport {
        status,
        server: ctx.server.name.clone(),
        version: SERVER_VERSION.to_owned(),
        timestamp: Local::now().to_rfc3339(),
        registered_devices: ctx.registry.len(),
        device_connections,
    }
}

pub fn schema_info(ctx: &ToolContext) -> Value {
    let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();
    for spec in TOOLS {
        let parameters: Vec<Value> = spec
            .params
            .iter()
            .map(|p| json!({ "name": p.name, "type": p.kind, "required": p.required }))
            .collect();
        groups.entry(spec.category.to_string()).or_default().push(json!({
            "name": spec.name,
            "description": spec.description,
            "parameters": parameters,
        }));
    }

    json!({
        "server": ctx.server.name,
        "version": SERVER_VERSION,
        "endpoint": ctx.endpoint(),
        "tools": groups,
    })
}
