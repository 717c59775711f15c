//! CRUD operations over FortiGate configuration tables.
//!
//! Every operation resolves the device through the registry first, so an
//! unknown id fails with [`CoreError::UnknownDevice`] before any network
//! traffic. Payloads come back as raw JSON in the appliance's
//! `{"results": ...}` envelope; rendering belongs to the caller.

use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded::byte_serialize;

use crate::error::CoreError;
use crate::registry::DeviceRegistry;

/// A CMDB table the gateway manages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    FirewallPolicy,
    Address,
    Service,
    StaticRoute,
    Interface,
    VirtualIp,
}

impl ResourceKind {
    /// Collection endpoint, relative to `/api/v2`.
    pub fn collection_path(self) -> &'static str {
        match self {
            Self::FirewallPolicy => "cmdb/firewall/policy",
            Self::Address => "cmdb/firewall/address",
            Self::Service => "cmdb/firewall.service/custom",
            Self::StaticRoute => "cmdb/router/static",
            Self::Interface => "cmdb/system/interface",
            Self::VirtualIp => "cmdb/firewall/vip",
        }
    }

    /// Single-item endpoint for `key` (policy id, object name, route seq-num).
    pub fn item_path(self, key: &str) -> String {
        format!("{}/{}", self.collection_path(), encode_key(key))
    }

    /// Human label used in messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::FirewallPolicy => "firewall policy",
            Self::Address => "address object",
            Self::Service => "service object",
            Self::StaticRoute => "static route",
            Self::Interface => "interface",
            Self::VirtualIp => "virtual IP",
        }
    }
}

/// Percent-encode an item key into exactly one path segment.
///
/// Object names may contain spaces and slashes (`"LAN 10.0.0.0/24"`), so
/// everything outside the unreserved set is escaped and spaces become `%20`.
pub fn encode_key(key: &str) -> String {
    byte_serialize(key.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Collapse the two shapes a single-item GET can take.
///
/// The appliance answers either `{"results": {...}}` or
/// `{"results": [{...}]}`; both yield the inner object. An empty or missing
/// `results` yields `None`.
pub fn normalize_detail(payload: &Value) -> Option<&Value> {
    match payload.get("results")? {
        Value::Array(items) => items.first(),
        Value::Object(map) if map.is_empty() => None,
        item @ Value::Object(_) => Some(item),
        _ => None,
    }
}

/// Resource operations bound to a registry.
#[derive(Debug, Clone, Copy)]
pub struct Resources<'r> {
    registry: &'r DeviceRegistry,
}

impl<'r> Resources<'r> {
    pub fn new(registry: &'r DeviceRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r DeviceRegistry {
        self.registry
    }

    pub async fn list(
        &self,
        device_id: &str,
        kind: ResourceKind,
        vdom: Option<&str>,
    ) -> Result<Value, CoreError> {
        let session = self.registry.get(device_id)?;
        Ok(session.get(kind.collection_path(), vdom).await?)
    }

    /// Raw single-item payload; pass it through [`normalize_detail`].
    pub async fn get_detail(
        &self,
        device_id: &str,
        kind: ResourceKind,
        key: &str,
        vdom: Option<&str>,
    ) -> Result<Value, CoreError> {
        let key = require_key(key)?;
        let session = self.registry.get(device_id)?;
        Ok(session.get(&kind.item_path(key), vdom).await?)
    }

    pub async fn create(
        &self,
        device_id: &str,
        kind: ResourceKind,
        body: &Value,
        vdom: Option<&str>,
    ) -> Result<Value, CoreError> {
        let session = self.registry.get(device_id)?;
        Ok(session.post(kind.collection_path(), body, vdom).await?)
    }

    pub async fn update(
        &self,
        device_id: &str,
        kind: ResourceKind,
        key: &str,
        body: &Value,
        vdom: Option<&str>,
    ) -> Result<Value, CoreError> {
        let key = require_key(key)?;
        let session = self.registry.get(device_id)?;
        Ok(session.put(&kind.item_path(key), body, vdom).await?)
    }

    pub async fn delete(
        &self,
        device_id: &str,
        kind: ResourceKind,
        key: &str,
        vdom: Option<&str>,
    ) -> Result<Value, CoreError> {
        let key = require_key(key)?;
        let session = self.registry.get(device_id)?;
        Ok(session.delete(&kind.item_path(key), vdom).await?)
    }
}

fn require_key(key: &str) -> Result<&str, CoreError> {
    let key = key.trim();
    if key.is_empty() {
        Err(CoreError::missing("key"))
    } else {
        Ok(key)
    }
}
