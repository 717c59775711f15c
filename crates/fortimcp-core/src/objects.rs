// ── Create payloads ──
//
// Typed request bodies for the create operations that take discrete
// fields instead of a raw appliance document. Deserialize from tool
// arguments (accepting the argument names), serialize to the appliance's
// field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

fn require(name: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        Err(CoreError::missing(name))
    } else {
        Ok(())
    }
}

fn to_body<T: Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}

/// `cmdb/firewall/address` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewAddress {
    pub name: String,
    #[serde(rename = "type", alias = "address_type")]
    pub address_type: String,
    #[serde(alias = "address")]
    pub subnet: String,
}

impl NewAddress {
    pub fn validate(&self) -> Result<(), CoreError> {
        require("name", &self.name)?;
        require("address_type", &self.address_type)?;
        require("address", &self.subnet)
    }

    pub fn to_body(&self) -> Value {
        to_body(self)
    }
}

/// `cmdb/firewall.service/custom` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewService {
    pub name: String,
    #[serde(rename = "type", alias = "service_type")]
    pub service_type: String,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

impl NewService {
    pub fn validate(&self) -> Result<(), CoreError> {
        require("name", &self.name)?;
        require("service_type", &self.service_type)?;
        require("protocol", &self.protocol)
    }

    pub fn to_body(&self) -> Value {
        to_body(self)
    }
}

/// `cmdb/router/static` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewStaticRoute {
    pub dst: String,
    pub gateway: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl NewStaticRoute {
    pub fn validate(&self) -> Result<(), CoreError> {
        require("dst", &self.dst)?;
        require("gateway", &self.gateway)
    }

    pub fn to_body(&self) -> Value {
        to_body(self)
    }
}

/// `cmdb/firewall/vip` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewVirtualIp {
    pub name: String,
    pub extip: String,
    pub mappedip: String,
    pub extintf: String,
    #[serde(default = "default_portforward")]
    pub portforward: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappedport: Option<String>,
}

fn default_portforward() -> String {
    "disable".into()
}
fn default_protocol() -> String {
    "tcp".into()
}

impl NewVirtualIp {
    pub fn validate(&self) -> Result<(), CoreError> {
        require("name", &self.name)?;
        require("extip", &self.extip)?;
        require("mappedip", &self.mappedip)?;
        require("extintf", &self.extintf)
    }

    pub fn to_body(&self) -> Value {
        to_body(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn address_accepts_argument_names_and_emits_appliance_fields() {
        let addr: NewAddress = serde_json::from_value(json!({
            "name": "web01",
            "address_type": "ipmask",
            "address": "10.0.0.10/32"
        }))
        .unwrap();

        addr.validate().unwrap();
        assert_eq!(
            addr.to_body(),
            json!({ "name": "web01", "type": "ipmask", "subnet": "10.0.0.10/32" })
        );
    }

    #[test]
    fn service_port_is_optional() {
        let svc: NewService = serde_json::from_value(json!({
            "name": "ssh-alt",
            "service_type": "custom",
            "protocol": "TCP/UDP/SCTP"
        }))
        .unwrap();
        assert!(svc.to_body().get("port").is_none());
    }

    #[test]
    fn virtual_ip_defaults() {
        let vip: NewVirtualIp = serde_json::from_value(json!({
            "name": "web-vip",
            "extip": "203.0.113.10",
            "mappedip": "10.0.0.10",
            "extintf": "wan1"
        }))
        .unwrap();

        vip.validate().unwrap();
        let body = vip.to_body();
        assert_eq!(body["portforward"], "disable");
        assert_eq!(body["protocol"], "tcp");
        assert!(body.get("extport").is_none());
    }

    #[test]
    fn blank_required_fields_fail_validation() {
        let route = NewStaticRoute {
            dst: "0.0.0.0/0".into(),
            gateway: " ".into(),
            device: None,
        };
        let err = route.validate().unwrap_err();
        assert_eq!(err.to_string(), "Parameter 'gateway' is required");
    }
}
