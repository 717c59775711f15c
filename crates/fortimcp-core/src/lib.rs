// fortimcp-core: the domain layer between the MCP adapter and the
// FortiGate REST client.
//
// The registry owns one session per configured appliance. Resource and
// monitor operations resolve a device through it and return raw JSON (or a
// classified `CoreError`); the policy module turns a firewall policy
// document into a cross-referenced, risk-scored view. Nothing here renders
// text.

pub mod error;
pub mod monitor;
pub mod objects;
pub mod policy;
pub mod registry;
pub mod resource;

pub use error::CoreError;
pub use objects::{NewAddress, NewService, NewStaticRoute, NewVirtualIp};
pub use policy::{
    NameRef, PolicyDetail, Resolution, RiskAssessment, RiskLevel, assess_risk, extract_names,
    is_truthy, recommendations,
};
pub use registry::{DeviceRegistry, DeviceSummary};
pub use resource::{ResourceKind, Resources, encode_key, normalize_detail};

// Re-export the API types callers need to build configs and sessions.
pub use fortimcp_api::{
    AuthMode, DeviceConfig, DeviceSession, DeviceSettings, HttpMethod, TlsMode,
};
