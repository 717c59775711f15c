//! Async client for the FortiGate REST API (v2).
//!
//! One [`DeviceSession`] per appliance: it owns the resolved credentials,
//! the derived base URL (`https://{host}:{port}/api/v2`) and a pooled
//! `reqwest::Client` built from the device's TLS and timeout settings.
//! Every call goes through [`DeviceSession::execute`], which injects the
//! VDOM, authenticates, and classifies the outcome into [`Error`].

pub mod auth;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;

pub use auth::{AuthMode, Credentials};
pub use config::{DEFAULT_PORT, DEFAULT_TIMEOUT_SECS, DEFAULT_VDOM, DeviceConfig, DeviceSettings};
pub use error::Error;
pub use session::{DeviceSession, HttpMethod};
pub use transport::{TlsMode, TransportConfig};
