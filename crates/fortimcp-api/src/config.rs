// ── Device configuration ──
//
// `DeviceSettings` is the loose, serde-facing shape a device takes in a
// config file or an `add_device` call. `DeviceConfig` is the validated,
// immutable form a session is built from.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthMode, Credentials};
use crate::error::Error;
use crate::transport::{TlsMode, TransportConfig};

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_VDOM: &str = "root";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A device entry as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceSettings {
    /// IP address or hostname of the management interface.
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// REST API token. Preferred over username/password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(default = "default_vdom")]
    pub vdom: String,

    #[serde(default)]
    pub verify_ssl: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_vdom() -> String {
    DEFAULT_VDOM.into()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl DeviceSettings {
    /// Settings for `host` with every other field at its default.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
            api_token: None,
            vdom: default_vdom(),
            verify_ssl: false,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_basic(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// Validated, immutable connection settings for one appliance.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub host: String,
    pub port: u16,
    pub vdom: String,
    pub credentials: Credentials,
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl DeviceConfig {
    /// Validate raw settings into a config.
    ///
    /// Empty strings count as absent. When both an API token and a
    /// username/password pair are present, the token wins.
    pub fn from_settings(device_id: &str, settings: &DeviceSettings) -> Result<Self, Error> {
        let invalid = |reason: &str| Error::InvalidConfig {
            device_id: device_id.to_owned(),
            reason: reason.to_owned(),
        };

        let host = settings.host.trim();
        if host.is_empty() {
            return Err(invalid("host is required"));
        }
        if settings.port == 0 {
            return Err(invalid("port must be non-zero"));
        }
        if settings.timeout == 0 {
            return Err(invalid("timeout must be at least one second"));
        }

        let present = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_owned);

        let credentials = match (
            present(settings.api_token.as_deref()),
            present(settings.username.as_deref()),
            present(settings.password.as_deref()),
        ) {
            (Some(token), _, _) => Credentials::ApiToken {
                token: SecretString::from(token),
            },
            (None, Some(username), Some(password)) => Credentials::Basic {
                username,
                password: SecretString::from(password),
            },
            _ => {
                return Err(invalid(
                    "either api_token or username and password must be provided",
                ));
            }
        };

        let vdom = if settings.vdom.trim().is_empty() {
            DEFAULT_VDOM.to_owned()
        } else {
            settings.vdom.clone()
        };

        Ok(Self {
            host: host.to_owned(),
            port: settings.port,
            vdom,
            credentials,
            tls: TlsMode::from_verify(settings.verify_ssl),
            timeout: Duration::from_secs(settings.timeout),
        })
    }

    /// `https://{host}:{port}/api/v2` -- the port is always explicit.
    pub fn base_url(&self) -> String {
        format!("https://{}:{}/api/v2", self.host, self.port)
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.credentials.mode()
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls,
            timeout: self.timeout,
        }
    }
}
