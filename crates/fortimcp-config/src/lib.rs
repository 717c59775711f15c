//! Gateway configuration.
//!
//! One YAML, JSON or TOML file (picked by extension) layered over built-in
//! defaults, with `FORTIMCP_*` environment overrides on top. Nested keys are
//! separated by `__`, so `FORTIMCP_SERVER__PORT=9000` overrides
//! `server.port`. Device entries are handed to the registry as-is; a device
//! without credentials is a registry concern, not a validation failure.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use fortimcp_core::DeviceSettings;

pub const ENV_PREFIX: &str = "FORTIMCP_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("unsupported config format '{extension}' (expected yaml, yml, json or toml)")]
    UnsupportedFormat { extension: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Config structs ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub fortigate: FortiGateConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener settings for the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Route the JSON-RPC endpoint is mounted on.
    #[serde(default = "default_path")]
    pub path: String,

    /// Reported as `serverInfo.name`.
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_path(),
            name: default_name(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8814
}
fn default_path() -> String {
    "/fortigate-mcp".into()
}
fn default_name() -> String {
    "fortigate-mcp-server".into()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FortiGateConfig {
    /// Device id -> connection settings, in file order.
    #[serde(default)]
    pub devices: IndexMap<String, DeviceSettings>,
}

/// Bearer-token gate and CORS policy for the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub require_auth: bool,

    #[serde(default)]
    pub api_tokens: Vec<String>,

    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            require_auth: false,
            api_tokens: Vec::new(),
            allowed_origins: default_origins(),
        }
    }
}

fn default_origins() -> Vec<String> {
    vec!["*".into()]
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when neither `-v` nor `RUST_LOG` is given.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Daily-rolling log file, in addition to stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            file: None,
            console: default_console(),
        }
    }
}

fn default_level() -> String {
    "info".into()
}
fn default_console() -> bool {
    true
}

// ── Config file path ────────────────────────────────────────────────

/// Platform config location, e.g. `~/.config/fortimcp/config.yaml`.
pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("com", "fortimcp", "fortimcp").map_or_else(
        || PathBuf::from("config.yaml"),
        |dirs| dirs.config_dir().join("config.yaml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load configuration.
///
/// An explicit path must exist. Without one the platform default is used
/// if present, otherwise defaults plus environment overrides.
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match explicit {
        Some(path) => load_from(path),
        None => {
            let path = default_config_path();
            if path.exists() {
                load_from(&path)
            } else {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(base_figment().extract()?)
            }
        }
    }
}

/// Load a specific file layered between defaults and environment.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .unwrap_or_default()
        .to_ascii_lowercase();

    let figment = Figment::new().merge(Serialized::defaults(Config::default()));
    let figment = match extension.as_str() {
        "yaml" | "yml" => figment.merge(Yaml::file(path)),
        "json" => figment.merge(Json::file(path)),
        "toml" => figment.merge(Toml::file(path)),
        _ => return Err(ConfigError::UnsupportedFormat { extension }),
    };

    debug!(path = %path.display(), "loading config");
    Ok(figment.merge(env_provider()).extract()?)
}

fn base_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(env_provider())
}

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

// ── Validation ──────────────────────────────────────────────────────

impl Config {
    /// Check the invariants the gateway needs before it can start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.server.path.starts_with('/') {
            return Err(invalid("server.path", "must start with '/'"));
        }

        if self.fortigate.devices.is_empty() {
            return Err(invalid(
                "fortigate.devices",
                "at least one device must be configured",
            ));
        }

        for (id, device) in &self.fortigate.devices {
            let field = |name: &str| format!("fortigate.devices.{id}.{name}");
            if device.host.trim().is_empty() {
                return Err(invalid(field("host"), "must not be empty"));
            }
            if device.port == 0 {
                return Err(invalid(field("port"), "must be between 1 and 65535"));
            }
            if device.timeout == 0 {
                return Err(invalid(field("timeout"), "must be at least 1 second"));
            }
        }

        if self.auth.require_auth && self.auth.api_tokens.iter().all(|t| t.trim().is_empty()) {
            return Err(invalid(
                "auth.api_tokens",
                "require_auth is set but no API token is configured",
            ));
        }

        Ok(())
    }
}

// ── Example ─────────────────────────────────────────────────────────

/// A commented starting point for a new config file.
pub fn example_config() -> &'static str {
    r#"# fortimcp configuration
#
# Every key can be overridden from the environment with FORTIMCP_ and "__"
# between levels, e.g. FORTIMCP_SERVER__PORT=9000.

server:
  host: 0.0.0.0
  port: 8814
  path: /fortigate-mcp
  name: fortigate-mcp-server

fortigate:
  devices:
    # API token authentication (preferred)
    fw-hq:
      host: 192.168.1.99
      port: 443
      vdom: root
      api_token: "replace-with-rest-api-token"
      verify_ssl: false
      timeout: 30

    # Username/password authentication
    fw-branch:
      host: fw-branch.example.net
      username: admin
      password: "replace-with-password"
      vdom: root

auth:
  require_auth: false
  api_tokens: []
  allowed_origins: ["*"]

logging:
  level: info
  format: text  # or json
  console: true
  # file: /var/log/fortimcp/fortimcp.log
"#
}
