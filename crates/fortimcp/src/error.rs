//! CLI error types with miette diagnostics.
//!
//! Maps config and core failures into user-facing errors with actionable
//! help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use fortimcp_config::ConfigError;
use fortimcp_core::CoreError;

/// Process exit codes.
#[allow(dead_code)]
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(fortimcp::no_config),
        help(
            "Pass --config <file> or set FORTIGATE_MCP_CONFIG.\n\
             Start from: fortimcp config example > config.yaml"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(fortimcp::config))]
    Config(ConfigError),

    #[error("No usable FortiGate devices ({skipped} skipped)")]
    #[diagnostic(
        code(fortimcp::no_devices),
        help(
            "Every configured device was rejected; run with -v to see why.\n\
             Each device needs an api_token or a username and password."
        )
    )]
    NoDevices { skipped: usize },

    // ── Devices ──────────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(fortimcp::device))]
    Core(#[from] CoreError),

    #[error("{count} device(s) unreachable")]
    #[diagnostic(
        code(fortimcp::unreachable),
        help("Check host, port and credentials, or raise the device timeout.")
    )]
    Unreachable { count: usize },

    // ── Server ───────────────────────────────────────────────────────

    #[error("Could not listen on {addr}")]
    #[diagnostic(
        code(fortimcp::bind),
        help("Another process may own the port; try --port or --host.")
    )]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => Self::NoConfig {
                path: path.display().to_string(),
            },
            other => Self::Config(other),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoConfig { .. } => exit_code::NOT_FOUND,
            Self::Config(ConfigError::Validation { .. } | ConfigError::UnsupportedFormat { .. }) => {
                exit_code::USAGE
            }
            Self::Core(err) => core_exit_code(err),
            Self::Unreachable { .. } | Self::Bind { .. } => exit_code::CONNECTION,
            Self::NoDevices { .. } => exit_code::AUTH,
            Self::Config(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

fn core_exit_code(err: &CoreError) -> i32 {
    match err {
        CoreError::UnknownDevice { .. } => exit_code::NOT_FOUND,
        CoreError::DuplicateDevice { .. } => exit_code::CONFLICT,
        CoreError::InvalidConfig { .. } | CoreError::InvalidArgument { .. } => exit_code::USAGE,
        CoreError::Network { message, .. } if message.contains("timed out") => exit_code::TIMEOUT,
        CoreError::Network { .. } => exit_code::CONNECTION,
        CoreError::Api { status, .. } => match status {
            401 => exit_code::AUTH,
            403 => exit_code::PERMISSION,
            404 => exit_code::NOT_FOUND,
            409 => exit_code::CONFLICT,
            _ => exit_code::GENERAL,
        },
    }
}
