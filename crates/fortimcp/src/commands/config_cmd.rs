//! Config subcommand handlers.

use serde::Serialize;

use fortimcp_config::{self as config, Config, ConfigError};
use fortimcp_core::DeviceSettings;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ConfigSummary {
    endpoint: String,
    auth_required: bool,
    log_level: String,
    devices: Vec<DeviceEntry>,
}

#[derive(Debug, Serialize)]
struct DeviceEntry {
    id: String,
    host: String,
    port: u16,
    vdom: String,
    credentials: &'static str,
}

fn credentials(settings: &DeviceSettings) -> &'static str {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    if present(&settings.api_token) {
        "token"
    } else if present(&settings.username) && present(&settings.password) {
        "basic"
    } else {
        "missing"
    }
}

fn summarize(cfg: &Config) -> ConfigSummary {
    ConfigSummary {
        endpoint: format!("http://{}:{}{}", cfg.server.host, cfg.server.port, cfg.server.path),
        auth_required: cfg.auth.require_auth,
        log_level: cfg.logging.level.clone(),
        devices: cfg
            .fortigate
            .devices
            .iter()
            .map(|(id, d)| DeviceEntry {
                id: id.clone(),
                host: d.host.clone(),
                port: d.port,
                vdom: d.vdom.clone(),
                credentials: credentials(d),
            })
            .collect(),
    }
}

fn detail(summary: &ConfigSummary) -> String {
    let mut lines = vec![
        "Configuration OK".to_owned(),
        format!("  Endpoint:      {}", summary.endpoint),
        format!("  Auth required: {}", summary.auth_required),
        format!("  Log level:     {}", summary.log_level),
        format!("  Devices:       {}", summary.devices.len()),
    ];
    lines.extend(summary.devices.iter().map(|d| {
        format!(
            "    {} -> {}:{} (vdom {}, {})",
            d.id, d.host, d.port, d.vdom, d.credentials
        )
    }));
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, cfg: Option<&Config>, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Check => {
            let Some(cfg) = cfg else {
                return Err(ConfigError::Validation {
                    field: "config".into(),
                    reason: "no configuration loaded".into(),
                }
                .into());
            };
            cfg.validate()?;

            let summary = summarize(cfg);
            for device in summary.devices.iter().filter(|d| d.credentials == "missing") {
                eprintln!(
                    "warning: device '{}' has no api_token or username/password and will be skipped",
                    device.id
                );
            }

            let out = output::render_single(&global.output, &summary, detail, |s| {
                s.devices
                    .iter()
                    .map(|d| d.id.clone())
                    .collect::<Vec<_>>()
                    .join("\n")
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Example => {
            output::print_output(config::example_config().trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            let path = global
                .config
                .clone()
                .unwrap_or_else(config::default_config_path);
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}
