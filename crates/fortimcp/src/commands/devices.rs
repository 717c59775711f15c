//! Device inspection handlers.

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::Tabled;

use fortimcp_config::Config;
use fortimcp_core::DeviceSummary;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::build_registry;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "VDOM")]
    vdom: String,
    #[tabled(rename = "Auth")]
    auth: String,
    #[tabled(rename = "TLS Verify")]
    verify: String,
}

impl From<&DeviceSummary> for DeviceRow {
    fn from(d: &DeviceSummary) -> Self {
        Self {
            id: d.id.clone(),
            host: format!("{}:{}", d.host, d.port),
            vdom: d.vdom.clone(),
            auth: d.auth_mode.to_string(),
            verify: if d.verify_tls { "yes" } else { "no" }.into(),
        }
    }
}

/// Outcome of probing one device.
#[derive(Debug, Serialize)]
struct ProbeResult {
    id: String,
    reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Tabled)]
struct ProbeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn probe_row(probe: &ProbeResult, color: bool) -> ProbeRow {
    let status = match (probe.reachable, color) {
        (true, true) => "reachable".green().to_string(),
        (true, false) => "reachable".into(),
        (false, true) => "unreachable".red().to_string(),
        (false, false) => "unreachable".into(),
    };
    ProbeRow {
        id: probe.id.clone(),
        status,
        detail: probe
            .version
            .clone()
            .or_else(|| probe.error.clone())
            .unwrap_or_default(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: DevicesArgs, config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let registry = build_registry(config)?;

    match args.command {
        DevicesCommand::List => {
            let devices = registry.describe();
            let out = output::render_list(
                &global.output,
                &devices,
                |d| DeviceRow::from(d),
                |d| d.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Test => {
            let probes: Vec<ProbeResult> = registry
                .probe_all()
                .await
                .into_iter()
                .map(|(id, result)| match result {
                    Ok(status) => ProbeResult {
                        id,
                        reachable: true,
                        version: status
                            .get("version")
                            .and_then(serde_json::Value::as_str)
                            .map(str::to_owned),
                        error: None,
                    },
                    Err(e) => ProbeResult {
                        id,
                        reachable: false,
                        version: None,
                        error: Some(e.to_string()),
                    },
                })
                .collect();

            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &probes,
                |p| probe_row(p, color),
                |p| format!("{}\t{}", p.id, if p.reachable { "ok" } else { "failed" }),
            );
            output::print_output(&out, global.quiet);

            let count = probes.iter().filter(|p| !p.reachable).count();
            if count > 0 {
                return Err(CliError::Unreachable { count });
            }
            Ok(())
        }
    }
}
