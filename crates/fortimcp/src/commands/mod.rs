//! Command handlers: bridge CLI args to the registry, the MCP transports and
//! output formatting.

pub mod config_cmd;
pub mod devices;
pub mod serve;

use fortimcp_config::Config;
use fortimcp_core::DeviceRegistry;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a config-bound command to its handler.
pub async fn dispatch(cmd: Command, config: Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Serve(args) => serve::handle(args, config).await,
        Command::Devices(args) => devices::handle(args, &config, global).await,
        Command::Config(args) => config_cmd::handle(args, Some(&config), global),
        // Completions never load a config
        Command::Completions(_) => Ok(()),
    }
}

/// Build the registry from every configured device.
///
/// Devices that fail to register are skipped (and logged by the registry);
/// an empty result is an error because nothing could be served.
pub fn build_registry(config: &Config) -> Result<DeviceRegistry, CliError> {
    let (registry, failures) = DeviceRegistry::from_settings(&config.fortigate.devices);
    if registry.is_empty() {
        return Err(CliError::NoDevices {
            skipped: failures.len(),
        });
    }
    Ok(registry)
}
