//! `fortimcp serve`: build the registry and run an MCP transport.

use std::sync::Arc;

use tracing::{info, warn};

use fortimcp_config::Config;
use fortimcp_core::DeviceRegistry;

use crate::cli::{ServeArgs, Transport};
use crate::error::CliError;
use crate::tools::{SERVER_VERSION, ToolContext};
use crate::{http, mcp};

use super::build_registry;

pub async fn handle(args: ServeArgs, mut config: Config) -> Result<(), CliError> {
    apply_overrides(&args, &mut config);
    config.validate()?;

    let registry = Arc::new(build_registry(&config)?);
    info!(
        server = %config.server.name,
        version = SERVER_VERSION,
        transport = %args.transport,
        devices = registry.len(),
        "starting MCP server"
    );

    if !args.no_probe {
        tokio::spawn(startup_probe(Arc::clone(&registry)));
    }

    let ctx = Arc::new(ToolContext::new(registry, config.server.clone()));
    match args.transport {
        Transport::Stdio => mcp::run_stdio(ctx).await?,
        Transport::Http => {
            let host = config.server.host.clone();
            let port = config.server.port;
            let listener = http::bind(&host, port)
                .await
                .map_err(|source| CliError::Bind {
                    addr: format!("{host}:{port}"),
                    source,
                })?;
            let app = http::router(Arc::clone(&ctx), &config.auth);
            info!(endpoint = %ctx.endpoint(), "HTTP transport ready");
            http::serve(listener, app).await?;
        }
    }

    info!("MCP server stopped");
    Ok(())
}

fn apply_overrides(args: &ServeArgs, config: &mut Config) {
    if let Some(host) = &args.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(path) = &args.path {
        config.server.path.clone_from(path);
    }
}

/// Log reachability of every device without delaying the transport.
async fn startup_probe(registry: Arc<DeviceRegistry>) {
    for (id, reachable) in registry.test_all().await {
        if reachable {
            info!(device = %id, "device reachable");
        } else {
            warn!(device = %id, "device unreachable at startup");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = ServeArgs {
            transport: Transport::Http,
            host: Some("127.0.0.1".into()),
            port: Some(9000),
            path: None,
            no_probe: true,
        };
        let mut config = Config::default();
        apply_overrides(&args, &mut config);

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.path, "/fortigate-mcp");
    }
}
