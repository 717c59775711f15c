// Tracing setup.
//
// Logs always go to stderr (stdout carries MCP traffic under the stdio
// transport) and optionally to a daily-rolling file. Filter precedence:
// -v flags, then RUST_LOG, then the configured level, then "warn".

use std::ffi::OsStr;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use fortimcp_config::{LogFormat, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber. Hold the returned guard until exit so
/// buffered file output is flushed.
pub fn init_tracing(verbosity: u8, config: Option<&LoggingConfig>) -> Option<WorkerGuard> {
    let defaults = LoggingConfig::default();
    let (settings, level) = match config {
        Some(cfg) => (cfg, Some(cfg.level.as_str())),
        None => (&defaults, None),
    };

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if settings.console {
        layers.push(console_layer(settings.format));
    }

    let guard = settings.file.as_deref().map(|path| {
        let (writer, guard) = tracing_appender::non_blocking(file_appender(path));
        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .boxed(),
        );
        guard
    });

    tracing_subscriber::registry()
        .with(layers)
        .with(filter(verbosity, level))
        .init();

    guard
}

fn console_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer().json().with_writer(io::stderr).boxed(),
        LogFormat::Text => fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .boxed(),
    }
}

fn file_appender(path: &Path) -> tracing_appender::rolling::RollingFileAppender {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let name = path.file_name().unwrap_or(OsStr::new("fortimcp.log"));
    tracing_appender::rolling::daily(dir, name)
}

fn filter(verbosity: u8, level: Option<&str>) -> EnvFilter {
    let flag_level = match verbosity {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    };
    if let Some(directive) = flag_level {
        return EnvFilter::new(directive);
    }

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        level
            .and_then(|l| EnvFilter::try_new(l).ok())
            .unwrap_or_else(|| EnvFilter::new("warn"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_wins_over_config() {
        assert_eq!(filter(2, Some("error")).to_string(), "debug");
        assert_eq!(filter(5, None).to_string(), "trace");
    }

    #[test]
    fn config_level_applies_without_flags() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(filter(0, Some("fortimcp=debug")).to_string(), "fortimcp=debug");
            assert_eq!(filter(0, None).to_string(), "warn");
        }
    }
}
