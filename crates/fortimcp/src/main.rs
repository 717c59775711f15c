mod cli;
mod commands;
mod error;
mod format;
mod http;
mod logging;
mod mcp;
mod output;
mod tools;

use clap::Parser;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Hold the file writer's guard until exit so buffered logs are flushed
    let (guard, result) = run(cli).await;

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        drop(guard);
        std::process::exit(code);
    }
}

async fn run(
    cli: Cli,
) -> (
    Option<tracing_appender::non_blocking::WorkerGuard>,
    Result<(), CliError>,
) {
    match cli.command {
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "fortimcp", &mut std::io::stdout());
            (None, Ok(()))
        }

        // Config example/path work without a config file
        cmd if !cmd.needs_config() => {
            let guard = logging::init_tracing(cli.global.verbose, None);
            let result = match cmd {
                Command::Config(args) => commands::config_cmd::handle(args, None, &cli.global),
                _ => Ok(()),
            };
            (guard, result)
        }

        cmd => {
            let config = match fortimcp_config::load(cli.global.config.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    let guard = logging::init_tracing(cli.global.verbose, None);
                    return (guard, Err(e.into()));
                }
            };

            // The configured logging applies to the server; one-shot
            // commands stay quiet unless -v is given.
            let log_config = matches!(cmd, Command::Serve(_)).then(|| config.logging.clone());
            let guard = logging::init_tracing(cli.global.verbose, log_config.as_ref());

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, config, &cli.global).await;
            (guard, result)
        }
    }
}
