//! Clap derive structures for the `fortimcp` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fortimcp -- MCP gateway for FortiGate firewalls
#[derive(Debug, Parser)]
#[command(
    name = "fortimcp",
    version,
    about = "Expose FortiGate firewall management to MCP clients",
    long_about = "Serves FortiGate REST operations (policies, objects, routes, VIPs)\n\
        as Model Context Protocol tools over stdio or HTTP, for every\n\
        appliance listed in the config file.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (yaml, json or toml)
    #[arg(long, short = 'c', env = "FORTIGATE_MCP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FORTIMCP_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the MCP server
    #[command(alias = "s")]
    Serve(ServeArgs),

    /// Inspect configured devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Inspect and scaffold configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Command {
    /// Whether the command needs a loaded config file.
    pub fn needs_config(&self) -> bool {
        match self {
            Self::Serve(_) | Self::Devices(_) => true,
            Self::Config(args) => matches!(args.command, ConfigCommand::Check),
            Self::Completions(_) => false,
        }
    }
}

// ── Serve ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// JSON-RPC over HTTP POST
    Http,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Transport to serve MCP on
    #[arg(long, short = 't', env = "FORTIMCP_TRANSPORT", default_value = "stdio")]
    pub transport: Transport,

    /// Listen address (http transport; overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port (http transport; overrides server.port)
    #[arg(long)]
    pub port: Option<u16>,

    /// MCP endpoint path (http transport; overrides server.path)
    #[arg(long)]
    pub path: Option<String>,

    /// Skip the connectivity check run at startup
    #[arg(long)]
    pub no_probe: bool,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List configured devices
    #[command(alias = "ls")]
    List,

    /// Check connectivity to every configured device
    Test,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Validate the resolved configuration
    Check,

    /// Print an example config file
    Example,

    /// Print the default config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
