//! Clap derive structures for the `panelctl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Also compiled by `build.rs` for man page generation, so it must only
//! depend on clap and clap_complete.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// panelctl -- command-line client for the proxy management panel
#[derive(Debug, Parser)]
#[command(
    name = "panelctl",
    version,
    about = "Manage a proxy panel from the command line",
    long_about = "Inspect system health, bandwidth and connections of a proxy server,\n\
        restart its proxy service, and switch between proxy layers while\n\
        following the server-side installation as it progresses.",
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
    /// Panel profile to use
    #[arg(long, short = 'p', env = "PANEL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Panel URL (overrides profile)
    #[arg(long, short = 'u', env = "PANEL_URL", global = true)]
    pub url: Option<String>,

    /// Value of the panel's `session` cookie
    #[arg(long, env = "PANEL_SESSION", global = true, hide_env_values = true)]
    pub session: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PANEL_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PANEL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "PANEL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// Show host facts, resource usage, and service states
    #[command(alias = "ov", alias = "info")]
    Overview(OverviewArgs),

    /// Show system and per-user bandwidth totals
    #[command(alias = "bw")]
    Bandwidth,

    /// List active TCP connections on the server
    #[command(alias = "conns")]
    Connections,

    /// Control the proxy service of the installed layer
    #[command(alias = "svc")]
    Service(ServiceArgs),

    /// List proxy layers and switch between them
    #[command(alias = "layer", alias = "l")]
    Layers(LayersArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Overview ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OverviewArgs {
    /// Refresh periodically until interrupted
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Seconds between refreshes in watch mode
    #[arg(long, default_value = "30", requires = "watch")]
    pub interval: u64,
}

// ── Service ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServiceArgs {
    #[command(subcommand)]
    pub command: ServiceCommand,
}

#[derive(Debug, Subcommand)]
pub enum ServiceCommand {
    /// Restart the proxy service
    Restart,

    /// Show recent log lines of the proxy service
    Logs,
}

// ── Layers ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LayersArgs {
    #[command(subcommand)]
    pub command: LayersCommand,
}

#[derive(Debug, Subcommand)]
pub enum LayersCommand {
    /// List installable layers, marking the current one
    #[command(alias = "ls")]
    List,

    /// Switch the server to another layer and follow progress
    Switch(SwitchArgs),

    /// Show the state of a running or finished switch
    Status {
        /// Keep following until the switch finishes
        #[arg(long, short = 'f')]
        follow: bool,
    },

    /// Acknowledge a finished switch so the panel returns to idle
    Ack,
}

#[derive(Debug, Args)]
pub struct SwitchArgs {
    /// Target layer id (see `panelctl layers list`)
    pub layer: String,

    /// Domain for layers that issue a TLS certificate
    #[arg(long, short = 'd')]
    pub domain: Option<String>,

    /// Contact email for certificate issuance
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// DuckDNS token for layers that can register a DuckDNS hostname
    #[arg(long, env = "PANEL_DUCKDNS_TOKEN", hide_env_values = true)]
    pub duckdns_token: Option<String>,

    /// Return right after the panel accepts the switch
    #[arg(long)]
    pub no_wait: bool,

    /// Leave the finished switch record on the panel
    #[arg(long)]
    pub no_ack: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (url, session_env, ca_cert, insecure, timeout, poll_interval)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store a session token for the active profile in the system keyring
    SetSession,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
