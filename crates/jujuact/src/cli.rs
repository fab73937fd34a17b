//! Clap derive structures for the `jujuact` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// jujuact -- run and track Juju actions from the command line
#[derive(Debug, Parser)]
#[command(
    name = "jujuact",
    version,
    about = "Run and track Juju actions from the command line",
    long_about = "Run and track Juju actions: discover the actions each deployed service\n\
        declares, queue them on units, poll their status, and cancel them over\n\
        the controller's WebSocket API.",
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
    /// Controller profile to use
    #[arg(long, short = 'p', env = "JUJUACT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller WebSocket endpoint (overrides profile and JUJU_API_ADDRESSES)
    #[arg(long, short = 'e', env = "JUJUACT_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// User name or tag to log in as
    #[arg(long, short = 'u', env = "JUJUACT_USER", global = true)]
    pub user: Option<String>,

    /// Login password
    #[arg(long, env = "JUJUACT_PASSWORD", global = true, hide_env = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "JUJUACT_OUTPUT",
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

    /// Accept the controller's self-signed TLS certificate
    #[arg(long, short = 'k', env = "JUJUACT_INSECURE", global = true)]
    pub insecure: bool,

    /// Per-request timeout in seconds [default: profile, else 30]
    #[arg(long, env = "JUJUACT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
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
    /// Show controller status (services and their charms)
    #[command(alias = "st")]
    Status,

    /// Show units per service, including subordinates
    Units {
        /// Only show this service
        service: Option<String>,
    },

    /// Show the actions each service declares
    Specs {
        /// Only show this service
        #[arg(long, short = 's')]
        service: Option<String>,
    },

    /// Queue an action on one or more units
    Run(RunArgs),

    /// Show one action's status and output
    Show {
        /// Action tag or id
        tag: String,
    },

    /// Poll an action until it completes or fails
    Wait(WaitArgs),

    /// Cancel a queued action
    Cancel {
        /// Action tag or id
        tag: String,
    },

    /// List actions recorded against units
    #[command(alias = "ls")]
    List {
        /// Only list actions for this service's units
        #[arg(long, short = 's')]
        service: Option<String>,
    },

    /// Show service annotations
    Annotations {
        /// Service names
        #[arg(required = true)]
        services: Vec<String>,
    },

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ACTIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Action name
    pub action: String,

    /// Receivers: unit names (redmine/0) or unit tags (unit-redmine-0)
    #[arg(required = true)]
    pub receivers: Vec<String>,

    /// Action parameter as key=value (repeatable)
    #[arg(long = "param", short = 'P', value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    /// Coerce parameters using this service's action spec
    #[arg(long, short = 's')]
    pub service: Option<String>,

    /// Wait for the action to finish
    #[arg(long, short = 'w')]
    pub wait: bool,

    /// Poll interval in seconds when waiting
    #[arg(long, default_value = "2")]
    pub interval: u64,
}

#[derive(Debug, Args)]
pub struct WaitArgs {
    /// Action tag or id
    pub tag: String,

    /// Poll interval in seconds
    #[arg(long, default_value = "2")]
    pub interval: u64,
}

/// Parse a `key=value` pair.
fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets redacted)
    Show,

    /// Set a value on the active profile
    Set {
        /// Key: endpoint, addresses, user, password_env, ca_cert, insecure, timeout
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
