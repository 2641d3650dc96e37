//! Clap derive structures for the `aircon` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use aircon_core::{FanSpeed, Mode};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// aircon -- control air conditioners through the aircon relay
#[derive(Debug, Parser)]
#[command(
    name = "aircon",
    version,
    about = "View and change air-conditioner settings from the command line",
    long_about = "Talks to an aircon relay, which holds the vendor cloud session.\n\n\
        The last selected home and device are remembered between runs.",
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
    /// Relay base URL (overrides config)
    #[arg(long, short = 'r', env = "AIRCON_RELAY", global = true)]
    pub relay: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AIRCON_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates from the relay
    #[arg(long, short = 'k', env = "AIRCON_INSECURE", global = true)]
    pub insecure: bool,

    /// CA certificate (PEM) to trust for the relay
    #[arg(long, env = "AIRCON_CA_CERT", global = true)]
    pub ca_cert: Option<PathBuf>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List homes of the vendor account
    #[command(alias = "h")]
    Homes,

    /// List the devices of a home
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show the selected device's settings
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Change setpoint, mode or fan speed and send it
    Set(SetArgs),

    /// Turn a unit on or off
    Power(PowerArgs),

    /// Select and remember a home (and optionally a device)
    Select(SelectArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Home to list (defaults to the remembered one)
    #[arg(long)]
    pub home: Option<i64>,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Device to show (defaults to the remembered one)
    #[arg(long)]
    pub device: Option<i64>,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Target temperature in °C
    #[arg(long, short = 't', conflicts_with = "step")]
    pub temperature: Option<f64>,

    /// Move the target temperature by this many degrees
    #[arg(long, allow_hyphen_values = true)]
    pub step: Option<i32>,

    /// Operating mode
    #[arg(long, short = 'm')]
    pub mode: Option<ModeArg>,

    /// Fan speed
    #[arg(long, short = 'f')]
    pub fan: Option<FanArg>,

    /// Device to change (defaults to the remembered one)
    #[arg(long)]
    pub device: Option<i64>,
}

#[derive(Debug, Args)]
pub struct PowerArgs {
    /// What to do with the power
    #[arg(value_enum, default_value = "toggle")]
    pub action: PowerAction,

    /// Toggle this device of the selected home, selecting it first
    #[arg(long)]
    pub device: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PowerAction {
    Toggle,
    On,
    Off,
}

#[derive(Debug, Args)]
pub struct SelectArgs {
    /// Home id
    pub home: i64,

    /// Device id within the home
    pub device: Option<i64>,
}

/// Modes selectable from the CLI. `off` goes through `aircon power off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Cool,
    Heat,
    Dry,
    Fan,
    Auto,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Cool => Self::Cool,
            ModeArg::Heat => Self::Heat,
            ModeArg::Dry => Self::Dry,
            ModeArg::Fan => Self::Fan,
            ModeArg::Auto => Self::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FanArg {
    Auto,
    Low,
    Medium,
    High,
}

impl From<FanArg> for FanSpeed {
    fn from(arg: FanArg) -> Self {
        match arg {
            FanArg::Auto => Self::Auto,
            FanArg::Low => Self::Low,
            FanArg::Medium => Self::Medium,
            FanArg::High => Self::High,
        }
    }
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the effective configuration (passwords redacted)
    Show,

    /// Remember the relay URL
    SetRelay {
        /// Relay base URL, e.g. http://127.0.0.1:4000
        url: String,
    },

    /// Store the vendor account password in the system keyring
    SetPassword {
        /// Vendor account email
        #[arg(long, env = "BGH_EMAIL")]
        email: String,

        /// Vendor account password
        #[arg(long, env = "BGH_PASSWORD", hide_env_values = true)]
        password: String,
    },
}
