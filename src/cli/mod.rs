//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// WSL COM Manager - share USB serial devices with WSL through usbipd.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "wcm", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (text for humans, json for scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "WCM_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only log errors)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file (default: <config_dir>/wsl-com-manager/config.toml)
    #[arg(long, global = true, env = "WCM_CONFIG")]
    pub config: Option<PathBuf>,

    /// State file, overriding the configuration
    #[arg(long, global = true, env = "WCM_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Passthrough program, overriding the configuration
    #[arg(long, global = true, env = "WCM_USBIPD")]
    pub usbipd: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Discovery ===
    /// List serial ports with their device identity and binding
    #[command(visible_alias = "refresh")]
    Ports,

    /// Show the devices usbipd can see
    Devices,

    // === Lifecycle ===
    /// Bind and attach the device behind a serial port to WSL
    Attach(AttachArgs),

    /// Detach and unbind a device (default: the most recent binding)
    Detach(DetachArgs),

    // === History ===
    /// Show the binding history
    State,

    /// Remove stale history records and journal lines
    Prune(PruneArgs),

    /// Show the end of the command journal
    Log(LogArgs),

    // === Configuration ===
    /// Write a default configuration file
    Init(InitArgs),

    /// Show the effective configuration
    Config(ConfigArgs),

    // === Utilities ===
    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

#[derive(Parser, Debug)]
pub struct AttachArgs {
    /// Serial port name (e.g., COM5)
    pub port: String,
}

#[derive(Parser, Debug)]
pub struct DetachArgs {
    /// Serial port name; omit to detach the most recent binding
    pub port: Option<String>,
}

#[derive(Parser, Debug)]
pub struct PruneArgs {
    /// Retention window in days (default: from configuration)
    #[arg(long, short = 'd')]
    pub days: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct LogArgs {
    /// Number of lines to show
    #[arg(long, short = 'n', default_value = "20")]
    pub lines: usize,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Show configuration file path only
    #[arg(long)]
    pub path: bool,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
