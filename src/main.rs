//! WSL COM Manager - share USB serial devices with WSL through usbipd.
//!
//! Provides both human-friendly and script-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io;
use std::path::PathBuf;

use chrono::{Local, TimeDelta, Utc};
use clap::Parser;
use console::style;
use serde::Serialize;
use tracing::{debug, warn};

use wcm::cli::{self, Cli, Commands};
use wcm::config::{self, Config, LoadedConfig};
use wcm::device::SystemPorts;
use wcm::error::{Result, WcmError};
use wcm::journal::CommandJournal;
use wcm::logging::init_logging;
use wcm::manager::DeviceManager;
use wcm::output::{ConfigView, Output, OutputMode, PruneReport, StateView, VersionInfo};
use wcm::state::StateStore;
use wcm::usbipd::UsbipdCli;

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> &'static str {
        option_env!("VERGEN_GIT_DIRTY").unwrap_or("false")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

/// How a successful command finished.
enum Completion {
    Clean,
    /// The passthrough utility reported errors.
    UtilityErrors,
}

type Manager = DeviceManager<UsbipdCli, SystemPorts>;

fn main() {
    let cli = Cli::parse();

    init_logging(cli.use_json(), cli.verbose, cli.quiet);
    let output = OutputMode::from_cli(&cli).into_output();

    match run(&cli, output.as_ref()) {
        Ok(Completion::Clean) => {}
        Ok(Completion::UtilityErrors) => std::process::exit(2),
        Err(e) => {
            output.error(&e);
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli, out: &dyn Output) -> Result<Completion> {
    match &cli.command {
        None => print_quick_start(cli),
        Some(Commands::Ports) => cmd_ports(cli, out),
        Some(Commands::Devices) => cmd_devices(cli, out),
        Some(Commands::Attach(args)) => cmd_attach(cli, out, args),
        Some(Commands::Detach(args)) => cmd_detach(cli, out, args),
        Some(Commands::State) => cmd_state(cli, out),
        Some(Commands::Prune(args)) => cmd_prune(cli, out, args),
        Some(Commands::Log(args)) => cmd_log(cli, out, args),
        Some(Commands::Init(args)) => cmd_init(cli, out, args),
        Some(Commands::Config(args)) => cmd_config(cli, out, args),
        Some(Commands::Version) => cmd_version(out),
        Some(Commands::Completions(args)) => cmd_completions(args),
    }
}

// === Setup ===

/// Load the configuration and apply command line overrides.
fn load_settings(cli: &Cli) -> Result<LoadedConfig> {
    let mut loaded = config::load_config(cli.config.as_deref())?;
    if let Some(path) = &cli.state_file {
        loaded.config.state.path = Some(path.clone());
    }
    if let Some(program) = &cli.usbipd {
        loaded.config.usbipd.program.clone_from(program);
    }
    loaded.config.validate()?;
    Ok(loaded)
}

fn journal_for(loaded: &LoadedConfig) -> CommandJournal {
    loaded
        .journal_path()
        .map_or_else(CommandJournal::disabled, CommandJournal::new)
}

/// Open the store and collaborators, pruning stale history first.
fn open_manager(loaded: &LoadedConfig) -> Manager {
    let journal = journal_for(loaded);
    if let Err(e) = journal.prune(Local::now().naive_local(), loaded.config.journal.retention()) {
        warn!(error = %e, "Failed to prune journal");
    }

    let store = StateStore::load(loaded.state_path());
    let usbipd = UsbipdCli::new(loaded.config.usbipd.program.clone()).with_journal(journal);
    let mut manager = DeviceManager::new(store, usbipd, SystemPorts::new());
    let removed = manager.prune(Utc::now(), loaded.config.state.retention());
    debug!(removed = removed.len(), "Startup prune done");
    manager
}

// === Quick Start (Robot Mode Optimized) ===

/// Prints quick-start help for both humans and scripts.
#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn print_quick_start(cli: &Cli) -> Result<Completion> {
    if cli.use_json() {
        print_robot_quick_start();
    } else {
        print_human_quick_start();
    }
    Ok(Completion::Clean)
}

#[derive(Serialize)]
struct RobotQuickStart {
    tool: &'static str,
    version: &'static str,
    description: &'static str,
    discovery: RobotDiscovery,
    lifecycle: RobotLifecycle,
    history: RobotHistory,
    output_modes: OutputModes,
    exit_codes: ExitCodes,
}

#[derive(Serialize)]
struct RobotDiscovery {
    list_ports: &'static str,
    list_usbipd_devices: &'static str,
}

#[derive(Serialize)]
struct RobotLifecycle {
    attach: &'static str,
    detach: &'static str,
    detach_last: &'static str,
}

#[derive(Serialize)]
struct RobotHistory {
    show_state: &'static str,
    prune: &'static str,
    journal: &'static str,
}

#[derive(Serialize)]
struct OutputModes {
    human: &'static str,
    robot: &'static str,
    compact: &'static str,
}

#[derive(Serialize)]
struct ExitCodes {
    success: u8,
    error: u8,
    utility_reported_errors: u8,
}

fn print_robot_quick_start() {
    let help = RobotQuickStart {
        tool: "wcm",
        version: build_info::VERSION,
        description: "Share USB serial devices with WSL through usbipd",
        discovery: RobotDiscovery {
            list_ports: "wcm ports --robot",
            list_usbipd_devices: "wcm devices --robot",
        },
        lifecycle: RobotLifecycle {
            attach: "wcm attach <PORT> --robot",
            detach: "wcm detach <PORT> --robot",
            detach_last: "wcm detach --robot",
        },
        history: RobotHistory {
            show_state: "wcm state --robot",
            prune: "wcm prune --days <N> --robot",
            journal: "wcm log --lines <N> --robot",
        },
        output_modes: OutputModes {
            human: "--format=text (default)",
            robot: "--robot or --format=json",
            compact: "--format=json-compact",
        },
        exit_codes: ExitCodes {
            success: 0,
            error: 1,
            utility_reported_errors: 2,
        },
    };

    match serde_json::to_string_pretty(&help) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!(error = %e, "Failed to render quick start"),
    }
}

fn print_human_quick_start() {
    println!(
        "{} {} - WSL COM Manager\n",
        style("wcm").bold().cyan(),
        build_info::VERSION
    );

    println!("{}", style("QUICK START").bold().underlined());
    println!();
    println!("  {}  List serial ports", style("wcm ports").green());
    println!("  {}  Devices usbipd can see", style("wcm devices").green());
    println!("  {}  Attach COM5 to WSL", style("wcm attach COM5").green());
    println!("  {}  Detach COM5", style("wcm detach COM5").green());
    println!("  {}  Detach the last binding", style("wcm detach").green());
    println!("  {}  Binding history", style("wcm state").green());
    println!();

    println!("{}", style("ROBOT MODE").bold().underlined());
    println!();
    println!("  {}  JSON output", style("wcm --robot <command>").cyan());
    println!("  {}  Quick-start JSON", style("wcm --robot").cyan());
    println!();

    println!(
        "Attach and detach need an elevated shell with {} installed.",
        style("usbipd").yellow()
    );
    println!("Run {} for full help", style("wcm --help").yellow());
}

// === Commands ===

fn cmd_ports(cli: &Cli, out: &dyn Output) -> Result<Completion> {
    let loaded = load_settings(cli)?;
    let manager = open_manager(&loaded);
    out.port_list(&manager.survey_ports()?);
    Ok(Completion::Clean)
}

fn cmd_devices(cli: &Cli, out: &dyn Output) -> Result<Completion> {
    let loaded = load_settings(cli)?;
    let manager = open_manager(&loaded);
    let (output, entries) = manager.listing();
    out.bus_listing(&entries, &output);
    Ok(if output.failure().is_some() {
        Completion::UtilityErrors
    } else {
        Completion::Clean
    })
}

fn cmd_attach(cli: &Cli, out: &dyn Output, args: &cli::AttachArgs) -> Result<Completion> {
    let loaded = load_settings(cli)?;
    let mut manager = open_manager(&loaded);
    let outcome = manager.attach(&args.port)?;
    out.operation(&outcome);
    Ok(completion_for(outcome.has_failures()))
}

fn cmd_detach(cli: &Cli, out: &dyn Output, args: &cli::DetachArgs) -> Result<Completion> {
    let loaded = load_settings(cli)?;
    let mut manager = open_manager(&loaded);
    let outcome = manager.detach(args.port.as_deref())?;
    out.operation(&outcome);
    Ok(completion_for(outcome.has_failures()))
}

fn cmd_state(cli: &Cli, out: &dyn Output) -> Result<Completion> {
    let loaded = load_settings(cli)?;
    let manager = open_manager(&loaded);
    out.state(&StateView::from_store(manager.store()));
    Ok(Completion::Clean)
}

fn cmd_prune(cli: &Cli, out: &dyn Output, args: &cli::PruneArgs) -> Result<Completion> {
    let loaded = load_settings(cli)?;
    let days = args.days.unwrap_or(loaded.config.state.retention_days);
    let retention = TimeDelta::days(i64::from(days));

    let journal = journal_for(&loaded);
    let journal_lines = match journal.path() {
        Some(_) => Some(journal.prune(Local::now().naive_local(), retention)?),
        None => None,
    };

    let mut manager = DeviceManager::new(
        StateStore::load(loaded.state_path()),
        UsbipdCli::new(loaded.config.usbipd.program.clone()),
        SystemPorts::new(),
    );
    let records = manager.prune(Utc::now(), retention);

    out.pruned(&PruneReport {
        retention_days: days,
        records,
        journal_lines,
    });
    Ok(Completion::Clean)
}

fn cmd_log(cli: &Cli, out: &dyn Output, args: &cli::LogArgs) -> Result<Completion> {
    let loaded = load_settings(cli)?;
    let Some(path) = loaded.journal_path() else {
        out.info("Command journal is disabled");
        return Ok(Completion::Clean);
    };
    let lines = CommandJournal::new(path.clone()).tail(args.lines)?;
    out.journal_tail(&path, &lines);
    Ok(Completion::Clean)
}

fn cmd_init(cli: &Cli, out: &dyn Output, args: &cli::InitArgs) -> Result<Completion> {
    let path = config_path(cli)?;
    if path.exists() && !args.force {
        return Err(WcmError::ConfigInvalid(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    config::save_config(&Config::default(), &path)?;
    out.success(&format!("Wrote {}", path.display()));
    Ok(Completion::Clean)
}

fn cmd_config(cli: &Cli, out: &dyn Output, args: &cli::ConfigArgs) -> Result<Completion> {
    if args.path {
        let path = config_path(cli)?;
        if cli.use_json() {
            out.info(&path.display().to_string());
        } else {
            println!("{}", path.display());
        }
        return Ok(Completion::Clean);
    }

    let loaded = load_settings(cli)?;
    out.config(&ConfigView {
        source: loaded.source.as_ref().map(|p| p.display().to_string()),
        state_path: loaded.state_path().display().to_string(),
        journal_path: loaded.journal_path().map(|p| p.display().to_string()),
        config: loaded.config.clone(),
    });
    Ok(Completion::Clean)
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_version(out: &dyn Output) -> Result<Completion> {
    out.version_info(&VersionInfo {
        version: build_info::VERSION,
        git_sha: build_info::git_sha(),
        git_dirty: build_info::git_dirty(),
        build_timestamp: build_info::build_timestamp(),
        rustc: build_info::rustc_semver(),
        target: build_info::target(),
    });
    Ok(Completion::Clean)
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_completions(args: &cli::CompletionsArgs) -> Result<Completion> {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "wcm", &mut io::stdout());
    Ok(Completion::Clean)
}

// === Utility Functions ===

fn config_path(cli: &Cli) -> Result<PathBuf> {
    cli.config
        .clone()
        .map_or_else(config::default_config_path, Ok)
}

const fn completion_for(has_failures: bool) -> Completion {
    if has_failures {
        Completion::UtilityErrors
    } else {
        Completion::Clean
    }
}
