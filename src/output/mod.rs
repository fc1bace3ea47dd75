//! Output mode abstraction for robot and human output.

use std::io::{self, IsTerminal};
use std::path::Path;

use serde::Serialize;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::WcmError;
use crate::manager::{OperationOutcome, PortSurvey};
use crate::state::{DeviceRecord, StateStore, StateSummary};
use crate::usbipd::{CommandOutput, ListingEntry};

pub mod human;
pub mod robot;

pub use human::HumanOutput;
pub use robot::RobotOutput;

// === Report Types ===

/// One stored record with its key.
#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    pub key: String,
    #[serde(flatten)]
    pub record: DeviceRecord,
}

/// The binding history as shown by `wcm state`.
#[derive(Debug, Clone, Serialize)]
pub struct StateView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub summary: StateSummary,
    pub records: Vec<RecordView>,
}

impl StateView {
    #[must_use]
    pub fn from_store(store: &StateStore) -> Self {
        Self {
            path: store.path().map(|p| p.display().to_string()),
            summary: store.summary(),
            records: store
                .records()
                .map(|(key, record)| RecordView {
                    key: key.to_string(),
                    record: record.clone(),
                })
                .collect(),
        }
    }
}

/// What a prune pass removed.
#[derive(Debug, Clone, Serialize)]
pub struct PruneReport {
    pub retention_days: u32,
    pub records: Vec<String>,
    /// Journal lines dropped, or `None` when journaling is off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_lines: Option<usize>,
}

/// Effective configuration as shown by `wcm config`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigView {
    /// File the configuration was read from.
    pub source: Option<String>,
    pub state_path: String,
    pub journal_path: Option<String>,
    pub config: Config,
}

/// Build metadata for `wcm version`.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub git_sha: &'static str,
    pub git_dirty: &'static str,
    pub build_timestamp: &'static str,
    pub rustc: &'static str,
    pub target: &'static str,
}

/// JSON formatting options for robot mode.
#[derive(Debug, Clone, Copy)]
pub enum RobotFormat {
    /// Pretty-printed JSON (default for --robot).
    Json,
    /// Single-line JSON (--format=json-compact).
    JsonCompact,
}

/// Determines how command output is rendered.
#[derive(Debug)]
pub enum OutputMode {
    /// JSON output for scripting.
    Robot(RobotFormat),
    /// Styled terminal output for human users.
    Human { color: bool },
}

impl OutputMode {
    /// Create OutputMode from CLI arguments.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.use_json() {
            let format = if cli.use_compact_json() {
                RobotFormat::JsonCompact
            } else {
                RobotFormat::Json
            };
            Self::Robot(format)
        } else {
            Self::Human {
                color: !cli.no_color && io::stdout().is_terminal(),
            }
        }
    }

    /// Returns true if output should be JSON.
    #[must_use]
    pub const fn is_robot(&self) -> bool {
        matches!(self, Self::Robot(_))
    }

    /// Convert into the appropriate Output implementation.
    #[must_use]
    pub fn into_output(self) -> Box<dyn Output> {
        match self {
            Self::Robot(format) => Box::new(RobotOutput::new(format)),
            Self::Human { color } => Box::new(HumanOutput::new(color)),
        }
    }
}

/// Trait for all output operations.
///
/// Commands call these methods without knowing the output mode.
pub trait Output {
    // Basic messages
    fn success(&self, message: &str);
    fn error(&self, error: &WcmError);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);

    // Discovery
    fn port_list(&self, ports: &[PortSurvey]);
    fn bus_listing(&self, entries: &[ListingEntry], output: &CommandOutput);

    // Lifecycle
    fn operation(&self, outcome: &OperationOutcome);

    // History
    fn state(&self, view: &StateView);
    fn pruned(&self, report: &PruneReport);
    fn journal_tail(&self, path: &Path, lines: &[String]);

    // Metadata
    fn config(&self, view: &ConfigView);
    fn version_info(&self, info: &VersionInfo);
}
