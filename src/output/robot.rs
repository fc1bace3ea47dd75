//! Robot mode JSON output implementation.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, instrument, trace, warn};

use crate::error::WcmError;
use crate::manager::{OperationOutcome, PortSurvey};
use crate::usbipd::{CommandOutput, ListingEntry};

use super::{ConfigView, Output, PruneReport, RobotFormat, StateView, VersionInfo};

/// JSON output implementation for scripting.
///
/// Results go to stdout, errors to stderr.
pub struct RobotOutput {
    format: RobotFormat,
}

impl RobotOutput {
    #[instrument]
    pub fn new(format: RobotFormat) -> Self {
        debug!(?format, "Creating RobotOutput");
        Self { format }
    }

    fn render<T: Serialize + ?Sized>(&self, data: &T) -> Option<String> {
        let rendered = match self.format {
            RobotFormat::Json => serde_json::to_string_pretty(data),
            RobotFormat::JsonCompact => serde_json::to_string(data),
        };
        match rendered {
            Ok(json) => {
                trace!(json_len = json.len(), "JSON serialized");
                Some(json)
            }
            Err(e) => {
                warn!(error = %e, "JSON serialization failed");
                None
            }
        }
    }

    /// Output any serializable data as JSON to stdout.
    #[instrument(skip(self, data), fields(format = ?self.format))]
    fn output_json<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            println!("{json}");
        }
    }

    /// Output JSON to stderr.
    #[instrument(skip(self, data))]
    fn output_json_stderr<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            eprintln!("{json}");
        }
    }
}

impl Output for RobotOutput {
    #[instrument(skip(self))]
    fn success(&self, message: &str) {
        debug!(message, "Robot: success");
        self.output_json(&serde_json::json!({
            "success": true,
            "message": message
        }));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &WcmError) {
        debug!(error = %error, "Robot: error");
        self.output_json_stderr(&serde_json::json!({
            "error": true,
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        }));
    }

    #[instrument(skip(self))]
    fn warning(&self, message: &str) {
        debug!(message, "Robot: warning");
        self.output_json_stderr(&serde_json::json!({
            "warning": true,
            "message": message
        }));
    }

    #[instrument(skip(self))]
    fn info(&self, message: &str) {
        debug!(message, "Robot: info");
        self.output_json(&serde_json::json!({
            "info": true,
            "message": message
        }));
    }

    #[instrument(skip(self, ports), fields(count = ports.len()))]
    fn port_list(&self, ports: &[PortSurvey]) {
        debug!("Robot: port_list");
        self.output_json(ports);
    }

    #[instrument(skip(self, entries, output), fields(count = entries.len()))]
    fn bus_listing(&self, entries: &[ListingEntry], output: &CommandOutput) {
        debug!("Robot: bus_listing");
        let error = output.failure().map(|e| e.to_string());
        self.output_json(&serde_json::json!({
            "devices": entries,
            "error": error,
        }));
    }

    #[instrument(skip(self, outcome), fields(action = ?outcome.action, busid = %outcome.busid))]
    fn operation(&self, outcome: &OperationOutcome) {
        debug!("Robot: operation");
        let failures: Vec<String> = outcome.failures().iter().map(ToString::to_string).collect();
        self.output_json(&serde_json::json!({
            "ok": failures.is_empty(),
            "outcome": outcome,
            "output": outcome.text(),
            "failures": failures,
        }));
    }

    #[instrument(skip(self, view), fields(count = view.records.len()))]
    fn state(&self, view: &StateView) {
        debug!("Robot: state");
        self.output_json(view);
    }

    #[instrument(skip(self, report))]
    fn pruned(&self, report: &PruneReport) {
        debug!(records = report.records.len(), "Robot: pruned");
        self.output_json(report);
    }

    #[instrument(skip(self, lines), fields(count = lines.len()))]
    fn journal_tail(&self, path: &Path, lines: &[String]) {
        debug!(path = %path.display(), "Robot: journal_tail");
        self.output_json(&serde_json::json!({
            "path": path.display().to_string(),
            "lines": lines,
        }));
    }

    #[instrument(skip(self, view))]
    fn config(&self, view: &ConfigView) {
        debug!("Robot: config");
        self.output_json(view);
    }

    #[instrument(skip(self, info))]
    fn version_info(&self, info: &VersionInfo) {
        debug!(version = info.version, "Robot: version_info");
        self.output_json(info);
    }
}
