//! Human-friendly output implementation using console styles.

use std::path::Path;

use tracing::{debug, instrument, trace};

use crate::error::WcmError;
use crate::manager::{Action, OperationOutcome, PortSurvey};
use crate::state::LastAction;
use crate::theme::WcmTheme;
use crate::usbipd::{CommandOutput, ListingEntry, combined_text};

use super::{ConfigView, Output, PruneReport, StateView, VersionInfo};

/// Styled terminal output implementation for human users.
pub struct HumanOutput {
    theme: WcmTheme,
}

impl HumanOutput {
    #[instrument]
    pub fn new(color: bool) -> Self {
        debug!("Creating HumanOutput");
        Self {
            theme: WcmTheme::new(color),
        }
    }

    fn heading(&self, title: &str) {
        println!("{}", self.theme.header.apply_to(title));
    }

    fn field(&self, label: &str, value: &str) {
        println!(
            "  {} {}",
            self.theme.label.apply_to(format!("{label:<14}")),
            self.theme.value.apply_to(value)
        );
    }

    fn indented(&self, text: &str) {
        for line in text.lines() {
            println!("    {}", self.theme.muted.apply_to(line));
        }
    }
}

impl Output for HumanOutput {
    #[instrument(skip(self))]
    fn success(&self, message: &str) {
        debug!(message, "Outputting success");
        println!("{} {message}", self.theme.success.apply_to("[OK]"));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &WcmError) {
        debug!(
            error = %error,
            recoverable = error.is_user_recoverable(),
            "Outputting error"
        );
        eprintln!(
            "{} {}",
            self.theme.error.apply_to("[ERR]"),
            self.theme.value.apply_to(error)
        );
        if let Some(suggestion) = error.suggestion() {
            trace!(suggestion, "Adding suggestion");
            eprintln!("      {}", self.theme.muted.apply_to(suggestion));
        }
    }

    #[instrument(skip(self))]
    fn warning(&self, message: &str) {
        debug!(message, "Outputting warning");
        eprintln!("{} {message}", self.theme.warning.apply_to("[WARN]"));
    }

    #[instrument(skip(self))]
    fn info(&self, message: &str) {
        debug!(message, "Outputting info");
        println!("{} {message}", self.theme.info.apply_to("[INFO]"));
    }

    #[instrument(skip(self, ports), fields(count = ports.len()))]
    fn port_list(&self, ports: &[PortSurvey]) {
        debug!("Outputting port list");
        if ports.is_empty() {
            println!("No serial ports found.");
            return;
        }
        self.heading("SERIAL PORTS");
        for survey in ports {
            let binding = match survey.record.as_ref() {
                Some(r) if r.last_action == LastAction::Attached => {
                    let busid = r.last_busid.as_deref().unwrap_or("?");
                    self.theme.attached.apply_to(format!("attached on {busid}")).to_string()
                }
                Some(_) => self.theme.detached.apply_to("detached").to_string(),
                None => String::new(),
            };
            println!(
                "  {:<8} {}  {}",
                self.theme.port.apply_to(&survey.port.device),
                survey.port.description,
                binding
            );
            match (&survey.key, &survey.error) {
                (Some(key), _) => println!("           {}", self.theme.key.apply_to(key)),
                (None, Some(error)) => println!("           {}", self.theme.muted.apply_to(error)),
                (None, None) => {}
            }
        }
    }

    #[instrument(skip(self, entries, output), fields(count = entries.len()))]
    fn bus_listing(&self, entries: &[ListingEntry], output: &CommandOutput) {
        debug!("Outputting bus listing");
        if let Some(failure) = output.failure() {
            self.warning(&failure.to_string());
        }
        if entries.is_empty() {
            println!("No USB devices reported by usbipd.");
            return;
        }
        self.heading("USBIPD DEVICES");
        for entry in entries {
            println!(
                "  {:<8} {}:{}  {}",
                self.theme.busid.apply_to(&entry.busid),
                entry.vid,
                entry.pid,
                entry.description()
            );
        }
    }

    #[instrument(skip(self, outcome), fields(busid = %outcome.busid))]
    fn operation(&self, outcome: &OperationOutcome) {
        debug!(action = ?outcome.action, "Outputting operation");
        if !outcome.cleanup.is_empty() {
            println!(
                "{} previous binding cleaned up",
                self.theme.label.apply_to("[cleanup]")
            );
            self.indented(&combined_text(&outcome.cleanup));
        }

        let verb = match outcome.action {
            Action::Attach => "Attached",
            Action::Detach => "Detached",
        };
        let busid = self.theme.busid.apply_to(&outcome.busid);
        let headline = match outcome.port.as_deref() {
            Some(port) if outcome.fell_back => format!(
                "{verb} last binding (busid {busid}, requested {} was not found)",
                self.theme.port.apply_to(port)
            ),
            Some(port) => format!("{verb} {} (busid {busid})", self.theme.port.apply_to(port)),
            None => format!("{verb} last binding (busid {busid})"),
        };
        if outcome.has_failures() {
            self.warning(&headline);
        } else {
            self.success(&headline);
        }
        self.indented(&outcome.text());
    }

    #[instrument(skip(self, view), fields(count = view.records.len()))]
    fn state(&self, view: &StateView) {
        debug!("Outputting state");
        self.heading("BINDING HISTORY");
        if let Some(path) = &view.path {
            self.field("File", path);
        }
        self.field(
            "Records",
            &format!(
                "{} ({} bound, {} detached)",
                view.summary.total, view.summary.bound, view.summary.detached
            ),
        );
        println!();
        for entry in &view.records {
            let status = match &entry.record.last_busid {
                Some(busid) => self.theme.attached.apply_to(format!("attached on {busid}")),
                None => self.theme.detached.apply_to("detached".to_string()),
            };
            println!("  {}  {status}", self.theme.key.apply_to(&entry.key));
            println!(
                "    {}",
                self.theme.muted.apply_to(&entry.record.last_timestamp)
            );
        }
    }

    #[instrument(skip(self, report))]
    fn pruned(&self, report: &PruneReport) {
        debug!(records = report.records.len(), "Outputting prune report");
        let journal = report
            .journal_lines
            .map_or_else(String::new, |n| format!(", {n} journal line(s)"));
        self.success(&format!(
            "Pruned {} record(s){journal} older than {} day(s)",
            report.records.len(),
            report.retention_days
        ));
        for key in &report.records {
            println!("  - {}", self.theme.key.apply_to(key));
        }
    }

    #[instrument(skip(self, lines), fields(count = lines.len()))]
    fn journal_tail(&self, path: &Path, lines: &[String]) {
        debug!("Outputting journal tail");
        println!("{}", self.theme.muted.apply_to(path.display()));
        if lines.is_empty() {
            println!("(journal is empty)");
        }
        for line in lines {
            println!("{line}");
        }
    }

    #[instrument(skip(self, view))]
    fn config(&self, view: &ConfigView) {
        debug!("Outputting config");
        self.heading("CONFIGURATION");
        self.field("Config file", view.source.as_deref().unwrap_or("(defaults)"));
        self.field("usbipd", &view.config.usbipd.program);
        self.field("State file", &view.state_path);
        self.field(
            "Journal",
            view.journal_path.as_deref().unwrap_or("(disabled)"),
        );
        self.field(
            "Retention",
            &format!(
                "state {}d, journal {}d",
                view.config.state.retention_days, view.config.journal.retention_days
            ),
        );
    }

    #[instrument(skip(self, info))]
    fn version_info(&self, info: &VersionInfo) {
        debug!(version = info.version, "Outputting version info");
        println!(
            "{} {}",
            self.theme.port.apply_to("wcm"),
            self.theme.value.apply_to(info.version)
        );
        self.field("Git SHA", info.git_sha);
        self.field("Git dirty", info.git_dirty);
        self.field("Built", info.build_timestamp);
        self.field("Rustc", info.rustc);
        self.field("Target", info.target);
    }
}
