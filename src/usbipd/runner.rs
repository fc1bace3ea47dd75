//! Real `usbipd` process runner.

use std::process::Command;

use tracing::{debug, info, warn};

use super::{CommandOutput, Passthrough};
use crate::journal::CommandJournal;

/// Default passthrough program name.
pub const DEFAULT_PROGRAM: &str = "usbipd";

/// Runs the passthrough utility as a child process.
#[derive(Debug, Clone)]
pub struct UsbipdCli {
    program: String,
    journal: CommandJournal,
}

impl Default for UsbipdCli {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl UsbipdCli {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            journal: CommandJournal::disabled(),
        }
    }

    /// Journal every command and its output.
    #[must_use]
    pub fn with_journal(mut self, journal: CommandJournal) -> Self {
        self.journal = journal;
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn command_line(&self, args: &[&str]) -> String {
        std::iter::once(self.program.as_str())
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Passthrough for UsbipdCli {
    fn run(&self, args: &[&str]) -> CommandOutput {
        let command = self.command_line(args);
        debug!(%command, "Running passthrough command");
        self.journal.write(&format!("CMD: {command}"));

        match Command::new(&self.program).args(args).output() {
            Ok(output) => {
                let result = CommandOutput {
                    command,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code: output.status.code(),
                    launch_error: None,
                };
                let text = result.text();
                info!(
                    command = %result.command,
                    exit_code = ?result.exit_code,
                    "Passthrough command finished"
                );
                self.journal.write(&format!("OUT: {}", text.replace('\n', " | ")));
                result
            }
            Err(e) => {
                warn!(%command, error = %e, "Failed to launch passthrough command");
                self.journal.write(&format!("RUN ERROR: {e}"));
                CommandOutput::not_launched(command, e.to_string())
            }
        }
    }
}
