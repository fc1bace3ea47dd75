//! Passthrough utility (`usbipd`) invocation.
//!
//! The [`Passthrough`] trait abstracts over the real process runner and the
//! scripted mock, so orchestration can be tested without the utility.
//! Invocations never fail: launch errors degrade to text, and success is
//! judged by the caller from the captured output.

pub mod listing;
pub mod mock;
mod runner;

pub use listing::{ListingEntry, parse_listing};
pub use runner::{DEFAULT_PROGRAM, UsbipdCli};

use serde::Serialize;

use crate::error::WcmError;

/// Text reported when a command printed nothing.
pub const NO_OUTPUT: &str = "(No output)";

/// Captured result of one passthrough invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    /// Command line as it was run
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    /// Exit code, for diagnostics only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Set when the process could not be started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_error: Option<String>,
}

impl CommandOutput {
    /// Output of a command that ran and printed `stdout`.
    #[must_use]
    pub fn completed(command: impl Into<String>, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: Some(0),
            launch_error: None,
        }
    }

    /// Output of a command that could not be launched.
    #[must_use]
    pub fn not_launched(command: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            launch_error: Some(error.into()),
        }
    }

    /// Combined text: trimmed stdout and stderr, or `(No output)`.
    #[must_use]
    pub fn text(&self) -> String {
        if let Some(e) = &self.launch_error {
            return e.clone();
        }
        let parts: Vec<&str> = [self.stdout.trim(), self.stderr.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            NO_OUTPUT.to_string()
        } else {
            parts.join("\n")
        }
    }

    /// The failure this output indicates, if any.
    ///
    /// Exit codes are ignored; only launch errors and stderr text count.
    #[must_use]
    pub fn failure(&self) -> Option<WcmError> {
        let detail = match &self.launch_error {
            Some(e) => e.clone(),
            None if !self.stderr.trim().is_empty() => self.stderr.trim().to_string(),
            None => return None,
        };
        Some(WcmError::ExternalCommand {
            command: self.command.clone(),
            detail,
        })
    }
}

/// Join several command outputs the way they are shown to the user.
#[must_use]
pub fn combined_text(outputs: &[CommandOutput]) -> String {
    outputs
        .iter()
        .map(CommandOutput::text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Passthrough utility operations.
pub trait Passthrough {
    /// Run the utility with `args` and capture its output.
    fn run(&self, args: &[&str]) -> CommandOutput;

    /// `list`: one device per line, `<busid> <VVVV>:<PPPP> <text>`.
    fn list(&self) -> CommandOutput {
        self.run(&["list"])
    }

    fn bind(&self, busid: &str) -> CommandOutput {
        self.run(&["bind", "--busid", busid])
    }

    fn attach(&self, busid: &str) -> CommandOutput {
        self.run(&["attach", "--wsl", "--busid", busid])
    }

    fn detach(&self, busid: &str) -> CommandOutput {
        self.run(&["detach", "--busid", busid])
    }

    fn unbind(&self, busid: &str) -> CommandOutput {
        self.run(&["unbind", "--busid", busid])
    }

    /// Bind then attach, in that order.
    fn bind_attach(&self, busid: &str) -> Vec<CommandOutput> {
        vec![self.bind(busid), self.attach(busid)]
    }

    /// Detach then unbind, in that order.
    fn detach_unbind(&self, busid: &str) -> Vec<CommandOutput> {
        vec![self.detach(busid), self.unbind(busid)]
    }
}

impl<T: Passthrough + ?Sized> Passthrough for Box<T> {
    fn run(&self, args: &[&str]) -> CommandOutput {
        (**self).run(args)
    }
}

impl<T: Passthrough + ?Sized> Passthrough for &T {
    fn run(&self, args: &[&str]) -> CommandOutput {
        (**self).run(args)
    }
}
