//! Append-only journal of passthrough commands and their output.
//!
//! Every line is prefixed with a local `YYYY-MM-DD HH:MM:SS - ` timestamp so
//! old entries can be pruned without a structured format.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, TimeDelta};
use tracing::{debug, trace, warn};

/// Timestamp prefix format for journal lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SEPARATOR: &str = " - ";

/// Best-effort command journal.
#[derive(Debug, Clone, Default)]
pub struct CommandJournal {
    path: Option<PathBuf>,
}

impl CommandJournal {
    /// Journal writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Journal that discards everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self { path: None }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one timestamped line. Failures are logged, never raised.
    pub fn write(&self, message: &str) {
        let Some(path) = &self.path else {
            return;
        };
        let line = format!(
            "{}{SEPARATOR}{message}\n",
            Local::now().format(TIMESTAMP_FORMAT)
        );
        trace!(path = %path.display(), "Journal append");
        if let Err(e) = append(path, &line) {
            warn!(path = %path.display(), error = %e, "Failed to write journal");
        }
    }

    /// Drop lines older than `now - retention`.
    ///
    /// Lines whose prefix does not parse as a timestamp are kept. Returns
    /// the number of removed lines.
    pub fn prune(&self, now: NaiveDateTime, retention: TimeDelta) -> io::Result<usize> {
        let Some(path) = &self.path else {
            return Ok(0);
        };
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            return Ok(0);
        };

        let mut kept = String::with_capacity(contents.len());
        let mut removed = 0;
        for line in contents.split_inclusive('\n') {
            match line_timestamp(line) {
                Some(ts) if ts < cutoff => removed += 1,
                _ => kept.push_str(line),
            }
        }

        if removed > 0 {
            fs::write(path, kept)?;
        }
        debug!(path = %path.display(), removed, "Journal pruned");
        Ok(removed)
    }

    /// Last `count` lines of the journal.
    pub fn tail(&self, count: usize) -> io::Result<Vec<String>> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let lines: Vec<&str> = contents.lines().collect();
        let start = lines.len().saturating_sub(count);
        Ok(lines[start..].iter().map(|l| (*l).to_string()).collect())
    }
}

fn append(path: &Path, line: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())
}

fn line_timestamp(line: &str) -> Option<NaiveDateTime> {
    let (prefix, _) = line.split_once(SEPARATOR)?;
    NaiveDateTime::parse_from_str(prefix, TIMESTAMP_FORMAT).ok()
}
