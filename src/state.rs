//! Persisted binding history.
//!
//! Maps identity keys to the last bus id each device was attached on, so a
//! repeated or interrupted operation can clean up stale bindings. The store
//! is loaded once, mutated in memory, and flushed after every mutation.
//! Read problems are never fatal: a missing or corrupt file is an empty store.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::identity::{DeviceIdentity, IdentityKey};

/// Default retention window for records and journal lines.
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Last lifecycle action applied to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastAction {
    Attached,
    Detached,
}

/// Persisted history for one device identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub vid: String,
    pub pid: String,
    #[serde(default)]
    pub serial: Option<String>,
    /// Bus id of the live binding; `None` once detached.
    #[serde(default)]
    pub last_busid: Option<String>,
    pub last_action: LastAction,
    /// ISO-8601 instant of the last mutation.
    #[serde(default)]
    pub last_timestamp: String,
}

impl DeviceRecord {
    /// Parsed `last_timestamp`, if it is a valid ISO-8601 instant.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.last_timestamp)
    }

    /// True if the record holds a live binding.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.last_busid.is_some()
    }
}

/// Format an instant the way records store it.
#[must_use]
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse an RFC 3339 instant, or a naive ISO-8601 local time.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|ts| ts.with_timezone(&Utc))
}

/// In-memory binding history with an optional backing file.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    path: Option<PathBuf>,
    records: BTreeMap<String, DeviceRecord>,
}

impl StateStore {
    /// A store that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the store from `path`.
    ///
    /// Never fails: an absent, unreadable or unparsable file yields an empty
    /// store backed by the same path.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, DeviceRecord>>(&contents) {
                Ok(records) => records,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "State file corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No state file yet");
                BTreeMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "State file unreadable, starting empty");
                BTreeMap::new()
            }
        };
        debug!(path = %path.display(), count = records.len(), "State loaded");
        Self {
            path: Some(path),
            records,
        }
    }

    /// Write the store to its backing file as pretty JSON.
    ///
    /// The file is replaced atomically. In-memory stores are a no-op.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.records)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        trace!(path = %path.display(), count = self.records.len(), "State saved");
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn get(&self, key: &IdentityKey) -> Option<&DeviceRecord> {
        self.records.get(key.as_str())
    }

    /// All records in key order.
    pub fn records(&self) -> impl Iterator<Item = (&str, &DeviceRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record a new binding for `identity`.
    pub fn record_attached(&mut self, identity: &DeviceIdentity, busid: &str, now: DateTime<Local>) {
        let key = identity.key();
        debug!(key = %key, busid, "Recording attach");
        self.records.insert(
            key.into(),
            DeviceRecord {
                vid: identity.vid.clone(),
                pid: identity.pid.clone(),
                serial: identity.serial.clone(),
                last_busid: Some(busid.to_string()),
                last_action: LastAction::Attached,
                last_timestamp: format_timestamp(now),
            },
        );
    }

    /// Mark every record bound to `busid` as detached.
    ///
    /// Returns the keys that changed; more than one identity can hold the
    /// same stale bus id after a replug.
    pub fn record_detached_busid(&mut self, busid: &str, now: DateTime<Local>) -> Vec<String> {
        let stamp = format_timestamp(now);
        let mut changed = Vec::new();
        for (key, record) in &mut self.records {
            if record.last_busid.as_deref() == Some(busid) {
                trace!(key = %key, busid, "Recording detach");
                record.last_busid = None;
                record.last_action = LastAction::Detached;
                record.last_timestamp.clone_from(&stamp);
                changed.push(key.clone());
            }
        }
        debug!(busid, count = changed.len(), "Detach reconciled");
        changed
    }

    /// The bound record touched most recently.
    ///
    /// Unparsable timestamps sort oldest; ties go to the first key.
    #[must_use]
    pub fn most_recent_binding(&self) -> Option<(&str, &DeviceRecord)> {
        self.records()
            .filter(|(_, r)| r.is_bound())
            .fold(None, |best: Option<(&str, &DeviceRecord)>, candidate| match best {
                Some(b) if b.1.timestamp() >= candidate.1.timestamp() => Some(b),
                _ => Some(candidate),
            })
    }

    /// Remove records older than `now - retention`.
    ///
    /// Records whose timestamp does not parse are kept. Returns the removed
    /// keys.
    pub fn prune(&mut self, now: DateTime<Utc>, retention: TimeDelta) -> Vec<String> {
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            return Vec::new();
        };
        let expired: Vec<String> = self
            .records
            .iter()
            .filter(|(_, r)| r.timestamp().is_some_and(|ts| ts < cutoff))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            self.records.remove(key);
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "Pruned stale device records");
        }
        expired
    }

    /// Get a summary of the stored records.
    #[must_use]
    pub fn summary(&self) -> StateSummary {
        let bound = self.records.values().filter(|r| r.is_bound()).count();
        StateSummary {
            total: self.records.len(),
            bound,
            detached: self.records.len() - bound,
        }
    }
}

/// Summary of stored records for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateSummary {
    /// Total number of records.
    pub total: usize,
    /// Records holding a live binding.
    pub bound: usize,
    /// Records without a binding.
    pub detached: usize,
}
