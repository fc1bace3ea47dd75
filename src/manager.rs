//! Attach/detach orchestration.
//!
//! [`DeviceManager`] owns the state store and drives the passthrough utility
//! through the per-identity lifecycle `unbound -> bound -> unbound`. Bus ids
//! are always re-resolved from a fresh listing; the persisted bus id is only
//! used to clean up a binding that may have gone stale.
//!
//! Operations take `&mut self`, so each load-mutate-save sequence runs to
//! completion before the next one starts.

use chrono::{DateTime, Local, TimeDelta, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::device::{PortDescriptor, PortEnumerator};
use crate::error::{Result, WcmError};
use crate::identity::{DeviceIdentity, extract_identity};
use crate::resolver::BusResolver;
use crate::state::{DeviceRecord, StateStore};
use crate::usbipd::{CommandOutput, ListingEntry, Passthrough, combined_text};

/// Which lifecycle transition an outcome describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Attach,
    Detach,
}

/// Result of a completed attach or detach.
///
/// Completion means the lifecycle commands were run, not that they
/// succeeded; see [`OperationOutcome::failures`].
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome {
    pub action: Action,
    /// Port the operation was requested for, if any.
    pub port: Option<String>,
    /// Key of the identity acted on, when known.
    pub identity_key: Option<String>,
    pub busid: String,
    /// Stale-binding cleanup run before an attach.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cleanup: Vec<CommandOutput>,
    /// The bind/attach or detach/unbind commands.
    pub commands: Vec<CommandOutput>,
    /// Keys whose records were marked detached by this operation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reconciled: Vec<String>,
    /// The requested port was not found, so the most recent binding was
    /// used instead. It may belong to a different device.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fell_back: bool,
}

impl OperationOutcome {
    /// Combined text of the lifecycle commands.
    #[must_use]
    pub fn text(&self) -> String {
        combined_text(&self.commands)
    }

    /// Errors reported by the lifecycle commands.
    #[must_use]
    pub fn failures(&self) -> Vec<WcmError> {
        self.commands.iter().filter_map(CommandOutput::failure).collect()
    }

    /// True if any lifecycle command reported an error.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.commands.iter().any(|c| c.failure().is_some())
    }
}

/// One enumerable port with what is known about it.
#[derive(Debug, Clone, Serialize)]
pub struct PortSurvey {
    pub port: PortDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<DeviceIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<DeviceRecord>,
    /// Why no identity could be derived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Orchestrates attach and detach across the store and the collaborators.
pub struct DeviceManager<P: Passthrough, E: PortEnumerator> {
    store: StateStore,
    passthrough: P,
    ports: E,
}

impl<P: Passthrough, E: PortEnumerator> DeviceManager<P, E> {
    pub const fn new(store: StateStore, passthrough: P, ports: E) -> Self {
        Self {
            store,
            passthrough,
            ports,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &StateStore {
        &self.store
    }

    #[must_use]
    pub const fn passthrough(&self) -> &P {
        &self.passthrough
    }

    #[must_use]
    pub const fn ports(&self) -> &E {
        &self.ports
    }

    /// Drop records older than `retention` and persist if anything changed.
    pub fn prune(&mut self, now: DateTime<Utc>, retention: TimeDelta) -> Vec<String> {
        let removed = self.store.prune(now, retention);
        if !removed.is_empty() {
            self.persist();
        }
        removed
    }

    /// Bind and attach the device behind `port` to the guest.
    ///
    /// Any binding previously recorded for the same identity is detached
    /// first. Cleanup is best-effort and never aborts the attach.
    ///
    /// # Errors
    ///
    /// - [`WcmError::PortNotAvailable`] if `port` is not enumerable
    /// - [`WcmError::Unresolvable`] if the port reports no VID/PID
    /// - [`WcmError::DeviceNotVisible`] if the listing has no matching device
    /// - [`WcmError::ExternalCommand`] if `list` could not produce a listing
    /// - [`WcmError::PortEnumeration`] if the port list cannot be read
    #[instrument(skip(self))]
    pub fn attach(&mut self, port: &str) -> Result<OperationOutcome> {
        let descriptor = self
            .ports
            .find(port)?
            .ok_or_else(|| WcmError::PortNotAvailable {
                port: port.to_string(),
            })?;
        let identity = extract_identity(&descriptor)?;
        let key = identity.key();
        debug!(key = %key, "Attaching");

        let mut cleanup = Vec::new();
        let mut reconciled = Vec::new();
        let mut released = None;
        if let Some(stale) = self.store.get(&key).and_then(|r| r.last_busid.clone()) {
            info!(busid = %stale, "Cleaning up previous binding");
            cleanup = self.passthrough.detach_unbind(&stale);
            if cleanup.iter().all(|c| c.failure().is_none()) {
                reconciled = self.store.record_detached_busid(&stale, Local::now());
            } else {
                warn!(busid = %stale, "Cleanup reported errors, keeping record");
            }
            released = Some(stale);
        }

        let (listing, candidates) =
            BusResolver::new(&self.passthrough).candidates_with_listing(&identity);
        let Some(target) = candidates.first() else {
            if !reconciled.is_empty() {
                self.persist();
            }
            let note = released.map(|busid| cleanup_note(&busid, &cleanup, &reconciled));
            if let Some(note) = &note {
                info!(note = %note, "Device gone after cleanup");
            }
            if let Some(WcmError::ExternalCommand { command, detail }) = listing_failure(&listing) {
                let detail = match note {
                    Some(note) => format!("{detail}; {note}"),
                    None => detail,
                };
                return Err(WcmError::ExternalCommand { command, detail });
            }
            return Err(WcmError::DeviceNotVisible {
                vid: identity.vid,
                pid: identity.pid,
                cleanup: note,
            });
        };
        if candidates.len() > 1 {
            debug!(count = candidates.len(), busid = %target.busid, "Ambiguous match, taking first");
        }
        let busid = target.busid.clone();

        let commands = self.passthrough.bind_attach(&busid);
        self.store.record_attached(&identity, &busid, Local::now());
        self.persist();
        info!(key = %key, busid = %busid, "Attached");

        Ok(OperationOutcome {
            action: Action::Attach,
            port: Some(port.to_string()),
            identity_key: Some(key.into()),
            busid,
            cleanup,
            commands,
            reconciled,
            fell_back: false,
        })
    }

    /// Detach and unbind a device.
    ///
    /// With an enumerable `port`, the device's current bus id is resolved
    /// from the listing, falling back to its recorded bus id. Without one,
    /// or when the port is gone, the most recently recorded binding is used.
    ///
    /// # Errors
    ///
    /// - [`WcmError::Unresolvable`] if the port reports no VID/PID
    /// - [`WcmError::NothingToDetach`] if no bus id can be found; no
    ///   commands are run in that case
    #[instrument(skip(self))]
    pub fn detach(&mut self, port: Option<&str>) -> Result<OperationOutcome> {
        let descriptor = match port {
            Some(p) => self.ports.find(p).unwrap_or_else(|e| {
                warn!(error = %e, "Port enumeration failed, using last binding");
                None
            }),
            None => None,
        };

        let fell_back = port.is_some() && descriptor.is_none();
        let (identity_key, busid) = if let Some(descriptor) = descriptor {
            let identity = extract_identity(&descriptor)?;
            let key = identity.key();
            let (listing, candidates) =
                BusResolver::new(&self.passthrough).candidates_with_listing(&identity);
            if let Some(failure) = listing_failure(&listing) {
                warn!(error = %failure, "Listing failed, using recorded bus id");
            }
            let busid = candidates
                .into_iter()
                .next()
                .map(|b| b.busid)
                .or_else(|| self.store.get(&key).and_then(|r| r.last_busid.clone()));
            (Some(String::from(key)), busid)
        } else {
            match self.store.most_recent_binding() {
                Some((key, record)) => {
                    debug!(key, requested = ?port, "Falling back to most recent binding");
                    (Some(key.to_string()), record.last_busid.clone())
                }
                None => (None, None),
            }
        };

        let Some(busid) = busid else {
            return Err(WcmError::NothingToDetach);
        };

        let commands = self.passthrough.detach_unbind(&busid);
        let reconciled = self.store.record_detached_busid(&busid, Local::now());
        self.persist();
        info!(busid = %busid, records = reconciled.len(), "Detached");

        Ok(OperationOutcome {
            action: Action::Detach,
            port: port.map(str::to_string),
            identity_key,
            busid,
            cleanup: Vec::new(),
            commands,
            reconciled,
            fell_back,
        })
    }

    /// Every enumerable port with its identity and stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the port list cannot be read.
    pub fn survey_ports(&self) -> Result<Vec<PortSurvey>> {
        let ports = self.ports.ports()?;
        debug!(count = ports.len(), "Surveying ports");
        Ok(ports
            .into_iter()
            .map(|port| match extract_identity(&port) {
                Ok(identity) => {
                    let key = identity.key();
                    let record = self.store.get(&key).cloned();
                    PortSurvey {
                        port,
                        identity: Some(identity),
                        key: Some(key.into()),
                        record,
                        error: None,
                    }
                }
                Err(e) => PortSurvey {
                    port,
                    identity: None,
                    key: None,
                    record: None,
                    error: Some(e.to_string()),
                },
            })
            .collect())
    }

    /// The passthrough utility's current device listing.
    pub fn listing(&self) -> (CommandOutput, Vec<ListingEntry>) {
        BusResolver::new(&self.passthrough).listing()
    }

    fn persist(&self) {
        if let Err(e) = self.store.save() {
            warn!(error = %e, "Failed to save state, continuing");
        }
    }
}

/// The error behind a `list` run that yielded no listing at all.
fn listing_failure(listing: &CommandOutput) -> Option<WcmError> {
    if listing.launch_error.is_none() && !listing.stdout.trim().is_empty() {
        return None;
    }
    listing.failure()
}

/// One-line account of a stale-binding cleanup for error messages.
fn cleanup_note(busid: &str, cleanup: &[CommandOutput], reconciled: &[String]) -> String {
    let outcome = if reconciled.is_empty() {
        format!("cleanup of previous binding {busid} reported errors, record kept")
    } else {
        format!("previous binding {busid} was detached and unbound")
    };
    format!("{outcome}: {}", combined_text(cleanup).replace('\n', " | "))
}
