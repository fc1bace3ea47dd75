//! Resolve a device identity to the bus ids `usbipd` currently assigns.
//!
//! Bus ids are reassigned on every replug or reboot, so resolution always
//! runs against a fresh listing. A cached bus id is only ever used for
//! best-effort cleanup.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::identity::DeviceIdentity;
use crate::usbipd::{CommandOutput, ListingEntry, Passthrough, parse_listing};

/// A candidate bus id with the listing text that followed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusBinding {
    pub busid: String,
    pub raw_listing_suffix: String,
}

impl From<&ListingEntry> for BusBinding {
    fn from(entry: &ListingEntry) -> Self {
        Self {
            busid: entry.busid.clone(),
            raw_listing_suffix: entry.remainder.clone(),
        }
    }
}

/// Match listing entries against an identity.
///
/// All vendor:product matches are returned in listing order, unless the
/// identity's serial appears in one of their remainders, in which case only
/// that entry is returned. Serial matching is a text heuristic: an
/// occurrence bounded by non-alphanumeric characters is preferred over a
/// bare substring.
#[must_use]
pub fn resolve(entries: &[ListingEntry], identity: &DeviceIdentity) -> Vec<BusBinding> {
    let matching: Vec<&ListingEntry> = entries.iter().filter(|e| e.matches(identity)).collect();

    if let Some(serial) = identity.serial_hint() {
        let by_token = matching.iter().find(|e| contains_token(&e.remainder, serial));
        let by_substring = || matching.iter().find(|e| e.remainder.contains(serial));
        if let Some(entry) = by_token.or_else(by_substring) {
            debug!(busid = %entry.busid, serial, "Serial hint selected candidate");
            return vec![BusBinding::from(*entry)];
        }
    }

    matching.into_iter().map(BusBinding::from).collect()
}

fn contains_token(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Runs `list` and resolves identities against it.
pub struct BusResolver<'a, P: Passthrough + ?Sized> {
    passthrough: &'a P,
}

impl<'a, P: Passthrough + ?Sized> BusResolver<'a, P> {
    pub const fn new(passthrough: &'a P) -> Self {
        Self { passthrough }
    }

    /// Current listing, parsed.
    pub fn listing(&self) -> (CommandOutput, Vec<ListingEntry>) {
        let output = self.passthrough.list();
        let entries = parse_listing(&output.stdout);
        (output, entries)
    }

    /// Candidate bus ids for `identity`, invoking `list` exactly once.
    ///
    /// An empty result means the device is not currently visible to the
    /// passthrough subsystem.
    pub fn candidates(&self, identity: &DeviceIdentity) -> Vec<BusBinding> {
        self.candidates_with_listing(identity).1
    }

    /// Like [`candidates`](Self::candidates), also returning the `list`
    /// output so callers can tell an absent device from a failed listing.
    #[instrument(skip(self), fields(identity = %identity))]
    pub fn candidates_with_listing(
        &self,
        identity: &DeviceIdentity,
    ) -> (CommandOutput, Vec<BusBinding>) {
        let (output, entries) = self.listing();
        let found = resolve(&entries, identity);
        debug!(count = found.len(), "Resolved candidates");
        (output, found)
    }
}
