//! Parser for `usbipd list` output.
//!
//! Only device lines are recognised:
//!
//! ```text
//! Connected:
//! BUSID  VID:PID    DEVICE                     STATE
//! 1-2    0403:6001  USB Serial Converter       Not shared
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::trace;

use crate::identity::DeviceIdentity;

static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\S+)\s+([0-9A-Fa-f]{4}):([0-9A-Fa-f]{4})(.*)$").expect("valid regex")
});

/// One device line of the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    pub busid: String,
    /// Uppercase vendor id
    pub vid: String,
    /// Uppercase product id
    pub pid: String,
    /// Free text after the vendor:product pair
    pub remainder: String,
}

impl ListingEntry {
    /// True if this entry has the identity's vendor and product ids.
    #[must_use]
    pub fn matches(&self, identity: &DeviceIdentity) -> bool {
        self.vid.eq_ignore_ascii_case(&identity.vid) && self.pid.eq_ignore_ascii_case(&identity.pid)
    }

    /// Free text with surrounding whitespace removed.
    #[must_use]
    pub fn description(&self) -> &str {
        self.remainder.trim()
    }
}

/// Parse every device line, in listing order.
#[must_use]
pub fn parse_listing(text: &str) -> Vec<ListingEntry> {
    text.lines()
        .filter_map(|line| {
            let caps = LINE_PATTERN.captures(line)?;
            let entry = ListingEntry {
                busid: caps[1].to_string(),
                vid: caps[2].to_uppercase(),
                pid: caps[3].to_uppercase(),
                remainder: caps[4].to_string(),
            };
            trace!(busid = %entry.busid, vid = %entry.vid, pid = %entry.pid, "Listing entry");
            Some(entry)
        })
        .collect()
}
