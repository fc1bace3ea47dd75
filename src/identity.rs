//! Stable device identity derived from port metadata.
//!
//! Bus identifiers change on every replug, so persisted history is keyed on
//! the vendor id, product id and serial number triple instead.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::device::PortDescriptor;
use crate::error::{Result, WcmError};

/// Key component used when a device reports no serial number.
pub const NO_SERIAL: &str = "NOSN";

const ESCAPE: char = '\\';

/// `VID_0403&PID_6001` and friends (Windows instance ids).
static VID_PID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)VID[_:]?([0-9A-F]{4}).*?PID[_:]?([0-9A-F]{4})").expect("valid regex")
});

/// `VID:PID=0403:6001` (pyserial-style hardware ids).
static COMBINED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)VID:PID=([0-9A-F]{4}):([0-9A-F]{4})").expect("valid regex")
});

/// Vendor/product/serial identity of a USB device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Uppercase 4-hex-digit vendor id
    pub vid: String,
    /// Uppercase 4-hex-digit product id
    pub pid: String,
    /// Serial number, when the device reports one
    pub serial: Option<String>,
}

impl DeviceIdentity {
    /// Build an identity from numeric ids.
    #[must_use]
    pub fn from_ids(vid: u16, pid: u16, serial: Option<&str>) -> Self {
        Self {
            vid: format!("{vid:04X}"),
            pid: format!("{pid:04X}"),
            serial: normalize_serial(serial),
        }
    }

    /// The state store key for this identity.
    #[must_use]
    pub fn key(&self) -> IdentityKey {
        IdentityKey::new(&self.vid, &self.pid, self.serial.as_deref())
    }

    /// Serial number used as a resolver hint.
    #[must_use]
    pub fn serial_hint(&self) -> Option<&str> {
        self.serial.as_deref().filter(|s| !s.is_empty())
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vid, self.pid)?;
        if let Some(sn) = &self.serial {
            write!(f, " (SN {sn})")?;
        }
        Ok(())
    }
}

/// Deterministic string key: `VVVV:PPPP:<serial or NOSN>`.
///
/// A real serial equal to `NOSN` or starting with `\` is escaped with a
/// leading `\`, so the key never confuses "no serial" with a serial.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    #[must_use]
    pub fn new(vid: &str, pid: &str, serial: Option<&str>) -> Self {
        let component = match serial {
            None => NO_SERIAL.to_string(),
            Some(sn) if sn == NO_SERIAL || sn.starts_with(ESCAPE) => format!("{ESCAPE}{sn}"),
            Some(sn) => sn.to_string(),
        };
        Self(format!("{vid}:{pid}:{component}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<IdentityKey> for String {
    fn from(key: IdentityKey) -> Self {
        key.0
    }
}

/// Derive a device identity from an OS port descriptor.
///
/// Direct vid/pid fields win; the raw hardware id is searched only when
/// either is missing.
pub fn extract_identity(port: &PortDescriptor) -> Result<DeviceIdentity> {
    let serial = port.serial.as_deref();

    if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
        trace!(device = %port.device, "Identity from direct vid/pid");
        return Ok(DeviceIdentity::from_ids(vid, pid, serial));
    }

    if let Some((vid, pid)) = ids_from_hwid(&port.hwid) {
        debug!(device = %port.device, hwid = %port.hwid, %vid, %pid, "Identity from hardware id");
        return Ok(DeviceIdentity {
            vid,
            pid,
            serial: normalize_serial(serial),
        });
    }

    debug!(device = %port.device, hwid = %port.hwid, "No VID/PID in port metadata");
    Err(WcmError::Unresolvable {
        port: port.device.clone(),
    })
}

/// Extract the first vendor/product pair from a raw hardware-id string.
#[must_use]
pub fn ids_from_hwid(hwid: &str) -> Option<(String, String)> {
    VID_PID_PATTERN
        .captures(hwid)
        .or_else(|| COMBINED_PATTERN.captures(hwid))
        .map(|caps| (caps[1].to_uppercase(), caps[2].to_uppercase()))
}

fn normalize_serial(serial: Option<&str>) -> Option<String> {
    serial.filter(|s| !s.is_empty()).map(str::to_string)
}
