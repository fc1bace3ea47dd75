//! Port descriptor types reported by serial port enumeration.

use serde::Serialize;

/// One serial port as reported by the operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortDescriptor {
    /// Device path or port name (e.g., "COM5", "/dev/ttyUSB0")
    pub device: String,
    /// USB vendor id, if the port is USB-backed
    pub vid: Option<u16>,
    /// USB product id, if the port is USB-backed
    pub pid: Option<u16>,
    /// USB serial number string, if reported
    pub serial: Option<String>,
    /// Raw hardware-id string
    pub hwid: String,
    /// Human-readable description
    pub description: String,
}

impl PortDescriptor {
    /// Create a descriptor with only a device name and hardware id.
    #[must_use]
    pub fn new(device: impl Into<String>, hwid: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            vid: None,
            pid: None,
            serial: None,
            hwid: hwid.into(),
            description: "n/a".to_string(),
        }
    }

    /// Create a USB-backed descriptor with direct vid/pid fields.
    #[must_use]
    pub fn usb(device: impl Into<String>, vid: u16, pid: u16, serial: Option<&str>) -> Self {
        let serial = serial.map(str::to_string);
        let hwid = usb_hwid(vid, pid, serial.as_deref());
        Self {
            device: device.into(),
            vid: Some(vid),
            pid: Some(pid),
            serial,
            hwid,
            description: "USB Serial Device".to_string(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the serial number.
    #[must_use]
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }
}

/// Hardware-id string for a USB port, in the `USB VID:PID=xxxx:xxxx SER=...` form.
#[must_use]
pub fn usb_hwid(vid: u16, pid: u16, serial: Option<&str>) -> String {
    match serial {
        Some(sn) if !sn.is_empty() => format!("USB VID:PID={vid:04X}:{pid:04X} SER={sn}"),
        _ => format!("USB VID:PID={vid:04X}:{pid:04X}"),
    }
}
