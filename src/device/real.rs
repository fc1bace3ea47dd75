//! Operating-system serial port enumeration.
//!
//! This module wraps the `serialport` crate to provide the concrete
//! port enumerator.

use serialport::{SerialPortInfo, SerialPortType};
use tracing::{debug, trace};

use super::PortEnumerator;
use super::info::{PortDescriptor, usb_hwid};
use crate::error::{Result, WcmError};

/// Port enumerator backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPorts;

impl SystemPorts {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PortEnumerator for SystemPorts {
    fn ports(&self) -> Result<Vec<PortDescriptor>> {
        let ports = serialport::available_ports()
            .map_err(|e| WcmError::PortEnumeration(e.to_string()))?;
        debug!(count = ports.len(), "Enumerated serial ports");
        Ok(ports.into_iter().map(describe).collect())
    }
}

fn describe(info: SerialPortInfo) -> PortDescriptor {
    trace!(port = %info.port_name, kind = ?info.port_type, "Describing port");
    match info.port_type {
        SerialPortType::UsbPort(usb) => {
            let description = match (usb.manufacturer.as_deref(), usb.product.as_deref()) {
                (Some(m), Some(p)) => format!("{p} ({m})"),
                (None, Some(p)) => p.to_string(),
                (Some(m), None) => m.to_string(),
                (None, None) => "USB Serial Device".to_string(),
            };
            PortDescriptor {
                device: info.port_name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                hwid: usb_hwid(usb.vid, usb.pid, usb.serial_number.as_deref()),
                serial: usb.serial_number,
                description,
            }
        }
        SerialPortType::PciPort => {
            PortDescriptor::new(info.port_name, "PCI").with_description("PCI Serial Port")
        }
        SerialPortType::BluetoothPort => {
            PortDescriptor::new(info.port_name, "BLUETOOTH").with_description("Bluetooth Serial Port")
        }
        SerialPortType::Unknown => PortDescriptor::new(info.port_name, "n/a"),
    }
}
