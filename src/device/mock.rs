//! Mock port enumerator for testing.
//!
//! Ports can be plugged and unplugged between operations to simulate
//! replug events, and enumeration failures can be injected.
//!
//! # Example
//!
//! ```rust,ignore
//! use wcm::device::mock::MockPorts;
//! use wcm::device::PortDescriptor;
//!
//! let ports = MockPorts::new()
//!     .with_port(PortDescriptor::usb("COM5", 0x0403, 0x6001, Some("A1")));
//! ports.unplug("COM5");
//! ```

use std::sync::Mutex;

use tracing::{debug, trace};

use super::PortEnumerator;
use super::info::PortDescriptor;
use crate::error::{Result, WcmError};

/// Mock serial port list.
#[derive(Debug, Default)]
pub struct MockPorts {
    ports: Mutex<Vec<PortDescriptor>>,
    error_injection: Mutex<Option<WcmError>>,
    enumerations: Mutex<usize>,
}

impl MockPorts {
    /// Create an empty port list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a port (builder form).
    #[must_use]
    pub fn with_port(self, port: PortDescriptor) -> Self {
        self.plug(port);
        self
    }

    /// Add or replace a port.
    pub fn plug(&self, port: PortDescriptor) {
        debug!(device = %port.device, "Plugging mock port");
        let mut ports = self.ports.lock().unwrap();
        ports.retain(|p| p.device != port.device);
        ports.push(port);
    }

    /// Remove a port by device name.
    pub fn unplug(&self, device: &str) {
        debug!(device, "Unplugging mock port");
        self.ports.lock().unwrap().retain(|p| p.device != device);
    }

    /// Make the next enumeration fail.
    pub fn inject_error(&self, error: WcmError) {
        *self.error_injection.lock().unwrap() = Some(error);
    }

    /// Number of times the port list was read.
    #[must_use]
    pub fn enumeration_count(&self) -> usize {
        *self.enumerations.lock().unwrap()
    }
}

impl PortEnumerator for MockPorts {
    fn ports(&self) -> Result<Vec<PortDescriptor>> {
        *self.enumerations.lock().unwrap() += 1;
        if let Some(error) = self.error_injection.lock().unwrap().take() {
            return Err(error);
        }
        let ports = self.ports.lock().unwrap().clone();
        trace!(count = ports.len(), "Mock enumeration");
        Ok(ports)
    }
}
