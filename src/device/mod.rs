//! Serial port enumeration.
//!
//! This module provides a trait-based abstraction over the operating
//! system's serial port list, enabling testability without hardware.

mod info;
pub mod mock;
mod real;

pub use info::{PortDescriptor, usb_hwid};
pub use real::SystemPorts;

use crate::error::Result;

/// Source of currently enumerable serial ports.
pub trait PortEnumerator {
    /// List every serial port the operating system currently reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the port list cannot be read.
    fn ports(&self) -> Result<Vec<PortDescriptor>>;

    /// Find a port by device name (exact match).
    fn find(&self, device: &str) -> Result<Option<PortDescriptor>> {
        Ok(self.ports()?.into_iter().find(|p| p.device == device))
    }
}

impl<T: PortEnumerator + ?Sized> PortEnumerator for Box<T> {
    fn ports(&self) -> Result<Vec<PortDescriptor>> {
        (**self).ports()
    }
}
