//! Error types for USB serial passthrough operations.

use thiserror::Error;

/// Primary error type for `wcm` operations.
#[derive(Error, Debug)]
pub enum WcmError {
    // Device identity errors
    #[error("Unable to read VID/PID for port {port}")]
    Unresolvable { port: String },

    #[error("Serial port not available: {port}")]
    PortNotAvailable { port: String },

    #[error("Failed to enumerate serial ports: {0}")]
    PortEnumeration(String),

    // Passthrough errors
    /// `cleanup` describes a previous binding released before the lookup.
    #[error("Device {vid}:{pid} not found in usbipd list{}", note(.cleanup))]
    DeviceNotVisible {
        vid: String,
        pid: String,
        cleanup: Option<String>,
    },

    #[error("Nothing to detach")]
    NothingToDetach,

    #[error("`{command}` reported an error: {detail}")]
    ExternalCommand { command: String, detail: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl WcmError {
    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Unresolvable { .. }
                | Self::PortNotAvailable { .. }
                | Self::DeviceNotVisible { .. }
                | Self::NothingToDetach
                | Self::ConfigNotFound { .. }
                | Self::ConfigParse(_)
                | Self::ConfigInvalid(_)
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Unresolvable { .. } => {
                Some("Pick a different port; this device does not report USB VID/PID")
            }
            Self::PortNotAvailable { .. } => Some("Run: wcm ports"),
            Self::DeviceNotVisible { .. } => {
                Some("Replug the device, then check it appears in: wcm devices")
            }
            Self::NothingToDetach => Some("Select the port to detach, or check: wcm state"),
            Self::ExternalCommand { .. } => {
                Some("Ensure usbipd is installed and the shell is elevated")
            }
            Self::ConfigNotFound { .. } => Some("Create one with: wcm init"),
            Self::ConfigParse(_) => Some("Fix the file shown by: wcm config --path"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using WcmError.
pub type Result<T> = std::result::Result<T, WcmError>;

#[allow(clippy::ref_option)]
fn note(cleanup: &Option<String>) -> String {
    cleanup.as_ref().map_or_else(String::new, |c| format!("; {c}"))
}
