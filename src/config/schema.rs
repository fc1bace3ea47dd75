//! Configuration file schema.
//!
//! ```toml
//! [usbipd]
//! program = "usbipd"
//!
//! [state]
//! path = "~/wcm/devices_state.json"
//! retention_days = 7
//!
//! [journal]
//! enabled = true
//! retention_days = 7
//! ```

use std::path::PathBuf;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WcmError};
use crate::state::DEFAULT_RETENTION_DAYS;
use crate::usbipd::DEFAULT_PROGRAM;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub usbipd: UsbipdSettings,
    pub state: StateSettings,
    pub journal: JournalSettings,
}

/// Passthrough utility settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UsbipdSettings {
    /// Program name or path of the passthrough utility.
    pub program: String,
}

impl Default for UsbipdSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
        }
    }
}

/// Binding history settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateSettings {
    /// State file location (default: `<data_dir>/wsl-com-manager/devices_state.json`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Records untouched for longer than this are pruned at startup.
    pub retention_days: u32,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            path: None,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

/// Command journal settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JournalSettings {
    pub enabled: bool,
    /// Journal location (default: `<data_dir>/wsl-com-manager/wsl_com_manager.log`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub retention_days: u32,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl Config {
    /// Check values that parse but make no sense.
    pub fn validate(&self) -> Result<()> {
        if self.usbipd.program.trim().is_empty() {
            return Err(WcmError::ConfigInvalid(
                "usbipd.program must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| WcmError::Other(format!("Failed to render config: {e}")))
    }
}

impl StateSettings {
    #[must_use]
    pub fn retention(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.retention_days))
    }
}

impl JournalSettings {
    #[must_use]
    pub fn retention(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.retention_days))
    }
}
