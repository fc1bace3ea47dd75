//! Scratch directory with a config file pointing the CLI at throwaway paths.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use chrono::{Local, TimeDelta};
use serde_json::Value;
use tempfile::TempDir;

use wcm::config::Config;
use wcm::state::format_timestamp;

/// Passthrough program that does not exist, so no real `usbipd` ever runs.
pub const MISSING_PROGRAM: &str = "wcm-test-usbipd-does-not-exist";

pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    /// Sandbox with a config file naming the scratch state and journal.
    #[must_use]
    pub fn new() -> Self {
        let sandbox = Self {
            dir: TempDir::new().expect("create temp dir"),
        };
        let mut config = Config::default();
        config.usbipd.program = MISSING_PROGRAM.to_string();
        config.state.path = Some(sandbox.state_path());
        config.journal.path = Some(sandbox.journal_path());
        std::fs::write(sandbox.config_path(), config.to_toml().expect("render config"))
            .expect("write config");
        sandbox
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("devices_state.json")
    }

    #[must_use]
    pub fn journal_path(&self) -> PathBuf {
        self.dir.path().join("wsl_com_manager.log")
    }

    /// Write a state file with one record per `(key, busid, age)` triple.
    pub fn write_state(&self, records: &[(&str, Option<&str>, TimeDelta)]) {
        let mut map = serde_json::Map::new();
        for (key, busid, age) in records {
            let mut parts = key.splitn(3, ':');
            let vid = parts.next().unwrap_or_default();
            let pid = parts.next().unwrap_or_default();
            let serial = parts.next().filter(|s| *s != "NOSN");
            let action = if busid.is_some() { "attached" } else { "detached" };
            map.insert(
                (*key).to_string(),
                serde_json::json!({
                    "vid": vid,
                    "pid": pid,
                    "serial": serial,
                    "last_busid": busid,
                    "last_action": action,
                    "last_timestamp": format_timestamp(Local::now() - *age),
                }),
            );
        }
        std::fs::write(
            self.state_path(),
            serde_json::to_string_pretty(&Value::Object(map)).expect("render state"),
        )
        .expect("write state");
    }

    /// Parsed state file.
    #[must_use]
    pub fn read_state(&self) -> Value {
        let text = std::fs::read_to_string(self.state_path()).expect("read state");
        serde_json::from_str(&text).expect("state is JSON")
    }

    #[must_use]
    pub fn read_journal(&self) -> String {
        std::fs::read_to_string(self.journal_path()).unwrap_or_default()
    }

    /// The `wcm` binary, quiet, configured for this sandbox.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("wcm").expect("wcm binary");
        cmd.env_remove("WCM_STATE_FILE")
            .env_remove("WCM_USBIPD")
            .env_remove("WCM_FORMAT")
            .env_remove("RUST_LOG")
            .env("WCM_CONFIG", self.config_path())
            .arg("-q");
        cmd
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse command output as JSON.
#[must_use]
pub fn parse_json(bytes: &[u8]) -> Value {
    let text = String::from_utf8_lossy(bytes);
    serde_json::from_str(text.trim()).unwrap_or_else(|_| panic!("Failed to parse JSON:\n{text}"))
}
