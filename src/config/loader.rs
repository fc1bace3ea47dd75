//! Loading and saving the configuration file.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, trace};

use super::path::{PathResolver, default_config_path, default_data_dir};
use super::schema::Config;
use crate::error::{Result, WcmError};

/// Default state file name inside the data directory.
pub const STATE_FILE_NAME: &str = "devices_state.json";

/// Default journal file name inside the data directory.
pub const JOURNAL_FILE_NAME: &str = "wsl_com_manager.log";

/// A configuration together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// The file that was read, or `None` when defaults were used.
    pub source: Option<PathBuf>,
    data_dir: PathBuf,
}

impl LoadedConfig {
    /// Defaults, with files placed under `data_dir`.
    #[must_use]
    pub fn with_defaults(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            config: Config::default(),
            source: None,
            data_dir: data_dir.into(),
        }
    }

    /// Directory holding the default state file and journal.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// State file location.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.config
            .state
            .path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(STATE_FILE_NAME))
    }

    /// Journal location, or `None` when journaling is disabled.
    #[must_use]
    pub fn journal_path(&self) -> Option<PathBuf> {
        if !self.config.journal.enabled {
            return None;
        }
        Some(
            self.config
                .journal
                .path
                .clone()
                .unwrap_or_else(|| self.data_dir.join(JOURNAL_FILE_NAME)),
        )
    }
}

/// Load the configuration.
///
/// With an explicit `path`, the file must exist. Without one, the default
/// location is tried and a missing file yields the defaults. Relative paths
/// inside the file are resolved against the file's directory.
///
/// # Errors
///
/// Returns an error if an explicit file is missing, or if a file exists but
/// cannot be read, parsed or validated.
#[instrument(skip_all, fields(path = ?path.map(Path::display)))]
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    let data_dir = default_data_dir()?;

    let (config_path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_config_path()?, false),
    };

    let content = match std::fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if explicit {
                return Err(WcmError::ConfigNotFound {
                    path: config_path.display().to_string(),
                });
            }
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(LoadedConfig::with_defaults(data_dir));
        }
        Err(e) => return Err(WcmError::Io(e)),
    };
    debug!(bytes = content.len(), "Read config file");

    let mut config = load_config_from_str(&content)?;

    let resolver = PathResolver::new(&config_path)?;
    if let Some(p) = config.state.path.take() {
        config.state.path = Some(resolver.resolve(&p)?);
    }
    if let Some(p) = config.journal.path.take() {
        config.journal.path = Some(resolver.resolve(&p)?);
    }

    info!(
        path = %config_path.display(),
        program = %config.usbipd.program,
        journal = config.journal.enabled,
        "Configuration loaded"
    );

    Ok(LoadedConfig {
        config,
        source: Some(config_path),
        data_dir,
    })
}

/// Parse and validate configuration text.
///
/// # Errors
///
/// Returns [`WcmError::ConfigParse`] or [`WcmError::ConfigInvalid`].
pub fn load_config_from_str(content: &str) -> Result<Config> {
    trace!("Parsing config content");
    let config: Config =
        toml::from_str(content).map_err(|e| WcmError::ConfigParse(format!("TOML: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Write `config` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if rendering or writing fails.
#[instrument(skip(config), fields(path = %path.display()))]
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, config.to_toml()?)?;
    info!("Configuration saved");
    Ok(())
}
