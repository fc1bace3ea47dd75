//! Configuration for `wcm`.
//!
//! A TOML file at `<config_dir>/wsl-com-manager/config.toml` selects the
//! passthrough program, the state file and the command journal. Every value
//! has a default, and a missing default file is not an error.

mod loader;
mod path;
mod schema;

pub use loader::{
    JOURNAL_FILE_NAME, LoadedConfig, STATE_FILE_NAME, load_config, load_config_from_str,
    save_config,
};
pub use path::{APP_DIR, PathResolver, default_config_path, default_data_dir, home_dir, resolve_path};
pub use schema::{Config, JournalSettings, StateSettings, UsbipdSettings};
