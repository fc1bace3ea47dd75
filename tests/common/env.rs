//! Environment variable helpers for tests.
#![allow(dead_code)]

use env_lock::{EnvGuard as LockedEnvGuard, lock_env};
use tracing::{instrument, trace};

/// RAII guard to restore environment variables on drop.
pub struct EnvGuard<'a> {
    _guard: LockedEnvGuard<'a>,
}

impl<'a> EnvGuard<'a> {
    #[must_use]
    #[instrument]
    pub fn set(key: &'a str, value: &str) -> Self {
        trace!(key, value, "Setting env var");
        let guard = lock_env([(key, Some(value))]);
        Self { _guard: guard }
    }

    #[must_use]
    #[instrument]
    pub fn remove(key: &'a str) -> Self {
        trace!(key, "Removing env var");
        let guard = lock_env([(key, None::<&str>)]);
        Self { _guard: guard }
    }

    /// Set several variables under one lock.
    #[must_use]
    pub fn set_all<const N: usize>(vars: [(&'a str, Option<&'a str>); N]) -> Self {
        trace!(count = N, "Setting env vars");
        Self {
            _guard: lock_env(vars),
        }
    }
}

/// Clear every variable the CLI reads, so ambient settings cannot leak in.
#[must_use]
pub fn without_wcm_env() -> EnvGuard<'static> {
    EnvGuard::set_all([
        ("WCM_CONFIG", None),
        ("WCM_STATE_FILE", None),
        ("WCM_USBIPD", None),
        ("WCM_FORMAT", None),
    ])
}
