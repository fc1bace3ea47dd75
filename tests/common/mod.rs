//! Common test utilities for `wcm`.
//!
//! - `env`: Environment variable guards
//! - `sandbox`: Scratch config, state and journal files for CLI runs
#![allow(dead_code)]

pub mod env;
pub mod sandbox;

use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
