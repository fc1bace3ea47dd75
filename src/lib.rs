//! WSL COM Manager library - share USB serial devices with WSL through usbipd.
//!
//! This library exposes the core functionality of the `wcm` CLI for use in
//! tests and other front ends.
//!
//! # Modules
//!
//! - `identity`: Stable device identity from port metadata
//! - `resolver`: Identity to usbipd bus id resolution
//! - `state`: Persisted binding history
//! - `manager`: Attach/detach orchestration
//! - `usbipd`: Passthrough utility invocation (real and mock)
//! - `device`: Serial port enumeration (real and mock)
//! - `journal`: Command journal
//! - `error`: Error types with user-recoverable hints
//! - `output`: Output mode abstraction (robot/human)
//! - `config`: Configuration file handling
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod identity;
pub mod journal;
pub mod logging;
pub mod manager;
pub mod output;
pub mod resolver;
pub mod state;
pub mod theme;
pub mod usbipd;
