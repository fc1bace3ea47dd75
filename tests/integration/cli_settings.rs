//! Command line and environment overrides.

use std::path::PathBuf;

use clap::Parser;

use wcm::cli::{Cli, Commands};

use crate::common::env::{EnvGuard, without_wcm_env};

#[test]
fn test_env_overrides() {
    let _env = EnvGuard::set_all([
        ("WCM_STATE_FILE", Some("/tmp/wcm/state.json")),
        ("WCM_USBIPD", Some("usbipd.exe")),
        ("WCM_CONFIG", None),
        ("WCM_FORMAT", None),
    ]);
    let cli = Cli::try_parse_from(["wcm", "state"]).unwrap();
    assert_eq!(cli.state_file, Some(PathBuf::from("/tmp/wcm/state.json")));
    assert_eq!(cli.usbipd.as_deref(), Some("usbipd.exe"));
    assert!(cli.config.is_none());
}

#[test]
fn test_flags_beat_env() {
    let _env = EnvGuard::set_all([
        ("WCM_USBIPD", Some("usbipd.exe")),
        ("WCM_FORMAT", Some("json")),
    ]);
    let cli = Cli::try_parse_from(["wcm", "--usbipd", "/opt/usbipd", "--format", "text", "ports"]).unwrap();
    assert_eq!(cli.usbipd.as_deref(), Some("/opt/usbipd"));
    assert!(!cli.use_json());
}

#[test]
fn test_format_from_env() {
    let _env = EnvGuard::set("WCM_FORMAT", "json-compact");
    let cli = Cli::try_parse_from(["wcm", "version"]).unwrap();
    assert!(cli.use_compact_json());
}

#[test]
fn test_defaults_without_env() {
    let _env = without_wcm_env();
    let cli = Cli::try_parse_from(["wcm", "attach", "COM5"]).unwrap();
    assert!(!cli.use_json());
    assert!(cli.state_file.is_none());
    match cli.command {
        Some(Commands::Attach(args)) => assert_eq!(args.port, "COM5"),
        other => panic!("Expected attach, got {other:?}"),
    }
}
