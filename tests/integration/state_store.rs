//! State store persistence and pruning on disk.

use chrono::{Local, TimeDelta, Utc};
use tempfile::TempDir;

use wcm::identity::DeviceIdentity;
use wcm::state::{LastAction, StateStore};

use crate::common::init_test_logging;

fn ftdi(serial: &str) -> DeviceIdentity {
    DeviceIdentity::from_ids(0x0403, 0x6001, Some(serial))
}

#[test]
fn test_state_survives_reload() {
    init_test_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("devices_state.json");

    let mut store = StateStore::load(&path);
    assert!(store.is_empty());
    store.record_attached(&ftdi("A1"), "1-2", Local::now());
    store.save().unwrap();

    let reloaded = StateStore::load(&path);
    let record = reloaded.get(&ftdi("A1").key()).unwrap();
    assert_eq!(record.last_busid.as_deref(), Some("1-2"));
    assert_eq!(record.last_action, LastAction::Attached);
}

#[test]
fn test_save_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/dir/devices_state.json");

    let mut store = StateStore::load(&path);
    store.record_attached(&ftdi("A1"), "1-2", Local::now());
    store.save().unwrap();
    assert!(path.exists());
}

#[test]
fn test_truncated_file_is_empty_store() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("devices_state.json");
    std::fs::write(&path, "{\"0403:6001:A1\": {\"vid\": ").unwrap();

    let store = StateStore::load(&path);
    assert!(store.is_empty());
    assert_eq!(store.path(), Some(path.as_path()));
}

#[test]
fn test_prune_on_reload() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("devices_state.json");
    let now = Local::now();

    let mut store = StateStore::load(&path);
    store.record_attached(&ftdi("OLD"), "1-4", now - TimeDelta::days(10));
    store.record_attached(&ftdi("NEW"), "1-5", now - TimeDelta::days(1));
    store.save().unwrap();

    let mut reloaded = StateStore::load(&path);
    let removed = reloaded.prune(Utc::now(), TimeDelta::days(7));
    assert_eq!(removed, vec![ftdi("OLD").key().to_string()]);
    assert!(reloaded.get(&ftdi("NEW").key()).is_some());
    assert_eq!(reloaded.len(), 1);
}

#[test]
fn test_most_recent_binding_after_several_attaches() {
    let now = Local::now();
    let mut store = StateStore::in_memory();
    store.record_attached(&ftdi("A1"), "1-2", now - TimeDelta::hours(3));
    store.record_attached(&ftdi("B2"), "1-3", now - TimeDelta::minutes(5));
    store.record_attached(&ftdi("C3"), "1-4", now - TimeDelta::hours(1));

    let (key, record) = store.most_recent_binding().unwrap();
    assert_eq!(key, "0403:6001:B2");
    assert_eq!(record.last_busid.as_deref(), Some("1-3"));

    store.record_detached_busid("1-3", now);
    let (key, _) = store.most_recent_binding().unwrap();
    assert_eq!(key, "0403:6001:C3");
}

#[test]
fn test_summary_counts() {
    let now = Local::now();
    let mut store = StateStore::in_memory();
    store.record_attached(&ftdi("A1"), "1-2", now);
    store.record_attached(&ftdi("B2"), "1-3", now);
    store.record_detached_busid("1-2", now);

    let summary = store.summary();
    assert_eq!((summary.total, summary.bound, summary.detached), (2, 1, 1));
}
