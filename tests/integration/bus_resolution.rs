//! Bus id resolution against realistic `usbipd list` output.

use wcm::identity::DeviceIdentity;
use wcm::resolver::{BusResolver, resolve};
use wcm::usbipd::mock::MockUsbipd;
use wcm::usbipd::parse_listing;

use crate::common::init_test_logging;

const USBIPD_LIST: &str = "\
Connected:
BUSID  VID:PID    DEVICE                                                        STATE
1-2    0403:6001  USB Serial Converter                                          Not shared
1-3    0403:6001  USB Serial Converter                                          Shared
2-1    10c4:ea60  CP2102N USB to UART Bridge Controller                         Attached
3-4    046d:c52b  USB Input Device, Logitech Unifying Receiver                  Not shared

Persisted:
GUID                                  DEVICE
4d7e4c1c-3a2b-4c5d-8e9f-0a1b2c3d4e5f  USB Serial Converter
";

#[test]
fn test_parses_only_device_lines() {
    init_test_logging();
    let entries = parse_listing(USBIPD_LIST);
    let busids: Vec<&str> = entries.iter().map(|e| e.busid.as_str()).collect();
    assert_eq!(busids, vec!["1-2", "1-3", "2-1", "3-4"]);
    assert_eq!(entries[2].vid, "10C4");
    assert_eq!(entries[2].pid, "EA60");
}

#[test]
fn test_lowercase_listing_matches_uppercase_identity() {
    let entries = parse_listing(USBIPD_LIST);
    let found = resolve(&entries, &DeviceIdentity::from_ids(0x10C4, 0xEA60, None));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].busid, "2-1");
    assert!(found[0].raw_listing_suffix.contains("CP2102N"));
}

#[test]
fn test_identical_devices_without_serial_in_listing() {
    // Neither line carries the serial, so both remain candidates in order
    let entries = parse_listing(USBIPD_LIST);
    let found = resolve(&entries, &DeviceIdentity::from_ids(0x0403, 0x6001, Some("A1")));
    let busids: Vec<&str> = found.iter().map(|b| b.busid.as_str()).collect();
    assert_eq!(busids, vec!["1-2", "1-3"]);
}

#[test]
fn test_serial_hint_picks_second_device() {
    let listing = "1-2  0403:6001  USB Serial Converter A1  Not shared\n\
                   1-3  0403:6001  USB Serial Converter B2  Not shared\n";
    let usbipd = MockUsbipd::new().with_listing(listing);
    let found = BusResolver::new(&usbipd).candidates(&DeviceIdentity::from_ids(0x0403, 0x6001, Some("B2")));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].busid, "1-3");
    assert_eq!(usbipd.invocations(), vec!["list"]);
}

#[test]
fn test_unlisted_device_is_not_visible() {
    let usbipd = MockUsbipd::new().with_listing(USBIPD_LIST);
    let found = BusResolver::new(&usbipd).candidates(&DeviceIdentity::from_ids(0x2341, 0x0043, None));
    assert!(found.is_empty());
}

#[test]
fn test_failed_listing_resolves_nothing() {
    let usbipd = MockUsbipd::new().with_listing(USBIPD_LIST);
    usbipd.fail_launch("program not found");
    let resolver = BusResolver::new(&usbipd);

    let (output, entries) = resolver.listing();
    assert!(output.failure().is_some());
    assert!(entries.is_empty());
}
