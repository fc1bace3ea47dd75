//! Identity extraction from realistic port metadata.

use wcm::device::mock::MockPorts;
use wcm::device::{PortDescriptor, PortEnumerator, usb_hwid};
use wcm::error::WcmError;
use wcm::identity::{DeviceIdentity, IdentityKey, NO_SERIAL, extract_identity};

use crate::common::init_test_logging;

#[test]
fn test_ftdi_with_direct_fields() {
    init_test_logging();
    let port = PortDescriptor::usb("COM5", 0x0403, 0x6001, Some("A1"));
    let identity = extract_identity(&port).unwrap();
    assert_eq!(identity.vid, "0403");
    assert_eq!(identity.pid, "6001");
    assert_eq!(identity.serial.as_deref(), Some("A1"));
    assert_eq!(identity.key().as_str(), "0403:6001:A1");
}

#[test]
fn test_windows_instance_id_without_direct_fields() {
    let port = PortDescriptor::new("COM7", r"USB\VID_10c4&PID_ea60\0001");
    let identity = extract_identity(&port).unwrap();
    assert_eq!(identity, DeviceIdentity::from_ids(0x10C4, 0xEA60, None));
    assert_eq!(identity.key().as_str(), format!("10C4:EA60:{NO_SERIAL}"));
}

#[test]
fn test_composite_device_hwid() {
    // CH340 behind a composite parent: the first pair is the device itself
    let port = PortDescriptor::new("COM3", r"USB\VID_1A86&PID_7523&MI_00\7&1A2B3C4D&0&0000");
    let identity = extract_identity(&port).unwrap();
    assert_eq!((identity.vid.as_str(), identity.pid.as_str()), ("1A86", "7523"));
}

#[test]
fn test_pyserial_hwid_with_serial_field() {
    let hwid = usb_hwid(0x2341, 0x0043, Some("85736323838351F0E1A1"));
    let port = PortDescriptor::new("COM4", hwid).with_serial("85736323838351F0E1A1");
    let identity = extract_identity(&port).unwrap();
    assert_eq!(identity.key().as_str(), "2341:0043:85736323838351F0E1A1");
}

#[test]
fn test_legacy_uart_is_unresolvable() {
    let port = PortDescriptor::new("COM1", r"ACPI\PNP0501\1");
    match extract_identity(&port) {
        Err(WcmError::Unresolvable { port }) => assert_eq!(port, "COM1"),
        other => panic!("Expected Unresolvable, got {other:?}"),
    }
}

#[test]
fn test_identity_stable_across_replug() {
    let ports = MockPorts::new().with_port(PortDescriptor::usb("COM5", 0x0403, 0x6001, Some("A1")));
    let before = extract_identity(&ports.find("COM5").unwrap().unwrap()).unwrap();

    // Windows may hand out a new COM number after a replug
    ports.unplug("COM5");
    ports.plug(PortDescriptor::usb("COM8", 0x0403, 0x6001, Some("A1")));
    let after = extract_identity(&ports.find("COM8").unwrap().unwrap()).unwrap();

    assert_eq!(before.key(), after.key());
}

#[test]
fn test_keys_distinguish_sentinel_serial() {
    let absent = DeviceIdentity::from_ids(0x0403, 0x6001, None).key();
    let literal = DeviceIdentity::from_ids(0x0403, 0x6001, Some(NO_SERIAL)).key();
    assert_ne!(absent, literal);
    assert_eq!(literal.as_str(), "0403:6001:\\NOSN");
    assert_eq!(absent, IdentityKey::new("0403", "6001", None));
}
