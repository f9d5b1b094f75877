#[path = "../common/mod.rs"]
mod common;

use common::fixtures::*;
use libnfc::{Device, Error, Property};

#[test]
fn open_rejects_unknown_driver_prefix() {
    match Device::open(Some("nonsense:/dev/ttyUSB0")) {
        Err(Error::UnknownDriver(cs)) => assert!(cs.starts_with("nonsense")),
        other => panic!("expected unknown driver, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn open_rejects_oversized_connstring() {
    let huge = format!("pn532_uart:{}", "x".repeat(2000));
    match Device::open(Some(&huge)) {
        Err(Error::InvalidArgument(_)) => {}
        other => panic!("expected invalid argument, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn list_devices_honors_the_cap() {
    // Idempotent within one snapshot and never larger than the cap
    let first = Device::list_devices(4);
    let second = Device::list_devices(4);
    assert!(first.len() <= 4);
    assert_eq!(first, second);

    let one = Device::list_devices(1);
    assert!(one.len() <= 1);
}

#[test]
fn close_releases_the_driver() {
    let (device, mock) = mock_pn532_device_auto();
    device.close().unwrap();
    assert!(mock.0.lock().unwrap().closed);
}

#[test]
fn drop_also_releases_the_driver() {
    let (device, mock) = mock_pn532_device_auto();
    drop(device);
    assert!(mock.0.lock().unwrap().closed);
}

#[test]
fn close_idles_a_pn532() {
    let (device, mock) = mock_pn532_device_auto();
    device.close().unwrap();
    // PowerDown goes out as part of idling the chip
    assert!(mock.sent().iter().any(|tx| tx[1] == 0x16));
}

#[test]
fn property_set_then_get_roundtrip() {
    let (mut device, _mock) = mock_pn532_device_auto();

    for &(property, value) in &[
        (Property::HandleCrc, false),
        (Property::HandleParity, false),
        (Property::InfiniteSelect, true),
        (Property::AcceptInvalidFrames, true),
        (Property::EasyFraming, false),
    ] {
        device.set_property_bool(property, value).unwrap();
        assert_eq!(device.get_property_bool(property).unwrap(), value);
    }
}

#[test]
fn rejected_write_leaves_property_unchanged() {
    // No auto-reply: the register write inside the property change fails
    let (mut device, _mock) = mock_pn532_device();

    assert!(device.get_property_bool(Property::HandleCrc).unwrap());
    assert!(device
        .set_property_bool(Property::HandleCrc, false)
        .is_err());
    assert!(device.get_property_bool(Property::HandleCrc).unwrap());
}

#[test]
fn timeout_properties_take_integers() {
    let (mut device, _mock) = mock_pn532_device_auto();
    device.set_property_int(Property::TimeoutCommand, 500).unwrap();
    device.set_property_int(Property::TimeoutAtr, 100).unwrap();
    device.set_property_int(Property::TimeoutCom, 50).unwrap();

    assert!(matches!(
        device.set_property_int(Property::HandleCrc, 1),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        device.set_property_bool(Property::TimeoutCommand, true),
        Err(Error::InvalidArgument(_))
    ));
}
