#[path = "../common/mod.rs"]
mod common;

use std::time::Duration;

use common::fixtures::*;
use libnfc::{Error, Iso14443aTarget, JewelTarget, Property, Target};

fn emulated_mifare() -> Target {
    Target::Iso14443a(Iso14443aTarget {
        atqa: [0x00, 0x04],
        sak: 0x20,
        uid: vec![0x08, 0xAB, 0xCD, 0xEF],
        ats: Vec::new(),
    })
}

#[test]
fn target_init_blocks_until_first_command() {
    let (mut device, mock) = mock_pn532_device_auto();
    // Activation reply: mode byte, then the initiator's first command
    mock.push_response_for(0x8C, vec![0x04, 0x60, 0x00, 0x01, 0x02, 0x03, 0x04]);

    let (first_command, mode) = device
        .target_init(&emulated_mifare(), Duration::from_secs(5))
        .unwrap();
    assert_eq!(mode, 0x04);
    assert_eq!(first_command, vec![0x60, 0x00, 0x01, 0x02, 0x03, 0x04]);

    let sent = mock.sent();
    let cmd = sent.last().unwrap();
    assert_eq!(cmd[1], 0x8C);
    // PICC-only mode, SENS_RES LSB first, UID bytes 1..3, SEL_RES
    assert_eq!(cmd[2], 0x04);
    assert_eq!(&cmd[3..9], &[0x04, 0x00, 0xAB, 0xCD, 0xEF, 0x20]);
    // NFCID3 slot zeroed, no general bytes, no historical bytes
    assert_eq!(&cmd[27..], &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn target_init_applies_emulation_config() {
    let (mut device, mock) = mock_pn532_device_auto();
    mock.push_response_for(0x8C, vec![0x04, 0x26]);

    device
        .target_init(&emulated_mifare(), Duration::from_secs(5))
        .unwrap();

    // Easy framing must have been dropped for raw emulation
    assert!(!device.get_property_bool(Property::EasyFraming).unwrap());
    assert!(!device.get_property_bool(Property::ActivateField).unwrap());

    // An ISO14443-4 capable SAK turns the PICC parameter bit on
    let sent = mock.sent();
    let set_params: Vec<&Vec<u8>> = sent.iter().filter(|tx| tx[1] == 0x12).collect();
    assert!(!set_params.is_empty());
    assert_ne!(set_params.last().unwrap()[2] & 0x20, 0);
}

#[test]
fn target_init_rejects_jewel_emulation() {
    let (mut device, _mock) = mock_pn532_device_auto();
    let jewel = Target::Jewel(JewelTarget {
        sens_res: [0x00, 0x0C],
        id: [1, 2, 3, 4],
    });
    match device.target_init(&jewel, Duration::from_secs(1)) {
        Err(Error::NotSupported(_)) => {}
        other => panic!("expected not supported, got {:?}", other),
    }
}

#[test]
fn target_send_receive_raw_frames() {
    let (mut device, mock) = mock_pn532_device_auto();
    mock.push_response_for(0x8C, vec![0x04, 0x26]);
    device
        .target_init(&emulated_mifare(), Duration::from_secs(5))
        .unwrap();

    // Easy framing is off after target_init: raw opcodes are used
    mock.push_response_for(0x90, vec![0x00]);
    device
        .target_send_bytes(&[0x04, 0x00], Duration::from_secs(1))
        .unwrap();
    assert_eq!(mock.sent().last().unwrap()[1], 0x90);

    mock.push_response_for(0x88, vec![0x00, 0x30, 0x04]);
    let rx = device.target_receive_bytes(Duration::from_secs(1)).unwrap();
    assert_eq!(rx, vec![0x30, 0x04]);
    assert_eq!(mock.sent().last().unwrap()[1], 0x88);
}

#[test]
fn target_send_receive_dep_frames() {
    let (mut device, mock) = mock_pn532_device_auto();
    // Easy framing on: DEP data path through TgSetData/TgGetData
    device.set_property_bool(Property::EasyFraming, true).unwrap();

    mock.push_response_for(0x8E, vec![0x00]);
    device
        .target_send_bytes(&[0xD4, 0x06], Duration::from_secs(1))
        .unwrap();
    assert_eq!(mock.sent().last().unwrap()[1], 0x8E);

    mock.push_response_for(0x86, vec![0x00, 0xAA]);
    let rx = device.target_receive_bytes(Duration::from_secs(1)).unwrap();
    assert_eq!(rx, vec![0xAA]);
    assert_eq!(mock.sent().last().unwrap()[1], 0x86);
}

#[test]
fn target_status_reports_state_and_baud() {
    let (mut device, mock) = mock_pn532_device();
    mock.push_response(vec![0x01, 0x00]);
    let (state, baud) = device.target_status().unwrap();
    assert_eq!(state, 0x01);
    assert_eq!(baud, 0x00);
    assert_eq!(mock.sent().last().unwrap(), &vec![0xD4, 0x8A]);
}

#[test]
fn general_bytes_length_is_bounded() {
    let (mut device, _mock) = mock_pn532_device_auto();
    let too_long = vec![0u8; 48];
    assert!(matches!(
        device.target_set_general_bytes(&too_long),
        Err(Error::InvalidArgument(_))
    ));
}
