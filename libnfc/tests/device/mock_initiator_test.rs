#[path = "../common/mod.rs"]
mod common;

use common::fixtures::*;
use libnfc::{BaudRate, Error, Modulation, ModulationType, Target};

fn mod_a() -> Modulation {
    Modulation::new(ModulationType::Iso14443a, BaudRate::B106)
}

#[test]
fn select_passive_target_decodes_mifare() {
    let (mut device, mock) = mock_pn532_device();
    mock.push_response(inlist_iso14443a_body(&[0xDE, 0xAD, 0xBE, 0xEF]));

    let target = device.select_passive_target(mod_a(), None).unwrap();
    match target {
        Target::Iso14443a(t) => {
            assert_eq!(t.atqa, [0x44, 0x00]);
            assert_eq!(t.sak, 0x08);
            assert_eq!(t.uid, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        }
        other => panic!("unexpected target: {:?}", other),
    }

    // The command on the wire: InListPassiveTarget, one target, 106A
    let sent = mock.sent();
    assert_eq!(sent.last().unwrap(), &vec![0xD4, 0x4A, 0x01, 0x00]);
}

#[test]
fn select_passive_pn531_swaps_atqa() {
    let (mut device, mock) = mock_pn531_device();
    // Raw payload carries ATQA 44 03
    mock.push_response(vec![0x01, 0x01, 0x44, 0x03, 0x08, 0x04, 0xAA, 0xBB, 0xCC, 0xDD]);

    match device.select_passive_target(mod_a(), None).unwrap() {
        Target::Iso14443a(t) => {
            assert_eq!(t.atqa, [0x03, 0x44]);
            assert_eq!(t.uid, vec![0xAA, 0xBB, 0xCC, 0xDD]);
        }
        other => panic!("unexpected target: {:?}", other),
    }
}

#[test]
fn select_with_uid_cascades_init_data() {
    let (mut device, mock) = mock_pn532_device();
    mock.push_response(inlist_iso14443a_body(&[1, 2, 3, 4]));

    let uid = [0x04, 0x5A, 0x6B, 0x31, 0xC2, 0x85, 0x99];
    device.select_passive_target(mod_a(), Some(&uid)).unwrap();

    let sent = mock.sent();
    let cmd = sent.last().unwrap();
    // Cascade tag re-inserted in front of the 7-byte UID, after the BrTy
    assert_eq!(&cmd[4..], &[0x88, 0x04, 0x5A, 0x6B, 0x31, 0xC2, 0x85, 0x99]);
}

#[test]
fn select_no_target_reports_cleanly() {
    let (mut device, mock) = mock_pn532_device();
    mock.push_response(inlist_empty_body());

    match device.select_passive_target(mod_a(), None) {
        Err(Error::NoTarget) => {}
        other => panic!("expected no target, got {:?}", other),
    }
    // No target is not a fatal condition; the handle stays usable
    mock.push_response(inlist_iso14443a_body(&[1, 2, 3, 4]));
    assert!(device.select_passive_target(mod_a(), None).is_ok());
}

#[test]
fn unsupported_modulation_fails_without_traffic() {
    let (mut device, mock) = mock_pn532_device();
    let before = mock.sent().len();

    let bad = Modulation::new(ModulationType::Felica, BaudRate::B106);
    match device.select_passive_target(bad, None) {
        Err(Error::NotSupported(_)) => {}
        other => panic!("expected not supported, got {:?}", other),
    }
    assert_eq!(mock.sent().len(), before);
    assert_eq!(device.last_error_code(), -2);
}

#[test]
fn iso14443b_needs_pn532_or_later() {
    let (mut device, _mock) = mock_pn531_device();
    let b = Modulation::new(ModulationType::Iso14443b, BaudRate::B106);
    assert!(matches!(
        device.select_passive_target(b, None),
        Err(Error::NotSupported(_))
    ));
}

#[test]
fn list_passive_targets_stops_on_duplicate() {
    let (mut device, mock) = mock_pn532_device();
    // InfiniteSelect off (RFConfiguration ack), then two selects with a
    // deselect in between; the second select cycles the same card
    mock.push_response(vec![]); // RFConfiguration
    mock.push_response(inlist_iso14443a_body(&[1, 2, 3, 4]));
    mock.push_response(vec![0x00]); // InDeselect status
    mock.push_response(inlist_iso14443a_body(&[1, 2, 3, 4]));

    let targets = device.list_passive_targets(mod_a(), 8).unwrap();
    assert_eq!(targets.len(), 1);
}

#[test]
fn list_passive_targets_collects_distinct_cards() {
    let (mut device, mock) = mock_pn532_device();
    mock.push_response(vec![]); // RFConfiguration
    mock.push_response(inlist_iso14443a_body(&[1, 2, 3, 4]));
    mock.push_response(vec![0x00]);
    mock.push_response(inlist_iso14443a_body(&[5, 6, 7, 8]));
    mock.push_response(vec![0x00]);
    // Field cycles back to the first card
    mock.push_response(inlist_iso14443a_body(&[1, 2, 3, 4]));

    let targets = device.list_passive_targets(mod_a(), 8).unwrap();
    assert_eq!(targets.len(), 2);
}

#[test]
fn list_passive_targets_felica_is_single_shot() {
    let (mut device, mock) = mock_pn532_device();
    mock.push_response(vec![]); // RFConfiguration
    let mut body = vec![0x01, 0x01, 18, 0x01];
    body.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
    body.extend_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
    mock.push_response(body);

    let felica = Modulation::new(ModulationType::Felica, BaudRate::B212);
    let targets = device.list_passive_targets(felica, 8).unwrap();
    assert_eq!(targets.len(), 1);
    // One RFConfiguration, one firmware probe, one InListPassiveTarget:
    // no deselect was attempted
    assert!(mock.sent().iter().all(|tx| tx[1] != 0x44));
}

#[test]
fn poll_target_maps_to_autopoll() {
    let (mut device, mock) = mock_pn532_device();
    // One hit: type 0x10, then the usual type A entry
    let mut body = vec![0x01, 0x10, 0x09, 0x01, 0x44, 0x00, 0x08, 0x04];
    body.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    mock.push_response(body);

    let hit = device
        .poll_target(&[mod_a()], 2, 2)
        .unwrap()
        .expect("target");
    assert_eq!(hit.0.modulation_type, ModulationType::Iso14443a);

    let sent = mock.sent();
    assert_eq!(sent.last().unwrap(), &vec![0xD4, 0x60, 0x02, 0x02, 0x10]);
}

#[test]
fn poll_target_rejects_bad_arguments() {
    let (mut device, _mock) = mock_pn532_device();
    assert!(matches!(
        device.poll_target(&[mod_a()], 0, 2),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        device.poll_target(&[mod_a()], 1, 16),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        device.poll_target(&[], 1, 2),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn transceive_bytes_uses_easy_framing() {
    let (mut device, mock) = mock_pn532_device();
    // InDataExchange status + response data
    mock.push_response(vec![0x00, 0x12, 0x34]);

    let rx = device.transceive_bytes(&[0x30, 0x04], None).unwrap();
    assert_eq!(rx, vec![0x12, 0x34]);

    let sent = mock.sent();
    assert_eq!(sent.last().unwrap(), &vec![0xD4, 0x40, 0x01, 0x30, 0x04]);
}

#[test]
fn transceive_bytes_chip_error_surfaces() {
    let (mut device, mock) = mock_pn532_device();
    // MIFARE authentication failure
    mock.push_response(vec![0x14]);

    match device.transceive_bytes(&[0x60, 0x00], None) {
        Err(Error::Chip(e)) => assert_eq!(e.code(), 0x14),
        other => panic!("expected chip error, got {:?}", other),
    }
    assert_eq!(device.last_error_code(), 0x14);
}

#[test]
fn abort_reaches_the_driver() {
    let (mut device, mock) = mock_pn532_device();
    device.abort_command().unwrap();
    assert_eq!(mock.aborts(), 1);
}

#[test]
fn deselect_sends_in_deselect() {
    let (mut device, mock) = mock_pn532_device();
    mock.push_response(vec![0x00]);
    device.deselect_target().unwrap();
    assert_eq!(mock.sent().last().unwrap(), &vec![0xD4, 0x44, 0x00]);
}

#[test]
fn initiator_init_runs_the_canonical_sequence() {
    let (mut device, mock) = mock_pn532_device_auto();
    device.initiator_init().unwrap();

    let opcodes: Vec<u8> = mock.sent().iter().map(|tx| tx[1]).collect();
    // SAMConfiguration first on a PN532
    assert_eq!(opcodes[1], 0x14);
    // Field drop and raise through RFConfiguration
    assert!(opcodes.iter().filter(|&&op| op == 0x32).count() >= 3);
    // CRC/parity were already chip-handled, so no register churn for
    // them, but the Crypto1 disable touches CIU_Status2
    assert!(opcodes.contains(&0x06));
    assert!(opcodes.contains(&0x08));
}
