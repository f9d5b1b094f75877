#[path = "../common/mod.rs"]
mod common;

use libnfc::constants::{ACK_FRAME, NACK_FRAME};
use libnfc::protocol::{Frame, FrameKind};

#[test]
fn get_firmware_version_on_the_wire() {
    let frame = Frame::wrap(&[0xD4, 0x02]).unwrap();
    assert_eq!(
        frame,
        vec![0x00, 0x00, 0xFF, 0x02, 0xFE, 0xD4, 0x02, 0x2A, 0x00]
    );
}

#[test]
fn ack_then_firmware_response() {
    // An ACK followed by the response, as they arrive off the wire
    let stream: Vec<u8> = ACK_FRAME
        .iter()
        .copied()
        .chain([
            0x00, 0x00, 0xFF, 0x06, 0xFA, 0xD5, 0x03, 0x32, 0x01, 0x06, 0x07, 0xE8, 0x00,
        ])
        .collect();

    assert_eq!(Frame::classify(&stream).unwrap(), FrameKind::Ack);
    let ack_len = Frame::total_len(&stream).unwrap().unwrap();
    assert_eq!(ack_len, 6);

    let rest = &stream[ack_len..];
    assert_eq!(Frame::classify(rest).unwrap(), FrameKind::Standard);
    let payload = Frame::unwrap(rest).unwrap();
    assert_eq!(payload, vec![0xD5, 0x03, 0x32, 0x01, 0x06, 0x07]);
}

#[test]
fn nack_is_not_an_ack() {
    assert_eq!(Frame::classify(&NACK_FRAME).unwrap(), FrameKind::Nack);
}

#[test]
fn fixture_frames_roundtrip() {
    let body = common::fixtures::pn532_firmware_body();
    let frame = common::fixtures::response_frame(&body);
    let payload = Frame::unwrap(&frame).unwrap();
    assert_eq!(&payload[1..], &body[..]);
}

#[test]
fn extended_frame_recognized_on_receive() {
    let mut payload = vec![0xD5, 0x87];
    payload.extend_from_slice(&vec![0xA5; 300]);
    let frame = Frame::wrap(&payload).unwrap();
    assert_eq!(Frame::classify(&frame).unwrap(), FrameKind::Extended);
    assert_eq!(Frame::unwrap(&frame).unwrap(), payload);
}

#[test]
fn standard_frame_emitted_below_256_bytes() {
    let payload = vec![0xD5; 255];
    let frame = Frame::wrap(&payload).unwrap();
    assert_eq!(Frame::classify(&frame).unwrap(), FrameKind::Standard);
    assert_eq!(frame.len(), payload.len() + 7);
}
