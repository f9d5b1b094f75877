use libnfc::protocol::bitframe::{unwrap_bits, wrap_bits};

#[test]
fn reqa_short_frame_is_verbatim() {
    // The 7-bit REQA of ISO 14443-A anti-collision: no parity, no
    // padding to a byte boundary
    let (frame, bits) = wrap_bits(&[0x26], 7, &[]).unwrap();
    assert_eq!(frame, vec![0x26]);
    assert_eq!(bits, 7);
}

#[test]
fn wupa_short_frame_is_verbatim() {
    let (frame, bits) = wrap_bits(&[0x52], 7, &[]).unwrap();
    assert_eq!(frame, vec![0x52]);
    assert_eq!(bits, 7);
}

#[test]
fn anticollision_frame_with_parity() {
    // SEL + NVB with odd parity bits, as a reader without chip parity
    // support would transmit them
    let data = [0x93, 0x20];
    let parity = [1, 1];
    let (frame, frame_bits) = wrap_bits(&data, 16, &parity).unwrap();
    assert_eq!(frame_bits, 18);

    let (out, out_bits, out_parity) = unwrap_bits(&frame, frame_bits).unwrap();
    assert_eq!(out, data);
    assert_eq!(out_bits, 16);
    assert_eq!(out_parity, parity);
}

#[test]
fn parity_bit_lands_after_each_data_byte() {
    // All-zero data with parity 1: the only set bits on the air are the
    // ninth of each nine-bit group
    let (frame, frame_bits) = wrap_bits(&[0x00, 0x00], 16, &[1, 1]).unwrap();
    assert_eq!(frame_bits, 18);
    // Bit 8 and bit 17, LSB-first packing
    assert_eq!(frame, vec![0x00, 0x01, 0x02]);
}

#[test]
fn ten_byte_uid_exchange_roundtrip() {
    let data: Vec<u8> = (0u8..10).map(|i| i.wrapping_mul(37)).collect();
    let parity: Vec<u8> = data.iter().map(|b| (b.count_ones() as u8 + 1) & 1).collect();
    let (frame, frame_bits) = wrap_bits(&data, 80, &parity).unwrap();
    assert_eq!(frame_bits, 90);

    let (out, out_bits, out_parity) = unwrap_bits(&frame, frame_bits).unwrap();
    assert_eq!(out, data);
    assert_eq!(out_bits, 80);
    assert_eq!(out_parity, parity);
}
