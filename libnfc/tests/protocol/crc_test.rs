use libnfc::utils::bits::{append_crc_a, check_crc_a, crc_a, mirror};

#[test]
fn hlta_trailer() {
    // The HLTA frame is specified with its CRC: 50 00 57 CD
    assert_eq!(crc_a(&[0x50, 0x00]), [0x57, 0xCD]);
}

#[test]
fn anticollision_select_trailer() {
    assert_eq!(crc_a(&[0x93, 0x20]), [0x97, 0x0C]);
}

#[test]
fn appended_crc_verifies_to_zero() {
    let mut frame = vec![0x30, 0x04]; // MIFARE read block 4
    append_crc_a(&mut frame);
    assert!(check_crc_a(&frame));
    assert_eq!(crc_a(&frame), [0x00, 0x00]);
}

#[test]
fn corrupted_byte_breaks_the_check() {
    let mut frame = vec![0x30, 0x04];
    append_crc_a(&mut frame);
    frame[0] ^= 0x40;
    assert!(!check_crc_a(&frame));
}

#[test]
fn mirror_is_an_involution() {
    for b in 0u8..=255 {
        assert_eq!(mirror(mirror(b)), b);
    }
}
