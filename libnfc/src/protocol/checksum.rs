// libnfc-rs/libnfc/src/protocol/checksum.rs

/// Length checksum of a PN53x frame: LCS = 0x100 - LEN (mod 256)
pub fn lcs(len: u8) -> u8 {
    0u8.wrapping_sub(len)
}

/// Data checksum of a PN53x frame: DCS = 0x100 - (sum(payload) & 0xff)
pub fn dcs(payload: &[u8]) -> u8 {
    let sum = payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    0u8.wrapping_sub(sum)
}

/// Length checksum of an extended frame: both length bytes plus the
/// checksum sum to zero mod 256.
pub fn lcs_extended(len: u16) -> u8 {
    0u8.wrapping_sub((len >> 8) as u8).wrapping_sub(len as u8)
}
