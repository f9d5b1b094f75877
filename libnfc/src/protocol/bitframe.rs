// libnfc-rs/libnfc/src/protocol/bitframe.rs

//! Interleaved-parity bit codec for raw ISO 14443-A frames.
//!
//! When the chip's parity handling is off the host supplies one parity bit
//! per data byte. On the air a frame is the data bits LSB-first with the
//! parity bit inserted after every eighth data bit. Frames shorter than 9
//! bits (the 7-bit REQA/WUPA short frames) carry no parity and travel
//! verbatim.

use crate::{Error, Result};

/// Pack a data/parity stream into air-interface bytes.
///
/// `data_bits` is the number of valid data bits (the last byte of `data`
/// may be partial); `parity` holds one bit (LSB) per complete data byte.
/// Returns the packed bytes and the total bit count on the air.
pub fn wrap_bits(data: &[u8], data_bits: usize, parity: &[u8]) -> Result<(Vec<u8>, usize)> {
    if data_bits == 0 {
        return Err(Error::InvalidArgument("empty bit frame"));
    }
    if data.len() < (data_bits + 7) / 8 {
        return Err(Error::InvalidArgument("bit count exceeds data buffer"));
    }

    // Short frames bypass parity packing entirely.
    if data_bits < 9 {
        return Ok((vec![data[0]], data_bits));
    }

    if parity.len() < data_bits / 8 {
        return Err(Error::InvalidArgument("missing parity bits"));
    }

    let frame_bits = data_bits + data_bits / 8;
    let mut out = vec![0u8; (frame_bits + 7) / 8];
    let mut pos = 0usize;
    let mut set = |out: &mut [u8], pos: &mut usize, bit: bool| {
        if bit {
            out[*pos / 8] |= 1 << (*pos % 8);
        }
        *pos += 1;
    };

    for (i, &byte) in data.iter().enumerate() {
        let remaining = data_bits - i * 8;
        if remaining == 0 {
            break;
        }
        let take = remaining.min(8);
        for j in 0..take {
            set(&mut out, &mut pos, (byte >> j) & 1 == 1);
        }
        if take == 8 {
            set(&mut out, &mut pos, parity[i] & 1 == 1);
        }
    }

    debug_assert_eq!(pos, frame_bits);
    Ok((out, frame_bits))
}

/// Inverse of [`wrap_bits`]: peel the parity bit after every eight data
/// bits and reassemble data bytes. Returns (data, data_bits, parity).
pub fn unwrap_bits(frame: &[u8], frame_bits: usize) -> Result<(Vec<u8>, usize, Vec<u8>)> {
    if frame_bits == 0 {
        return Err(Error::InvalidArgument("empty bit frame"));
    }
    if frame.len() < (frame_bits + 7) / 8 {
        return Err(Error::InvalidArgument("bit count exceeds frame buffer"));
    }

    if frame_bits < 9 {
        return Ok((vec![frame[0]], frame_bits, Vec::new()));
    }

    let data_bits = frame_bits - frame_bits / 9;
    let mut data = vec![0u8; (data_bits + 7) / 8];
    let mut parity = Vec::with_capacity(data_bits / 8);
    let mut pos = 0usize;
    let mut next = |pos: &mut usize| {
        let bit = (frame[*pos / 8] >> (*pos % 8)) & 1 == 1;
        *pos += 1;
        bit
    };

    let mut produced = 0usize;
    while produced < data_bits {
        let take = (data_bits - produced).min(8);
        for j in 0..take {
            if next(&mut pos) {
                data[produced / 8] |= 1 << j;
            }
        }
        produced += take;
        if take == 8 {
            parity.push(next(&mut pos) as u8);
        }
    }

    debug_assert_eq!(pos, frame_bits);
    Ok((data, data_bits, parity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_frame_is_verbatim() {
        // 7-bit REQA
        let (frame, bits) = wrap_bits(&[0x26], 7, &[]).unwrap();
        assert_eq!(frame, vec![0x26]);
        assert_eq!(bits, 7);

        let (data, data_bits, parity) = unwrap_bits(&frame, bits).unwrap();
        assert_eq!(data, vec![0x26]);
        assert_eq!(data_bits, 7);
        assert!(parity.is_empty());
    }

    #[test]
    fn one_byte_with_parity() {
        let (frame, bits) = wrap_bits(&[0xFF], 8, &[0]).unwrap();
        assert_eq!(bits, 9);
        // Eight ones then a zero parity bit, LSB-first packing
        assert_eq!(frame, vec![0xFF, 0x00]);

        let (frame, _) = wrap_bits(&[0xFF], 8, &[1]).unwrap();
        assert_eq!(frame, vec![0xFF, 0x01]);
    }

    #[test]
    fn frame_bit_count() {
        let (_, bits) = wrap_bits(&[0x12, 0x34], 16, &[1, 0]).unwrap();
        assert_eq!(bits, 18);
        let (_, bits) = wrap_bits(&[0x12, 0x04], 12, &[1]).unwrap();
        assert_eq!(bits, 13);
    }

    #[test]
    fn missing_parity_rejected() {
        assert!(matches!(
            wrap_bits(&[0x12, 0x34], 16, &[1]),
            Err(Error::InvalidArgument(_))
        ));
    }

    proptest! {
        #[test]
        fn wrap_unwrap_roundtrip(
            data in prop::collection::vec(any::<u8>(), 1..32),
            parity_bits in prop::collection::vec(any::<bool>(), 32),
        ) {
            let data_bits = data.len() * 8;
            let parity: Vec<u8> = parity_bits.iter().take(data.len()).map(|&b| b as u8).collect();

            let (frame, frame_bits) = wrap_bits(&data, data_bits, &parity).unwrap();
            let (out, out_bits, out_parity) = unwrap_bits(&frame, frame_bits).unwrap();

            prop_assert_eq!(out, data);
            prop_assert_eq!(out_bits, data_bits);
            prop_assert_eq!(out_parity, parity);
        }

        #[test]
        fn partial_trailing_byte_roundtrip(
            data in prop::collection::vec(any::<u8>(), 2..16),
            parity_bits in prop::collection::vec(any::<bool>(), 16),
            tail in 1usize..8,
        ) {
            let mut data = data;
            let data_bits = (data.len() - 1) * 8 + tail;
            // Mask bits beyond the advertised count; they are not carried.
            let last = data.len() - 1;
            data[last] &= (1u8 << tail) - 1;
            let parity: Vec<u8> = parity_bits.iter().take(data.len() - 1).map(|&b| b as u8).collect();

            let (frame, frame_bits) = wrap_bits(&data, data_bits, &parity).unwrap();
            let (out, out_bits, out_parity) = unwrap_bits(&frame, frame_bits).unwrap();

            prop_assert_eq!(out, data);
            prop_assert_eq!(out_bits, data_bits);
            prop_assert_eq!(out_parity, parity);
        }
    }
}
