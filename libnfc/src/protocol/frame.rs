// libnfc-rs/libnfc/src/protocol/frame.rs

use crate::constants::{
    ACK_FRAME, DIR_CHIP_TO_HOST, ERROR_FRAME, FRAME_POSTAMBLE, FRAME_PREAMBLE, MAX_FRAME_LEN,
    NACK_FRAME, STD_FRAME_MAX_PAYLOAD,
};
use crate::protocol::checksum::{dcs, lcs, lcs_extended};
use crate::{Error, Result};

/// Kind of frame sitting at the start of a receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// `00 00 FF 00 FF 00`
    Ack,
    /// `00 00 FF FF 00 00`
    Nack,
    /// Application-level error frame (`01 FF 7F`)
    AppError,
    /// Standard information frame, one length byte
    Standard,
    /// Extended information frame (`FF FF` length escape), PN533 only
    Extended,
}

/// PN53x wire frame codec.
///
/// Standard layout: `00 00 FF | LEN | LCS | payload | DCS | 00` where the
/// payload starts with the direction byte (`D4` host->chip, `D5` back).
/// The extended layout escapes LEN with `FF FF` and carries a 16-bit
/// big-endian length; it is emitted only when the payload does not fit a
/// standard frame and is always accepted on receive.
pub struct Frame;

impl Frame {
    /// Encode a chip-level payload into a full wire frame.
    pub fn wrap(payload: &[u8]) -> Result<Vec<u8>> {
        if payload.is_empty() {
            return Err(Error::InvalidArgument("empty frame payload"));
        }
        if payload.len() > MAX_FRAME_LEN {
            return Err(Error::InvalidArgument("frame payload too long"));
        }

        if payload.len() <= STD_FRAME_MAX_PAYLOAD {
            let len = payload.len() as u8;
            let mut out = Vec::with_capacity(payload.len() + 7);
            out.extend_from_slice(&FRAME_PREAMBLE);
            out.push(len);
            out.push(lcs(len));
            out.extend_from_slice(payload);
            out.push(dcs(payload));
            out.push(FRAME_POSTAMBLE);
            Ok(out)
        } else {
            let len = payload.len() as u16;
            let mut out = Vec::with_capacity(payload.len() + 10);
            out.extend_from_slice(&FRAME_PREAMBLE);
            out.push(0xFF);
            out.push(0xFF);
            out.push((len >> 8) as u8);
            out.push(len as u8);
            out.push(lcs_extended(len));
            out.extend_from_slice(payload);
            out.push(dcs(payload));
            out.push(FRAME_POSTAMBLE);
            Ok(out)
        }
    }

    /// Classify the frame at the start of `buf`. Needs at least 5 bytes for
    /// information frames; ACK/NACK are recognized from their full 6 bytes.
    pub fn classify(buf: &[u8]) -> Result<FrameKind> {
        if buf.len() >= 6 && buf[..6] == ACK_FRAME {
            return Ok(FrameKind::Ack);
        }
        if buf.len() >= 6 && buf[..6] == NACK_FRAME {
            return Ok(FrameKind::Nack);
        }
        if buf.len() >= 6 && buf[..6] == ERROR_FRAME[..6] {
            return Ok(FrameKind::AppError);
        }
        if buf.len() < 5 || buf[..3] != FRAME_PREAMBLE {
            return Err(Error::FrameFormat("invalid preamble"));
        }
        if buf[3] == 0xFF && buf[4] == 0xFF {
            Ok(FrameKind::Extended)
        } else {
            Ok(FrameKind::Standard)
        }
    }

    /// Total on-wire length of the frame at the start of `buf`, or `None`
    /// when more header bytes are needed to tell. Used by the serial
    /// drivers to reassemble frames from a byte dribble.
    pub fn total_len(buf: &[u8]) -> Result<Option<usize>> {
        if buf.len() < 5 {
            return Ok(None);
        }
        match Self::classify(buf)? {
            FrameKind::Ack | FrameKind::Nack => Ok(Some(6)),
            FrameKind::AppError => Ok(Some(ERROR_FRAME.len())),
            FrameKind::Standard => Ok(Some(buf[3] as usize + 7)),
            FrameKind::Extended => {
                if buf.len() < 8 {
                    return Ok(None);
                }
                let len = ((buf[5] as usize) << 8) | buf[6] as usize;
                Ok(Some(len + 10))
            }
        }
    }

    /// Decode a full wire frame and return the chip-level payload,
    /// direction byte included. ACK/NACK/error frames are not information
    /// frames and are rejected here; route them through [`Frame::classify`].
    pub fn unwrap(frame: &[u8]) -> Result<Vec<u8>> {
        let (payload_start, len) = match Self::classify(frame)? {
            FrameKind::Ack | FrameKind::Nack => {
                return Err(Error::FrameFormat("handshake frame in data slot"))
            }
            FrameKind::AppError => {
                return Err(Error::FrameFormat("application-level error frame"))
            }
            FrameKind::Standard => {
                let len = frame[3];
                let expected = lcs(len);
                if frame[4] != expected {
                    return Err(Error::ChecksumMismatch {
                        expected,
                        actual: frame[4],
                    });
                }
                (5usize, len as usize)
            }
            FrameKind::Extended => {
                if frame.len() < 8 {
                    return Err(Error::FrameFormat("truncated extended frame"));
                }
                let len = ((frame[5] as u16) << 8) | frame[6] as u16;
                let expected = lcs_extended(len);
                if frame[7] != expected {
                    return Err(Error::ChecksumMismatch {
                        expected,
                        actual: frame[7],
                    });
                }
                (8usize, len as usize)
            }
        };

        if len == 0 || len > MAX_FRAME_LEN {
            return Err(Error::FrameFormat("frame length out of range"));
        }
        // payload + DCS + postamble must be present
        if frame.len() < payload_start + len + 2 {
            return Err(Error::FrameFormat("truncated frame"));
        }

        let payload = &frame[payload_start..payload_start + len];
        let expected = dcs(payload);
        let actual = frame[payload_start + len];
        if actual != expected {
            return Err(Error::ChecksumMismatch { expected, actual });
        }
        if frame[payload_start + len + 1] != FRAME_POSTAMBLE {
            return Err(Error::FrameFormat("invalid postamble"));
        }
        if payload[0] != DIR_CHIP_TO_HOST {
            return Err(Error::FrameFormat("wrong direction byte"));
        }

        Ok(payload.to_vec())
    }
}
