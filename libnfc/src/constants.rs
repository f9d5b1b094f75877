// libnfc-rs/libnfc/src/constants.rs
//! Common protocol constants used across the crate

/// PN53x wire frame preamble: 0x00 0x00 0xFF
pub const FRAME_PREAMBLE: [u8; 3] = [0x00, 0x00, 0xFF];

/// PN53x wire frame postamble: 0x00
pub const FRAME_POSTAMBLE: u8 = 0x00;

/// Overhead of a standard information frame around its payload
pub const FRAME_OVERHEAD: usize = 7;

/// Maximum chip-level payload carried by one frame
pub const MAX_FRAME_LEN: usize = 264;

/// Largest payload a standard (one length byte) frame can carry
pub const STD_FRAME_MAX_PAYLOAD: usize = 255;

/// Host->chip direction byte (TFI)
pub const DIR_HOST_TO_CHIP: u8 = 0xD4;
/// Chip->host direction byte (TFI)
pub const DIR_CHIP_TO_HOST: u8 = 0xD5;

/// ACK frame, emitted by the chip after every accepted command
pub const ACK_FRAME: [u8; 6] = [0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00];
/// NACK frame, emitted when the chip wants the command resent
pub const NACK_FRAME: [u8; 6] = [0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00];
/// Application-level error frame (syntax error detected by the chip)
pub const ERROR_FRAME: [u8; 8] = [0x00, 0x00, 0xFF, 0x01, 0xFF, 0x7F, 0x81, 0x00];

/// How many times a NACKed command is resent before giving up
pub const MAX_NACK_RETRIES: usize = 3;

/// Cascade tag marking a partial UID during ISO 14443-A anti-collision
pub const CASCADE_TAG: u8 = 0x88;

/// Environment variable holding the default connection string
pub const ENV_DEFAULT_DEVICE: &str = "LIBNFC_DEFAULT_DEVICE";

/// Environment variable for the demo binaries' log verbosity (0..=3)
pub const ENV_LOG_LEVEL: &str = "LIBNFC_LOG_LEVEL";

/// Upper bound on a connection string, including the driver prefix
pub const CONNSTRING_MAX_LEN: usize = 1024;
