// libnfc-rs/libnfc/src/lib.rs

//! libnfc
//!
//! Pure Rust implementation for NFC readers built around the NXP PN53x
//! chip family (PN531, PN532, PN533). The crate drives the chip as an
//! RFID initiator (reader) against ISO/IEC 14443 A/B, FeliCa and Jewel
//! tags, or as a target (tag/peer emulator) including NFCIP DEP.
#![warn(missing_docs)]

pub mod chip;
pub mod constants;
pub mod device;
pub mod driver;
pub mod error;
pub mod prelude;
pub mod protocol;
pub mod target;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`,
// and the enums in `types` are available for consumers and for
// convenient `prelude` re-exports.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
