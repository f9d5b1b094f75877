//! Small reusable helpers shared across the crate: hex formatting for log
//! lines and the bit-level primitives (byte mirroring, ISO 14443-A CRC)
//! that the raw-frame paths depend on.

pub mod bits;
pub mod hex;

pub use bits::*;
pub use hex::*;
