// libnfc-rs/libnfc/src/protocol/mod.rs

pub mod bitframe;
pub mod checksum;
pub mod frame;

pub use checksum::{dcs, lcs};
pub use frame::{Frame, FrameKind};
