// libnfc-rs/libnfc/src/transport/mod.rs

//! Physical transports: exclusive serial ports and PN53x USB endpoint
//! pairs. The driver layer composes these with the frame codec.

#[cfg(feature = "uart")]
pub mod serial;
#[cfg(feature = "usb")]
pub mod usb;

#[cfg(feature = "uart")]
pub use serial::SerialPortHandle;
#[cfg(feature = "usb")]
pub use usb::{UsbCandidate, UsbEndpoints, UsbPortInfo};
