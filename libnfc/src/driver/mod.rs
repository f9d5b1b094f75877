// libnfc-rs/libnfc/src/driver/mod.rs

//! Transport polymorphism.
//!
//! A [`Driver`] carries chip-level payloads (`D4 …` out, post-echo body
//! back) over one physical transport. Each implementation owns its
//! envelope, the ACK/NACK handshake and the direction-byte stripping; the
//! shared pieces live in [`frame_transceive`] so the framed transports
//! differ only in their byte pipe and pacing.

pub mod mock;

#[cfg(feature = "pcsc")]
pub mod acr122;
#[cfg(feature = "uart")]
pub mod arygon;
#[cfg(feature = "uart")]
pub mod pn532_uart;
#[cfg(feature = "usb")]
pub mod pn53x_usb;

use std::time::Duration;

use crate::constants::{DIR_HOST_TO_CHIP, MAX_NACK_RETRIES};
use crate::protocol::{Frame, FrameKind};
use crate::{Error, Result};

/// One claimed transport, speaking chip-level payloads.
pub trait Driver: Send {
    /// Registry name of the driver that produced this handle.
    fn name(&self) -> &'static str;

    /// Connection string that reopens this exact device.
    fn connstring(&self) -> &str;

    /// Send a chip-level payload (starting with the `D4` direction byte)
    /// and return the response body with `D5` and the opcode echo already
    /// stripped.
    fn transceive(&mut self, tx: &[u8], timeout: Duration) -> Result<Vec<u8>>;

    /// Best-effort interruption of a blocking command.
    fn abort(&mut self) -> Result<()>;

    /// Drop transport-level activity before close.
    fn idle(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release the transport.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Immutable per-transport descriptor in the registry.
pub struct DriverSpec {
    pub name: &'static str,
    /// Enumerate reachable devices, up to the cap, as connection strings.
    pub probe: fn(usize) -> Vec<String>,
    /// Claim the device a connection string describes.
    pub open: fn(&str) -> Result<Box<dyn Driver>>,
}

/// Registry of built-in drivers, in probe order.
pub fn registry() -> Vec<&'static DriverSpec> {
    #[allow(unused_mut)]
    let mut drivers: Vec<&'static DriverSpec> = Vec::new();
    #[cfg(feature = "usb")]
    drivers.push(&pn53x_usb::SPEC);
    #[cfg(feature = "pcsc")]
    drivers.push(&acr122::SPEC);
    #[cfg(feature = "uart")]
    drivers.push(&pn532_uart::SPEC);
    #[cfg(feature = "uart")]
    drivers.push(&arygon::SPEC);
    drivers
}

/// Select a driver by the `name:` prefix of a connection string.
pub fn find_driver(connstring: &str) -> Option<&'static DriverSpec> {
    let prefix = connstring.split(':').next().unwrap_or(connstring);
    registry().into_iter().find(|spec| spec.name == prefix)
}

/// The part of a connection string after the driver name.
pub fn connstring_param<'a>(connstring: &'a str, driver_name: &str) -> Option<&'a str> {
    let rest = connstring.strip_prefix(driver_name)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix(':')
    }
}

/// Byte pipe under a framed transport: how to push wire bytes out and
/// pull one complete frame back. `pacing` is the transport's mandatory
/// inter-frame delay.
pub trait FramePipe {
    fn write_wire(&mut self, bytes: &[u8]) -> Result<()>;
    fn read_frame(&mut self, timeout: Duration) -> Result<Vec<u8>>;
    fn pacing(&self) -> Option<Duration> {
        None
    }
}

/// Wait on the ACK slot, bounded separately from the response wait.
pub const ACK_TIMEOUT: Duration = Duration::from_secs(1);

/// Shared command discipline of the framed transports: wrap, write,
/// consume the ACK (retrying a NACKed command a bounded number of
/// times), then read and unwrap the response frame.
pub fn frame_transceive(
    pipe: &mut dyn FramePipe,
    tx: &[u8],
    timeout: Duration,
) -> Result<Vec<u8>> {
    if tx.first() != Some(&DIR_HOST_TO_CHIP) {
        return Err(Error::InvalidArgument("payload lacks direction byte"));
    }
    let wire = Frame::wrap(tx)?;

    let mut attempt = 0;
    loop {
        attempt += 1;
        pipe.write_wire(&wire)?;
        if let Some(delay) = pipe.pacing() {
            std::thread::sleep(delay);
        }

        let ack = pipe.read_frame(ACK_TIMEOUT)?;
        match Frame::classify(&ack)? {
            FrameKind::Ack => break,
            FrameKind::Nack if attempt < MAX_NACK_RETRIES => {
                log::debug!("chip NACKed, resending (attempt {})", attempt + 1);
                continue;
            }
            FrameKind::Nack => return Err(Error::Denack),
            _ => return Err(Error::AckMismatch),
        }
    }

    let frame = pipe.read_frame(timeout)?;
    let payload = match Frame::classify(&frame)? {
        FrameKind::Standard | FrameKind::Extended => Frame::unwrap(&frame)?,
        FrameKind::AppError => return Err(Error::FrameFormat("application-level error frame")),
        FrameKind::Ack | FrameKind::Nack => {
            return Err(Error::FrameFormat("handshake frame in data slot"))
        }
    };
    strip_echo(tx[1], &payload)
}

/// Validate the `opcode + 1` echo of an unwrapped response payload
/// (direction byte already checked) and return the body after it.
pub fn strip_echo(opcode: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() < 2 {
        return Err(Error::FrameFormat("response too short"));
    }
    let expected = opcode.wrapping_add(1);
    if payload[1] != expected {
        return Err(Error::UnexpectedResponse {
            expected,
            actual: payload[1],
        });
    }
    Ok(payload[2..].to_vec())
}
