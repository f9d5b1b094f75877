// libnfc-rs/libnfc/src/driver/arygon.rs

//! Driver for ARYGON readers: a PN532 fronted by a microcontroller on a
//! serial line. Commands carry a protocol selector byte before the frame
//! (TAMA binary is `'2'`); the µC answers protocol violations with short
//! ASCII error strings instead of frames.

use std::time::{Duration, Instant};

use crate::constants::ACK_FRAME;
use crate::driver::{
    connstring_param, frame_transceive, Driver, DriverSpec, FramePipe,
};
use crate::protocol::Frame;
use crate::transport::serial::SerialPortHandle;
use crate::{Error, Result};

pub static SPEC: DriverSpec = DriverSpec {
    name: "arygon",
    probe,
    open,
};

const DEFAULT_SPEED: u32 = 9_600;

/// µC pacing requirement at the default 9600 baud.
pub const DEFAULT_INTER_FRAME_DELAY: Duration = Duration::from_millis(50);

/// Protocol selector: Philips TAMA language in binary format.
const PROTOCOL_TAMA: u8 = b'2';

/// µC status strings (ASCII, CRLF-terminated).
const UC_ERROR_NONE: &[u8] = b"FF000000\r\n";

fn probe(_max: usize) -> Vec<String> {
    // Same story as pn532_uart: no blind serial probing.
    Vec::new()
}

fn open(connstring: &str) -> Result<Box<dyn Driver>> {
    let param = connstring_param(connstring, SPEC.name)
        .ok_or_else(|| Error::UnknownDriver(connstring.to_string()))?;
    if param.is_empty() {
        return Err(Error::InvalidArgument("missing serial device path"));
    }

    let (path, speed) = match param.rsplit_once(':') {
        Some((path, baud)) if baud.chars().all(|c| c.is_ascii_digit()) => (
            path,
            baud.parse::<u32>()
                .map_err(|_| Error::InvalidArgument("bad baud rate"))?,
        ),
        _ => (param, DEFAULT_SPEED),
    };

    let driver = ArygonDriver::open_path(path, speed, DEFAULT_INTER_FRAME_DELAY)?;
    Ok(Box::new(driver))
}

pub struct ArygonDriver {
    port: SerialPortHandle,
    connstring: String,
    inter_frame_delay: Duration,
    rxbuf: Vec<u8>,
}

impl ArygonDriver {
    pub fn open_path(path: &str, speed: u32, inter_frame_delay: Duration) -> Result<Self> {
        let mut port = SerialPortHandle::open(path, speed)?;
        port.flush_input()?;
        Ok(Self {
            connstring: format!("{}:{}:{}", SPEC.name, path, speed),
            port,
            inter_frame_delay,
            rxbuf: Vec::new(),
        })
    }

    /// Adjust the µC pacing.
    pub fn set_inter_frame_delay(&mut self, delay: Duration) {
        self.inter_frame_delay = delay;
    }

    /// Drop µC status chatter from the front of the buffer. A benign
    /// "no error" line is skipped; anything else is surfaced.
    fn strip_uc_noise(&mut self) -> Result<()> {
        loop {
            if self.rxbuf.first() == Some(&PROTOCOL_TAMA) {
                self.rxbuf.remove(0);
                continue;
            }
            if self.rxbuf.len() >= UC_ERROR_NONE.len()
                && self.rxbuf.starts_with(b"FF")
                && self.rxbuf[..UC_ERROR_NONE.len()].ends_with(b"\r\n")
            {
                let line: Vec<u8> = self.rxbuf.drain(..UC_ERROR_NONE.len()).collect();
                if line == UC_ERROR_NONE {
                    continue;
                }
                self.rxbuf.clear();
                return Err(Error::FrameFormat("arygon microcontroller error"));
            }
            return Ok(());
        }
    }

    fn fill_one_frame(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        loop {
            self.strip_uc_noise()?;
            match Frame::total_len(&self.rxbuf) {
                Ok(Some(total)) if self.rxbuf.len() >= total => {
                    return Ok(self.rxbuf.drain(..total).collect());
                }
                Ok(_) => {}
                Err(e) => {
                    self.rxbuf.clear();
                    return Err(e);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(Error::Timeout);
            }
            match self.port.receive(deadline - now) {
                Ok(bytes) => self.rxbuf.extend_from_slice(&bytes),
                Err(Error::Timeout) => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl FramePipe for ArygonDriver {
    fn write_wire(&mut self, bytes: &[u8]) -> Result<()> {
        let mut wire = Vec::with_capacity(bytes.len() + 1);
        wire.push(PROTOCOL_TAMA);
        wire.extend_from_slice(bytes);
        self.port.send(&wire)
    }

    fn read_frame(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        self.fill_one_frame(timeout)
    }

    fn pacing(&self) -> Option<Duration> {
        Some(self.inter_frame_delay)
    }
}

impl Driver for ArygonDriver {
    fn name(&self) -> &'static str {
        SPEC.name
    }

    fn connstring(&self) -> &str {
        &self.connstring
    }

    fn transceive(&mut self, tx: &[u8], timeout: Duration) -> Result<Vec<u8>> {
        frame_transceive(self, tx, timeout)
    }

    fn abort(&mut self) -> Result<()> {
        let mut wire = Vec::with_capacity(ACK_FRAME.len() + 1);
        wire.push(PROTOCOL_TAMA);
        wire.extend_from_slice(&ACK_FRAME);
        self.port.send(&wire)
    }

    fn idle(&mut self) -> Result<()> {
        self.rxbuf.clear();
        self.port.flush_input()
    }
}
