// libnfc-rs/libnfc/src/driver/pn532_uart.rs

//! Driver for a PN532 on an asynchronous serial line (HSU).
//!
//! The chip powers up in low-power mode and ignores traffic until the
//! long-preamble wake sequence has been sent, so `open` performs the
//! wakeup before handing the port over.

use std::time::{Duration, Instant};

use crate::constants::ACK_FRAME;
use crate::driver::{
    connstring_param, frame_transceive, Driver, DriverSpec, FramePipe,
};
use crate::protocol::Frame;
use crate::transport::serial::SerialPortHandle;
use crate::{Error, Result};

pub static SPEC: DriverSpec = DriverSpec {
    name: "pn532_uart",
    probe,
    open,
};

const DEFAULT_SPEED: u32 = 115_200;

/// Fixed pacing between a command frame and the ACK read. Shorter delays
/// at high baud rates are unproven, so this stays a per-driver knob
/// rather than a baud-derived value.
pub const DEFAULT_INTER_FRAME_DELAY: Duration = Duration::from_millis(50);

/// Long preamble, then a SAMConfiguration wrapped as a normal frame: the
/// preamble clocks the chip out of low-power, the command gives it
/// something to ACK.
const WAKEUP_SEQUENCE: [u8; 15] = [
    0x55, 0x55, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x03, 0xFD, 0xD4, 0x14, 0x01, 0x17, 0x00,
];

fn probe(_max: usize) -> Vec<String> {
    // Probing would mean writing wake sequences to every serial device on
    // the host, which is not safe to do blindly. UART readers are opened
    // through an explicit connection string.
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

    let driver = Pn532UartDriver::open_path(path, speed, DEFAULT_INTER_FRAME_DELAY)?;
    Ok(Box::new(driver))
}

pub struct Pn532UartDriver {
    port: SerialPortHandle,
    connstring: String,
    inter_frame_delay: Duration,
    rxbuf: Vec<u8>,
}

impl Pn532UartDriver {
    /// Open the port, wake the chip, and keep `inter_frame_delay` as the
    /// pacing between writes and the ACK wait.
    pub fn open_path(path: &str, speed: u32, inter_frame_delay: Duration) -> Result<Self> {
        let mut port = SerialPortHandle::open(path, speed)?;

        port.send(&WAKEUP_SEQUENCE)?;
        std::thread::sleep(Duration::from_millis(10));
        // Consume the ACK and the SAMConfiguration status reply; a silent
        // chip means nothing is listening on this port.
        let woke = port.receive(Duration::from_millis(100)).is_ok();
        if !woke {
            return Err(Error::DeviceNotFound);
        }
        // Drain whatever part of the reply is still trickling in
        while port.receive(Duration::from_millis(30)).is_ok() {}

        Ok(Self {
            connstring: format!("{}:{}:{}", SPEC.name, path, speed),
            port,
            inter_frame_delay,
            rxbuf: Vec::new(),
        })
    }

    /// Adjust the inter-frame pacing.
    pub fn set_inter_frame_delay(&mut self, delay: Duration) {
        self.inter_frame_delay = delay;
    }

    fn fill_one_frame(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        loop {
            match Frame::total_len(&self.rxbuf) {
                Ok(Some(total)) if self.rxbuf.len() >= total => {
                    return Ok(self.rxbuf.drain(..total).collect());
                }
                Ok(_) => {}
                Err(e) => {
                    // Line garbage: drop the buffer so the next exchange
                    // starts clean
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

impl FramePipe for Pn532UartDriver {
    fn write_wire(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.send(bytes)
    }

    fn read_frame(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        self.fill_one_frame(timeout)
    }

    fn pacing(&self) -> Option<Duration> {
        Some(self.inter_frame_delay)
    }
}

impl Driver for Pn532UartDriver {
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
        self.port.send(&ACK_FRAME)
    }

    fn idle(&mut self) -> Result<()> {
        self.rxbuf.clear();
        self.port.flush_input()
    }
}
