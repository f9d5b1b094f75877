// libnfc-rs/libnfc/src/transport/serial.rs

//! Exclusive serial port access for the UART-attached readers.
//!
//! The port is switched to raw 8-N-1 with the input queue flushed, and an
//! advisory lock file keyed on the device node keeps two processes from
//! claiming the same reader. Reads are bounded: one multiplexed wait up
//! to the timeout, then a drain of whatever the OS reports available.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::{Error, Result};

/// Baud rates the PN53x UART front-ends can actually run at.
pub const SERIAL_SPEEDS: &[u32] = &[9600, 19200, 38400, 57600, 115200, 230400, 460800];

/// Default bounded-read wait.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(30);

/// Advisory inter-process claim on a serial device. Held for the lifetime
/// of the port handle; the lock file is removed again on drop.
struct PortLock {
    path: PathBuf,
}

impl PortLock {
    fn acquire(device: &str) -> Result<Self> {
        let name = device.replace(['/', '\\'], "_");
        let path = std::env::temp_dir().join(format!("libnfc-{}.lock", name));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let _ = write!(file, "{}", std::process::id());
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(Error::PortClaimed(device.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for PortLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// An open, exclusively claimed serial port.
pub struct SerialPortHandle {
    port: Box<dyn SerialPort>,
    path: String,
    _lock: PortLock,
}

impl SerialPortHandle {
    /// Open `path` at `baud` with raw 8-N-1 settings and a flushed input
    /// queue. Fails with [`Error::PortClaimed`] when another process holds
    /// the advisory lock and [`Error::InvalidArgument`] for a baud rate
    /// outside [`SERIAL_SPEEDS`].
    pub fn open(path: &str, baud: u32) -> Result<Self> {
        if !SERIAL_SPEEDS.contains(&baud) {
            return Err(Error::InvalidArgument("unsupported baud rate"));
        }
        let lock = PortLock::acquire(path)?;
        let port = serialport::new(path, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(DEFAULT_RECEIVE_TIMEOUT)
            .open()?;
        port.clear(ClearBuffer::Input)?;
        log::debug!("serial port {} open at {} baud", path, baud);
        Ok(Self {
            port,
            path: path.to_string(),
            _lock: lock,
        })
    }

    /// Device node this handle was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Change the line speed. Only the fixed set in [`SERIAL_SPEEDS`] is
    /// accepted; anything else fails without touching the port.
    pub fn set_speed(&mut self, baud: u32) -> Result<()> {
        if !SERIAL_SPEEDS.contains(&baud) {
            return Err(Error::InvalidArgument("unsupported baud rate"));
        }
        self.port.set_baud_rate(baud)?;
        Ok(())
    }

    /// Current line speed.
    pub fn speed(&self) -> Result<u32> {
        Ok(self.port.baud_rate()?)
    }

    /// Discard any pending input.
    pub fn flush_input(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }

    /// Write the whole buffer; a short write is an error.
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    /// Wait up to `timeout` for input, then drain exactly what the OS
    /// reports available. A timeout yields [`Error::Timeout`] and no
    /// bytes.
    pub fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        self.port.set_timeout(timeout)?;
        let mut buf = vec![0u8; 256];
        let n = match self.port.read(&mut buf) {
            Ok(0) => return Err(Error::Timeout),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return Err(Error::Timeout),
            Err(e) => return Err(e.into()),
        };
        buf.truncate(n);

        let pending = self.port.bytes_to_read()? as usize;
        if pending > 0 {
            let mut rest = vec![0u8; pending];
            self.port.read_exact(&mut rest)?;
            buf.extend_from_slice(&rest);
        }
        Ok(buf)
    }
}
