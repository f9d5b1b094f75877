// libnfc-rs/libnfc/src/error.rs

use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("device not found")]
    DeviceNotFound,

    #[error("no driver matches connection string: {0}")]
    UnknownDriver(String),

    #[error("serial port already claimed: {0}")]
    PortClaimed(String),

    #[cfg(feature = "usb")]
    #[error("usb error: {0}")]
    Usb(#[from] rusb::Error),

    #[cfg(feature = "uart")]
    #[error("serial error: {0}")]
    Serial(#[from] serialport::Error),

    #[cfg(feature = "pcsc")]
    #[error("pcsc error: {0}")]
    Pcsc(#[from] pcsc::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation timed out")]
    Timeout,

    #[error("command aborted")]
    Aborted,

    #[error("device handle poisoned by an earlier i/o error")]
    Poisoned,

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("not supported by device: {0}")]
    NotSupported(&'static str),

    #[error("invalid frame: {0}")]
    FrameFormat(&'static str),

    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("unexpected response code: expected {expected:#04x}, got {actual:#04x}")]
    UnexpectedResponse { expected: u8, actual: u8 },

    #[error("command rejected: chip NACKed every attempt")]
    Denack,

    #[error("unexpected frame while waiting for ACK")]
    AckMismatch,

    #[error("no target detected")]
    NoTarget,

    #[error("chip status: {0}")]
    Chip(ChipError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable numeric surface: 0 success (never produced here), -1 i/o,
    /// -2 unsupported, -3 bad argument, -4 device error, positive values
    /// are chip status codes passed through.
    pub fn code(&self) -> i32 {
        match self {
            Self::Chip(e) => e.code() as i32,
            Self::NotSupported(_) => -2,
            Self::InvalidArgument(_) => -3,
            Self::Io(_) | Self::Poisoned => -1,
            #[cfg(feature = "usb")]
            Self::Usb(_) => -1,
            #[cfg(feature = "uart")]
            Self::Serial(_) => -1,
            #[cfg(feature = "pcsc")]
            Self::Pcsc(_) => -1,
            _ => -4,
        }
    }

    /// True for errors that leave the handle unusable until reopened.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Io(_) => true,
            #[cfg(feature = "usb")]
            Self::Usb(_) => true,
            #[cfg(feature = "uart")]
            Self::Serial(_) => true,
            #[cfg(feature = "pcsc")]
            Self::Pcsc(_) => true,
            _ => false,
        }
    }
}

/// Status byte reported by the PN53x in the first response byte of
/// status-coded commands (low 6 bits). Codes and wording follow the
/// chip's error table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipError(u8);

struct StatusEntry {
    code: u8,
    name: &'static str,
    description: &'static str,
}

static STATUS_TABLE: &[StatusEntry] = &[
    StatusEntry { code: 0x01, name: "timeout", description: "Time out, the target has not answered." },
    StatusEntry { code: 0x02, name: "crc error", description: "A CRC error has been detected by the CIU." },
    StatusEntry { code: 0x03, name: "parity error", description: "A parity error has been detected by the CIU." },
    StatusEntry { code: 0x04, name: "wrong bit count", description: "An erroneous bit count has been detected during anti-collision/select." },
    StatusEntry { code: 0x05, name: "framing error", description: "Framing error during MIFARE operation." },
    StatusEntry { code: 0x06, name: "bit-collision", description: "An abnormal bit-collision has been detected during bit wise anti-collision at 106 kbps." },
    StatusEntry { code: 0x07, name: "buffer too small", description: "Communication buffer size insufficient." },
    StatusEntry { code: 0x09, name: "buffer overflow", description: "RF buffer overflow has been detected by the CIU." },
    StatusEntry { code: 0x0a, name: "rf timeout", description: "The RF field has not been switched on in time by the counterpart." },
    StatusEntry { code: 0x0b, name: "rf protocol error", description: "RF protocol error." },
    StatusEntry { code: 0x0d, name: "overheating", description: "The internal temperature sensor has detected overheating; antenna drivers switched off." },
    StatusEntry { code: 0x0e, name: "internal overflow", description: "Internal buffer overflow." },
    StatusEntry { code: 0x10, name: "invalid parameter", description: "Invalid parameter." },
    StatusEntry { code: 0x12, name: "unknown command", description: "The chip in target mode does not support the command received from the initiator." },
    StatusEntry { code: 0x13, name: "invalid rx frame", description: "The data format does not match the specification." },
    StatusEntry { code: 0x14, name: "authentication failure", description: "MIFARE authentication error." },
    StatusEntry { code: 0x23, name: "wrong uid check byte", description: "ISO/IEC 14443-3: UID check byte is wrong." },
    StatusEntry { code: 0x25, name: "invalid state", description: "The system is in a state which does not allow the operation." },
    StatusEntry { code: 0x26, name: "operation not allowed", description: "Operation not allowed in this configuration." },
    StatusEntry { code: 0x27, name: "command not acceptable", description: "Command not acceptable in the current context of the chip." },
    StatusEntry { code: 0x29, name: "target released", description: "The chip configured as target has been released by its initiator." },
    StatusEntry { code: 0x2a, name: "card id mismatch", description: "The ID of the card does not match; the expected card has been exchanged with another one." },
    StatusEntry { code: 0x2b, name: "card discarded", description: "The card previously activated has disappeared." },
    StatusEntry { code: 0x2c, name: "nfcid3 mismatch", description: "Mismatch between the NFCID3 initiator and target in DEP 212/424 kbps passive." },
    StatusEntry { code: 0x2d, name: "over current", description: "An over-current event has been detected." },
    StatusEntry { code: 0x2e, name: "nad missing", description: "NAD missing in DEP frame." },
];

impl ChipError {
    /// Wrap a raw status byte (low 6 bits already masked by the caller).
    pub fn from_code(code: u8) -> Self {
        Self(code)
    }

    /// The raw chip status code.
    pub fn code(&self) -> u8 {
        self.0
    }

    /// Short name for the status, or None for codes absent from the table.
    pub fn name(&self) -> Option<&'static str> {
        STATUS_TABLE.iter().find(|e| e.code == self.0).map(|e| e.name)
    }

    /// Long-form description for the status.
    pub fn description(&self) -> Option<&'static str> {
        STATUS_TABLE
            .iter()
            .find(|e| e.code == self.0)
            .map(|e| e.description)
    }
}

impl std::fmt::Display for ChipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({:#04x})", name, self.0),
            None => write!(f, "unknown status {:#04x}", self.0),
        }
    }
}
