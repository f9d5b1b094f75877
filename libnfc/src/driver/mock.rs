// libnfc-rs/libnfc/src/driver/mock.rs

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::driver::Driver;
use crate::{Error, Result};

/// Mock driver for unit tests. It records chip-level payloads and plays
/// back queued response bodies, skipping the wire framing entirely.
#[derive(Debug, Default)]
pub struct MockDriver {
    /// Chip-level payloads handed to `transceive`, direction byte included
    pub sent: Vec<Vec<u8>>,
    /// Queued response bodies (post direction byte and echo)
    pub responses: VecDeque<Vec<u8>>,
    /// Response bodies keyed by opcode; consulted before `responses`
    pub scripted: HashMap<u8, VecDeque<Vec<u8>>>,
    /// When the queues run dry, answer `[0x00]` instead of timing out
    pub auto_reply: bool,
    /// Fail the next transceive with an i/o error (poisoning tests)
    pub fail_io_once: bool,
    /// Number of abort calls observed
    pub aborts: usize,
    /// Whether close was called
    pub closed: bool,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that answers `[0x00]` whenever no scripted response is left.
    pub fn with_auto_reply() -> Self {
        Self {
            auto_reply: true,
            ..Self::default()
        }
    }

    pub fn push_response(&mut self, body: Vec<u8>) {
        self.responses.push_back(body);
    }

    /// Queue a response that is only consumed by commands with this
    /// opcode, regardless of what other traffic happens first.
    pub fn push_response_for(&mut self, opcode: u8, body: Vec<u8>) {
        self.scripted.entry(opcode).or_default().push_back(body);
    }

    /// Payloads sent so far, for assertions.
    pub fn sent_opcodes(&self) -> Vec<u8> {
        self.sent.iter().filter_map(|tx| tx.get(1).copied()).collect()
    }
}

impl Driver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn connstring(&self) -> &str {
        "mock:test"
    }

    fn transceive(&mut self, tx: &[u8], _timeout: Duration) -> Result<Vec<u8>> {
        if self.fail_io_once {
            self.fail_io_once = false;
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock i/o failure",
            )));
        }
        self.sent.push(tx.to_vec());
        if let Some(opcode) = tx.get(1) {
            if let Some(body) = self.scripted.get_mut(opcode).and_then(|q| q.pop_front()) {
                return Ok(body);
            }
        }
        match self.responses.pop_front() {
            Some(body) => Ok(body),
            None if self.auto_reply => Ok(vec![0x00]),
            None => Err(Error::Timeout),
        }
    }

    fn abort(&mut self) -> Result<()> {
        self.aborts += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
