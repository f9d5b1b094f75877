// fixtures.rs - commonly used payloads, frames and mock-device builders

use std::sync::{Arc, Mutex};
use std::time::Duration;

use libnfc::driver::mock::MockDriver;
use libnfc::driver::Driver;
use libnfc::protocol::Frame;
use libnfc::{Device, Result};

/// GetFirmwareVersion body of a PN532 v1.6.
pub fn pn532_firmware_body() -> Vec<u8> {
    vec![0x32, 0x01, 0x06, 0x07]
}

/// GetFirmwareVersion body of a PN531 (bare two-byte version).
pub fn pn531_firmware_body() -> Vec<u8> {
    vec![0x01, 0x02]
}

/// Full wire frame around a chip->host payload.
pub fn response_frame(body: &[u8]) -> Vec<u8> {
    let mut payload = vec![0xD5];
    payload.extend_from_slice(body);
    Frame::wrap(&payload).unwrap()
}

/// InListPassiveTarget body for one ISO14443-A target with a 4-byte UID.
pub fn inlist_iso14443a_body(uid: &[u8; 4]) -> Vec<u8> {
    let mut body = vec![0x01, 0x01, 0x44, 0x00, 0x08, 0x04];
    body.extend_from_slice(uid);
    body
}

/// InListPassiveTarget body reporting no target.
pub fn inlist_empty_body() -> Vec<u8> {
    vec![0x00]
}

/// A mock driver that can still be scripted and inspected after the
/// device has taken ownership.
#[derive(Clone)]
pub struct SharedMock(pub Arc<Mutex<MockDriver>>);

impl SharedMock {
    pub fn new(mock: MockDriver) -> Self {
        Self(Arc::new(Mutex::new(mock)))
    }

    pub fn push_response(&self, body: Vec<u8>) {
        self.0.lock().unwrap().push_response(body);
    }

    pub fn push_response_for(&self, opcode: u8, body: Vec<u8>) {
        self.0.lock().unwrap().push_response_for(opcode, body);
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.0.lock().unwrap().sent.clone()
    }

    pub fn aborts(&self) -> usize {
        self.0.lock().unwrap().aborts
    }
}

impl Driver for SharedMock {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn connstring(&self) -> &str {
        "mock:test"
    }

    fn transceive(&mut self, tx: &[u8], timeout: Duration) -> Result<Vec<u8>> {
        self.0.lock().unwrap().transceive(tx, timeout)
    }

    fn abort(&mut self) -> Result<()> {
        self.0.lock().unwrap().abort()
    }

    fn close(&mut self) -> Result<()> {
        self.0.lock().unwrap().close()
    }
}

/// A PN532 device over a scripted mock, plus the handle to the script.
pub fn mock_pn532_device() -> (Device, SharedMock) {
    let mut mock = MockDriver::new();
    mock.push_response(pn532_firmware_body());
    let shared = SharedMock::new(mock);
    let device = Device::from_driver(Box::new(shared.clone())).unwrap();
    (device, shared)
}

/// Same, with every unscripted command answered `[0x00]`.
pub fn mock_pn532_device_auto() -> (Device, SharedMock) {
    let mut mock = MockDriver::with_auto_reply();
    mock.push_response(pn532_firmware_body());
    let shared = SharedMock::new(mock);
    let device = Device::from_driver(Box::new(shared.clone())).unwrap();
    (device, shared)
}

/// A PN531 device over a scripted mock.
pub fn mock_pn531_device() -> (Device, SharedMock) {
    let mut mock = MockDriver::new();
    mock.push_response(pn531_firmware_body());
    let shared = SharedMock::new(mock);
    let device = Device::from_driver(Box::new(shared.clone())).unwrap();
    (device, shared)
}
