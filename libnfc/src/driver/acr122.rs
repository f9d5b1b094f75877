// libnfc-rs/libnfc/src/driver/acr122.rs

//! Driver for the ACS ACR122 smart-card reader, which fronts its PN532
//! with a PC/SC interface. Chip payloads are tunneled in pseudo-APDUs;
//! the reader answers `61 xx` and hands the chip response back through
//! GET RESPONSE. Every header byte of the reply is validated before the
//! body is trusted.

use std::ffi::CString;
use std::time::Duration;

use pcsc::{Card, Context, Protocols, Scope, ShareMode};

use crate::chip::opcodes;
use crate::constants::{DIR_CHIP_TO_HOST, DIR_HOST_TO_CHIP};
use crate::driver::{connstring_param, strip_echo, Driver, DriverSpec};
use crate::{Error, Result};

pub static SPEC: DriverSpec = DriverSpec {
    name: "acr122",
    probe,
    open,
};

/// Reader-name fragment PC/SC reports for the ACR122 family. The raw USB
/// identity, for reference, is 072F:2200.
const READER_NAME_PATTERN: &str = "ACR122";

/// Pseudo-APDU header: CLA FF, INS 00, P1 00, P2 00, then Lc.
const APDU_HEADER: [u8; 4] = [0xFF, 0x00, 0x00, 0x00];

const SW_MORE_DATA: u8 = 0x61;

fn matching_readers(max: usize) -> Vec<String> {
    let Ok(context) = Context::establish(Scope::User) else {
        return Vec::new();
    };
    let Ok(len) = context.list_readers_len() else {
        return Vec::new();
    };
    let mut buf = vec![0u8; len];
    let Ok(readers) = context.list_readers(&mut buf) else {
        return Vec::new();
    };
    readers
        .filter_map(|r| r.to_str().ok())
        .filter(|name| name.contains(READER_NAME_PATTERN))
        .take(max)
        .map(str::to_string)
        .collect()
}

fn probe(max: usize) -> Vec<String> {
    matching_readers(max)
        .into_iter()
        .map(|name| format!("{}:{}", SPEC.name, name))
        .collect()
}

fn open(connstring: &str) -> Result<Box<dyn Driver>> {
    let param = connstring_param(connstring, SPEC.name)
        .ok_or_else(|| Error::UnknownDriver(connstring.to_string()))?;

    let reader_name = if param.is_empty() {
        matching_readers(1)
            .into_iter()
            .next()
            .ok_or(Error::DeviceNotFound)?
    } else {
        param.to_string()
    };

    let context = Context::establish(Scope::User)?;
    let c_name =
        CString::new(reader_name.clone()).map_err(|_| Error::InvalidArgument("reader name"))?;
    let card = context.connect(&c_name, ShareMode::Shared, Protocols::ANY)?;
    log::debug!("connected to pcsc reader {}", reader_name);

    Ok(Box::new(Acr122Driver {
        connstring: format!("{}:{}", SPEC.name, reader_name),
        card,
    }))
}

struct Acr122Driver {
    connstring: String,
    card: Card,
}

impl Acr122Driver {
    fn transmit<'a>(&self, apdu: &[u8], rbuf: &'a mut [u8]) -> Result<&'a [u8]> {
        Ok(self.card.transmit(apdu, rbuf)?)
    }
}

impl Driver for Acr122Driver {
    fn name(&self) -> &'static str {
        SPEC.name
    }

    fn connstring(&self) -> &str {
        &self.connstring
    }

    fn transceive(&mut self, tx: &[u8], _timeout: Duration) -> Result<Vec<u8>> {
        // PC/SC owns the transfer timing; the reader has no ACK phase.
        if tx.first() != Some(&DIR_HOST_TO_CHIP) {
            return Err(Error::InvalidArgument("payload lacks direction byte"));
        }
        if tx.len() > 0xFF {
            return Err(Error::InvalidArgument("payload exceeds APDU capacity"));
        }

        let mut apdu = Vec::with_capacity(5 + tx.len());
        apdu.extend_from_slice(&APDU_HEADER);
        apdu.push(tx.len() as u8);
        apdu.extend_from_slice(tx);

        let mut rbuf = [0u8; pcsc::MAX_BUFFER_SIZE];
        let status = self.transmit(&apdu, &mut rbuf)?.to_vec();
        if status.len() != 2 || status[0] != SW_MORE_DATA {
            return Err(Error::FrameFormat("unexpected reader status word"));
        }

        let get_response = [0xFF, 0xC0, 0x00, 0x00, status[1]];
        let mut rbuf = [0u8; pcsc::MAX_BUFFER_SIZE];
        let data = self.transmit(&get_response, &mut rbuf)?;

        // Expect D5 | echo | body | 90 00 and check each field rather
        // than indexing at a fixed offset
        if data.len() < 4 {
            return Err(Error::FrameFormat("short reader response"));
        }
        let (body, sw) = data.split_at(data.len() - 2);
        if sw != [0x90, 0x00] {
            return Err(Error::FrameFormat("reader reported command failure"));
        }
        if body[0] != DIR_CHIP_TO_HOST {
            return Err(Error::FrameFormat("wrong direction byte"));
        }
        strip_echo(tx[1], body)
    }

    fn abort(&mut self) -> Result<()> {
        // No out-of-band cancel over PC/SC: release the selected target
        let release = [DIR_HOST_TO_CHIP, opcodes::IN_RELEASE, 0x00];
        let _ = self.transceive(&release, Duration::from_millis(500));
        Ok(())
    }
}
