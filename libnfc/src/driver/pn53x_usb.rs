// libnfc-rs/libnfc/src/driver/pn53x_usb.rs

//! Driver for PN53x chips wired straight to USB bulk endpoints.

use std::time::Duration;

use crate::constants::ACK_FRAME;
use crate::driver::{
    connstring_param, frame_transceive, Driver, DriverSpec, FramePipe,
};
use crate::transport::usb::{self, UsbCandidate, UsbEndpoints};
use crate::{Error, Result};

pub static SPEC: DriverSpec = DriverSpec {
    name: "pn53x_usb",
    probe,
    open,
};

/// Known PN53x evaluation boards and dongles with raw bulk pipes.
const CANDIDATES: &[UsbCandidate] = &[
    UsbCandidate {
        vendor_id: 0x04CC,
        product_id: 0x0531,
        label: "Philips / NXP PN531 demo board",
    },
    UsbCandidate {
        vendor_id: 0x04CC,
        product_id: 0x2533,
        label: "NXP PN533 demo board",
    },
    UsbCandidate {
        vendor_id: 0x04E6,
        product_id: 0x5591,
        label: "SCM Micro SCL3711",
    },
    UsbCandidate {
        vendor_id: 0x1FD3,
        product_id: 0x0608,
        label: "ASK LoGO",
    },
];

fn probe(max: usize) -> Vec<String> {
    match usb::enumerate(CANDIDATES, max) {
        Ok(ports) => ports
            .into_iter()
            .map(|p| format!("{}:{:03}:{:03}", SPEC.name, p.bus, p.address))
            .collect(),
        Err(e) => {
            log::debug!("pn53x_usb probe failed: {}", e);
            Vec::new()
        }
    }
}

fn parse_bus_address(param: &str) -> Result<(u8, u8)> {
    let mut parts = param.split(':');
    let bus = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or(Error::InvalidArgument("bad usb bus index"))?;
    let address = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or(Error::InvalidArgument("bad usb device address"))?;
    Ok((bus, address))
}

fn open(connstring: &str) -> Result<Box<dyn Driver>> {
    let param = connstring_param(connstring, SPEC.name)
        .ok_or_else(|| Error::UnknownDriver(connstring.to_string()))?;

    let (bus, address) = if param.is_empty() {
        // No address given: claim the first probed device
        let ports = usb::enumerate(CANDIDATES, 1)?;
        let port = ports.first().ok_or(Error::DeviceNotFound)?;
        (port.bus, port.address)
    } else {
        parse_bus_address(param)?
    };

    let endpoints = UsbEndpoints::claim(CANDIDATES, bus, address)?;
    Ok(Box::new(Pn53xUsbDriver {
        connstring: format!("{}:{:03}:{:03}", SPEC.name, bus, address),
        endpoints,
    }))
}

struct Pn53xUsbDriver {
    connstring: String,
    endpoints: UsbEndpoints,
}

impl FramePipe for Pn53xUsbDriver {
    fn write_wire(&mut self, bytes: &[u8]) -> Result<()> {
        self.endpoints.bulk_write(bytes, usb::DEFAULT_USB_TIMEOUT)
    }

    fn read_frame(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        // The device delivers one frame per bulk transfer
        self.endpoints.bulk_read(timeout)
    }
}

impl Driver for Pn53xUsbDriver {
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
        // An ACK in the command slot makes the chip drop the command in
        // flight (typically a blocking TgInitAsTarget)
        self.endpoints
            .bulk_write(&ACK_FRAME, Duration::from_millis(500))
    }
}
