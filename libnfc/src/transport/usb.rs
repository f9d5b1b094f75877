// libnfc-rs/libnfc/src/transport/usb.rs

//! PN53x USB endpoint pairs.
//!
//! Enumeration walks every bus/device, keeps those matching a driver's
//! candidate table that expose at least two bulk endpoints, and records
//! bus number and device address so the connection string survives
//! re-enumeration within one OS snapshot.

use std::time::Duration;

use rusb::{Context, Device, DeviceHandle, Direction, TransferType, UsbContext};

use crate::{Error, Result};

/// One VID/PID a driver is willing to claim.
#[derive(Debug, Clone, Copy)]
pub struct UsbCandidate {
    pub vendor_id: u16,
    pub product_id: u16,
    pub label: &'static str,
}

/// Enumeration result: enough to build a connection string and a display
/// name.
#[derive(Debug, Clone)]
pub struct UsbPortInfo {
    pub bus: u8,
    pub address: u8,
    pub display: String,
}

/// Deliberately long: the chip may sit mid-polling before it answers.
pub const DEFAULT_USB_TIMEOUT: Duration = Duration::from_secs(30);

const RX_BUFFER_LEN: usize = 512;

fn find_bulk_endpoints<T: UsbContext>(device: &Device<T>) -> Option<(u8, u8)> {
    let config = device.config_descriptor(0).ok()?;
    let mut ep_in = None;
    let mut ep_out = None;
    for interface in config.interfaces() {
        // Only the first altsetting carries the chip's bulk pipes
        if let Some(desc) = interface.descriptors().next() {
            for endpoint in desc.endpoint_descriptors() {
                if endpoint.transfer_type() != TransferType::Bulk {
                    continue;
                }
                match endpoint.direction() {
                    Direction::In if ep_in.is_none() => ep_in = Some(endpoint.address()),
                    Direction::Out if ep_out.is_none() => ep_out = Some(endpoint.address()),
                    _ => {}
                }
            }
        }
        if ep_in.is_some() && ep_out.is_some() {
            break;
        }
    }
    Some((ep_in?, ep_out?))
}

fn candidate_for(candidates: &[UsbCandidate], vid: u16, pid: u16) -> Option<&UsbCandidate> {
    candidates
        .iter()
        .find(|c| c.vendor_id == vid && c.product_id == pid)
}

fn display_name<T: UsbContext>(device: &Device<T>, fallback: &str) -> String {
    let Ok(handle) = device.open() else {
        return fallback.to_string();
    };
    let Ok(desc) = device.device_descriptor() else {
        return fallback.to_string();
    };
    let timeout = Duration::from_millis(100);
    let Ok(languages) = handle.read_languages(timeout) else {
        return fallback.to_string();
    };
    let Some(&language) = languages.first() else {
        return fallback.to_string();
    };
    let manufacturer = handle
        .read_manufacturer_string(language, &desc, timeout)
        .unwrap_or_default();
    let product = handle
        .read_product_string(language, &desc, timeout)
        .unwrap_or_default();
    match (manufacturer.is_empty(), product.is_empty()) {
        (false, false) => format!("{} / {}", manufacturer, product),
        (false, true) => manufacturer,
        (true, false) => product,
        (true, true) => fallback.to_string(),
    }
}

/// Walk all buses for devices matching `candidates`, skipping anything
/// without two bulk endpoints. Stops after `max` hits.
pub fn enumerate(candidates: &[UsbCandidate], max: usize) -> Result<Vec<UsbPortInfo>> {
    let context = Context::new()?;
    let mut found = Vec::new();
    for device in context.devices()?.iter() {
        if found.len() >= max {
            break;
        }
        let Ok(desc) = device.device_descriptor() else {
            continue;
        };
        let Some(candidate) = candidate_for(candidates, desc.vendor_id(), desc.product_id())
        else {
            continue;
        };
        if find_bulk_endpoints(&device).is_none() {
            continue;
        }
        found.push(UsbPortInfo {
            bus: device.bus_number(),
            address: device.address(),
            display: display_name(&device, candidate.label),
        });
    }
    Ok(found)
}

/// A claimed PN53x USB device with its bulk endpoint pair.
pub struct UsbEndpoints {
    handle: DeviceHandle<Context>,
    ep_in: u8,
    ep_out: u8,
    display: String,
    product_id: u16,
}

impl UsbEndpoints {
    /// Claim the device at `bus:address`, provided it matches one of the
    /// candidates: open, select configuration 1, claim interface 0 and
    /// locate the bulk endpoints. Partial failures release everything.
    pub fn claim(candidates: &[UsbCandidate], bus: u8, address: u8) -> Result<Self> {
        let context = Context::new()?;
        for device in context.devices()?.iter() {
            if device.bus_number() != bus || device.address() != address {
                continue;
            }
            let desc = device.device_descriptor()?;
            let Some(candidate) = candidate_for(candidates, desc.vendor_id(), desc.product_id())
            else {
                continue;
            };
            let Some((ep_in, ep_out)) = find_bulk_endpoints(&device) else {
                return Err(Error::NotSupported("no bulk endpoint pair"));
            };
            let display = display_name(&device, candidate.label);

            let mut handle = device.open()?;
            if let Ok(true) = handle.kernel_driver_active(0) {
                // Best-effort detach; claim_interface reports the hard failure
                let _ = handle.detach_kernel_driver(0);
            }
            handle.set_active_configuration(1)?;
            handle.claim_interface(0)?;
            log::debug!("claimed usb {:03}:{:03} ({})", bus, address, display);

            return Ok(Self {
                handle,
                ep_in,
                ep_out,
                display,
                product_id: desc.product_id(),
            });
        }
        Err(Error::DeviceNotFound)
    }

    /// Human-readable name from the string descriptors.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Product id of the claimed device.
    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    /// Bulk-OUT write; a short write is an error.
    pub fn bulk_write(&self, data: &[u8], timeout: Duration) -> Result<()> {
        let written = self.handle.write_bulk(self.ep_out, data, timeout)?;
        if written != data.len() {
            return Err(Error::FrameFormat("short bulk write"));
        }
        Ok(())
    }

    /// Bulk-IN read; short reads are returned as-is, framing is the
    /// caller's business.
    pub fn bulk_read(&self, timeout: Duration) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; RX_BUFFER_LEN];
        let n = match self.handle.read_bulk(self.ep_in, &mut buf, timeout) {
            Ok(n) => n,
            Err(rusb::Error::Timeout) => return Err(Error::Timeout),
            Err(e) => return Err(e.into()),
        };
        buf.truncate(n);
        Ok(buf)
    }
}

impl Drop for UsbEndpoints {
    fn drop(&mut self) {
        let _ = self.handle.release_interface(0);
    }
}
