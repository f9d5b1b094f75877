// libnfc-rs/libnfc/src/device/mod.rs

//! Public device handle: lifecycle, property configuration and the
//! initiator/target operation surface (in the `initiator` and
//! `target_mode` submodules).

mod initiator;
mod target_mode;

pub use initiator::CYCLE_NS;

use crate::chip::{self, ChipState};
use crate::constants::{CONNSTRING_MAX_LEN, ENV_DEFAULT_DEVICE};
use crate::driver::{self, Driver};
use crate::error::ChipError;
use crate::types::{ChipVariant, Property};
use crate::{Error, Result};

/// One claimed PN53x reader.
///
/// A handle exclusively owns its transport and is not internally locked:
/// drive it from one thread at a time. Distinct handles are independent.
pub struct Device {
    name: String,
    connstring: String,
    driver: Box<dyn Driver>,
    chip: ChipState,
    poisoned: bool,
    closed: bool,
    last_error: i32,
}

impl Device {
    /// Enumerate reachable devices across every registered driver, in
    /// registry order, up to `max` connection strings.
    pub fn list_devices(max: usize) -> Vec<String> {
        let mut found = Vec::new();
        for spec in driver::registry() {
            if found.len() >= max {
                break;
            }
            let mut connstrings = (spec.probe)(max - found.len());
            log::debug!("{} device(s) found using {} driver", connstrings.len(), spec.name);
            found.append(&mut connstrings);
        }
        found.truncate(max);
        found
    }

    /// Open a device. With `None` the `LIBNFC_DEFAULT_DEVICE` environment
    /// variable is consulted, falling back to the first probed device.
    pub fn open(connstring: Option<&str>) -> Result<Self> {
        let connstring = match connstring {
            Some(cs) => cs.to_string(),
            None => match std::env::var(ENV_DEFAULT_DEVICE) {
                Ok(cs) => cs,
                Err(_) => Self::list_devices(1)
                    .into_iter()
                    .next()
                    .ok_or(Error::DeviceNotFound)?,
            },
        };
        if connstring.len() > CONNSTRING_MAX_LEN {
            return Err(Error::InvalidArgument("connection string too long"));
        }

        let spec = driver::find_driver(&connstring)
            .ok_or_else(|| Error::UnknownDriver(connstring.clone()))?;
        let driver = (spec.open)(&connstring)?;
        Self::from_driver(driver)
    }

    /// Build a handle around an already-open driver and identify the chip
    /// behind it. This is also the test entry point for mock drivers.
    pub fn from_driver(mut driver: Box<dyn Driver>) -> Result<Self> {
        let mut chip = ChipState::new(ChipVariant::Pn532);
        let timeout = chip.command_timeout;
        let (variant, version) = chip::firmware_version(driver.as_mut(), &mut chip, timeout)?;
        chip.variant = variant;
        let connstring = driver.connstring().to_string();
        log::debug!("\"{}\" ({}) has been claimed", version, connstring);
        Ok(Self {
            name: version,
            connstring,
            driver,
            chip,
            poisoned: false,
            closed: false,
            last_error: 0,
        })
    }

    /// Human-readable device name (chip name and firmware revision).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connection string that reopens this device.
    pub fn connstring(&self) -> &str {
        &self.connstring
    }

    /// Chip variant discovered at open time.
    pub fn chip_variant(&self) -> ChipVariant {
        self.chip.variant
    }

    /// Numeric code of the most recent error (0 after a success).
    pub fn last_error_code(&self) -> i32 {
        self.last_error
    }

    /// Render the most recent error code.
    pub fn strerror(&self) -> String {
        match self.last_error {
            0 => "success".to_string(),
            code if code > 0 => ChipError::from_code(code as u8).to_string(),
            -1 => "input/output error".to_string(),
            -2 => "not supported by device".to_string(),
            -3 => "invalid argument".to_string(),
            _ => "device error".to_string(),
        }
    }

    /// Set a boolean device property. The handle's flag changes only if
    /// the chip accepted the corresponding write.
    pub fn set_property_bool(&mut self, property: Property, enable: bool) -> Result<()> {
        self.guard()?;
        let result = chip::set_property_bool(self.driver.as_mut(), &mut self.chip, property, enable);
        self.note(result)
    }

    /// Read back the cached value of a boolean property.
    pub fn get_property_bool(&self, property: Property) -> Result<bool> {
        chip::get_property_bool(&self.chip, property)
    }

    /// Set an integer device property (the per-phase timeouts, ms).
    pub fn set_property_int(&mut self, property: Property, value: i32) -> Result<()> {
        self.guard()?;
        let result = chip::set_property_int(self.driver.as_mut(), &mut self.chip, property, value);
        self.note(result)
    }

    /// Best-effort interruption of a blocking command on this handle.
    pub fn abort_command(&mut self) -> Result<()> {
        let result = self.driver.abort();
        self.note(result)
    }

    /// Idle the chip and release the transport. Also performed on drop.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if !self.poisoned {
            let _ = chip::idle(self.driver.as_mut(), &mut self.chip);
        }
        let _ = self.driver.idle();
        self.driver.close()
    }

    pub(crate) fn guard(&self) -> Result<()> {
        if self.poisoned {
            Err(Error::Poisoned)
        } else {
            Ok(())
        }
    }

    /// Record the outcome on the handle: cache the numeric code and
    /// poison on transport-level i/o failures.
    pub(crate) fn note<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.last_error = 0,
            Err(e) => {
                self.last_error = e.code();
                if e.is_fatal() {
                    self.poisoned = true;
                }
            }
        }
        result
    }

    pub(crate) fn parts(&mut self) -> (&mut dyn Driver, &mut ChipState) {
        (self.driver.as_mut(), &mut self.chip)
    }

    pub(crate) fn chip_state(&self) -> &ChipState {
        &self.chip
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
