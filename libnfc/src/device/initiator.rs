// libnfc-rs/libnfc/src/device/initiator.rs

//! Initiator (reader) operations.

use std::time::Duration;

use crate::chip::{self, opcodes, registers as reg};
use crate::device::Device;
use crate::protocol::bitframe;
use crate::target::{self, Target};
use crate::types::{BaudRate, Modulation, ModulationType, Property};
use crate::{Error, Result};

/// Default FeliCa polling payload: poll any system code, one time slot.
const FELICA_POLL_DEFAULT: [u8; 5] = [0x00, 0xFF, 0xFF, 0x01, 0x00];

/// One CIU timer tick at the 13.56 MHz carrier, in nanoseconds (~73.7 ns;
/// the 16-bit counter saturates around 4.8 ms).
pub const CYCLE_NS: f64 = 1.0e9 / 13.56e6;

impl Device {
    /// Configure the device as an RFID reader: the canonical property set
    /// (field drop/raise, infinite select, auto ISO14443-4, type A at
    /// 106 kbps, strict frames, chip CRC and parity, easy framing on,
    /// Crypto1 off).
    pub fn initiator_init(&mut self) -> Result<()> {
        self.guard()?;
        let (driver, chip) = self.parts();
        let result = chip::initiator_init(driver, chip);
        self.note(result)
    }

    /// Poll for one passive target of the given modulation.
    ///
    /// `init_data` selects a specific tag: the UID for ISO14443-A (re-
    /// cascaded as needed), the AFI for ISO14443-B, the polling payload
    /// for FeliCa. Returns [`Error::NoTarget`] when nothing answered.
    pub fn select_passive_target(
        &mut self,
        modulation: Modulation,
        init_data: Option<&[u8]>,
    ) -> Result<Target> {
        self.guard()?;
        let result = self.select_passive_inner(modulation, init_data);
        self.note(result)
    }

    fn select_passive_inner(
        &mut self,
        modulation: Modulation,
        init_data: Option<&[u8]>,
    ) -> Result<Target> {
        if !modulation.supported_by(self.chip_state().variant) {
            return Err(Error::NotSupported("modulation/baud combination"));
        }
        let brty = modulation.brty()?;

        let mut cmd = vec![opcodes::IN_LIST_PASSIVE_TARGET, 0x01, brty];
        match modulation.modulation_type {
            ModulationType::Iso14443a => {
                if let Some(uid) = init_data {
                    cmd.extend_from_slice(&target::cascade_uid(uid)?);
                }
            }
            ModulationType::Felica => {
                cmd.extend_from_slice(init_data.unwrap_or(&FELICA_POLL_DEFAULT));
            }
            ModulationType::Iso14443b => {
                // AFI, default "all families"
                cmd.push(init_data.and_then(|d| d.first().copied()).unwrap_or(0x00));
            }
            _ => {}
        }

        let (driver, chip) = self.parts();
        let timeout = chip.command_timeout;
        let rx = chip::transceive(driver, chip, &cmd, timeout)?;
        if rx.first().copied().unwrap_or(0) == 0 {
            return Err(Error::NoTarget);
        }
        target::decode_target(&rx[1..], modulation, self.chip_state().variant)
    }

    /// Enumerate passive targets of one modulation, up to `max`.
    ///
    /// Infinite select is turned off for the scan. The chip cycles the
    /// same card once the field has seen them all, so a duplicate image
    /// ends the enumeration; families the chip cannot deselect (FeliCa,
    /// Jewel, the 14443B variants) end it after one hit.
    pub fn list_passive_targets(
        &mut self,
        modulation: Modulation,
        max: usize,
    ) -> Result<Vec<Target>> {
        self.guard()?;
        if max == 0 {
            return Err(Error::InvalidArgument("zero target cap"));
        }

        self.set_property_bool(Property::InfiniteSelect, false)?;

        let mut targets: Vec<Target> = Vec::new();
        while targets.len() < max {
            let found = match self.select_passive_target(modulation, None) {
                Ok(t) => t,
                Err(Error::NoTarget) | Err(Error::Timeout) | Err(Error::Chip(_)) => break,
                Err(e) => return Err(e),
            };
            if targets.contains(&found) {
                break;
            }
            targets.push(found);
            if modulation.single_shot() {
                break;
            }
            if self.deselect_target().is_err() {
                break;
            }
        }
        self.last_error = 0;
        Ok(targets)
    }

    /// InAutoPoll: `polls` passes over the given modulations with
    /// `period` x 150 ms between passes. Returns the first target found,
    /// or `None` when every pass came up empty.
    pub fn poll_target(
        &mut self,
        modulations: &[Modulation],
        polls: u8,
        period: u8,
    ) -> Result<Option<(Modulation, Target)>> {
        self.guard()?;
        let result = self.poll_inner(modulations, polls, period);
        self.note(result)
    }

    fn poll_inner(
        &mut self,
        modulations: &[Modulation],
        polls: u8,
        period: u8,
    ) -> Result<Option<(Modulation, Target)>> {
        if self.chip_state().variant == crate::types::ChipVariant::Pn531 {
            return Err(Error::NotSupported("InAutoPoll"));
        }
        if polls == 0 {
            return Err(Error::InvalidArgument("zero polling passes"));
        }
        if !(1..=15).contains(&period) {
            return Err(Error::InvalidArgument("poll period out of range"));
        }
        if modulations.is_empty() {
            return Err(Error::InvalidArgument("no modulations to poll"));
        }

        let mut cmd = vec![opcodes::IN_AUTO_POLL, polls, period];
        for m in modulations {
            cmd.push(m.poll_type()?);
        }

        let (driver, chip) = self.parts();
        // Worst case: every pass runs its full period
        let timeout = chip.command_timeout
            + Duration::from_millis(150) * u32::from(period) * u32::from(polls);
        let rx = chip::transceive(driver, chip, &cmd, timeout)?;

        if rx.first().copied().unwrap_or(0) == 0 {
            return Ok(None);
        }
        let (modulation, found, _) =
            target::decode_autopoll_entry(&rx[1..], self.chip_state().variant)?;
        Ok(Some((modulation, found)))
    }

    /// Exchange ISO-framed (easy framing) or raw bytes with the selected
    /// target.
    pub fn transceive_bytes(
        &mut self,
        tx: &[u8],
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>> {
        self.guard()?;
        let result = self.transceive_bytes_inner(tx, timeout);
        self.note(result)
    }

    fn transceive_bytes_inner(
        &mut self,
        tx: &[u8],
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>> {
        let (driver, chip) = self.parts();
        let mut cmd = if chip.easy_framing {
            vec![opcodes::IN_DATA_EXCHANGE, 0x01]
        } else {
            vec![opcodes::IN_COMMUNICATE_THRU]
        };
        cmd.extend_from_slice(tx);
        let timeout = timeout.unwrap_or(chip.command_timeout);
        let rx = chip::transceive(driver, chip, &cmd, timeout)?;
        Ok(rx.get(1..).unwrap_or_default().to_vec())
    }

    /// [`Device::transceive_bytes`] plus the chip's cycle counter for the
    /// exchange (about 73 ns per cycle, saturating near 4.8 ms).
    pub fn transceive_bytes_timed(
        &mut self,
        tx: &[u8],
        timeout: Option<Duration>,
    ) -> Result<(Vec<u8>, u32)> {
        self.guard()?;
        let arm = self.arm_cycle_counter();
        self.note(arm)?;
        let rx = self.transceive_bytes(tx, timeout)?;
        let cycles = self.read_cycle_counter();
        let cycles = self.note(cycles)?;
        Ok((rx, cycles))
    }

    /// Exchange a raw bit stream with the selected target. With parity
    /// handling off the caller supplies one parity bit per byte and gets
    /// the received parity back; short (< 9 bit) frames travel verbatim.
    pub fn transceive_bits(
        &mut self,
        tx: &[u8],
        tx_bits: usize,
        tx_parity: &[u8],
    ) -> Result<(Vec<u8>, usize, Vec<u8>)> {
        self.guard()?;
        let result = self.transceive_bits_inner(tx, tx_bits, tx_parity);
        self.note(result)
    }

    fn transceive_bits_inner(
        &mut self,
        tx: &[u8],
        tx_bits: usize,
        tx_parity: &[u8],
    ) -> Result<(Vec<u8>, usize, Vec<u8>)> {
        let (driver, chip) = self.parts();
        chip::set_tx_bits(driver, chip, (tx_bits % 8) as u8)?;

        let host_parity = !chip.handle_parity;
        let frame = if host_parity {
            bitframe::wrap_bits(tx, tx_bits, tx_parity)?.0
        } else {
            tx.to_vec()
        };

        let mut cmd = vec![opcodes::IN_COMMUNICATE_THRU];
        cmd.extend_from_slice(&frame);
        let timeout = chip.command_timeout;
        let rx = chip::transceive(driver, chip, &cmd, timeout)?;
        let data = rx.get(1..).unwrap_or_default();

        if host_parity {
            let frame_bits = data.len() * 8;
            bitframe::unwrap_bits(data, frame_bits)
        } else {
            Ok((data.to_vec(), data.len() * 8, Vec::new()))
        }
    }

    /// [`Device::transceive_bits`] plus the cycle counter.
    pub fn transceive_bits_timed(
        &mut self,
        tx: &[u8],
        tx_bits: usize,
        tx_parity: &[u8],
    ) -> Result<(Vec<u8>, usize, Vec<u8>, u32)> {
        self.guard()?;
        let arm = self.arm_cycle_counter();
        self.note(arm)?;
        let (data, bits, parity) = self.transceive_bits(tx, tx_bits, tx_parity)?;
        let cycles = self.read_cycle_counter();
        let cycles = self.note(cycles)?;
        Ok((data, bits, parity, cycles))
    }

    fn arm_cycle_counter(&mut self) -> Result<()> {
        let (driver, chip) = self.parts();
        // Timer at carrier frequency, auto-started by transmission,
        // counting down from full scale
        chip::write_register_mask(driver, chip, reg::CIU_T_MODE, 0xFF, reg::SYMBOL_TAUTO)?;
        chip::write_register_mask(driver, chip, reg::CIU_T_PRESCALER, 0xFF, 0x00)?;
        chip::write_register_mask(driver, chip, reg::CIU_T_RELOAD_HI, 0xFF, 0xFF)?;
        chip::write_register_mask(driver, chip, reg::CIU_T_RELOAD_LO, 0xFF, 0xFF)
    }

    fn read_cycle_counter(&mut self) -> Result<u32> {
        let (driver, chip) = self.parts();
        let hi = chip::read_register(driver, chip, reg::CIU_T_COUNTER_HI)?;
        let lo = chip::read_register(driver, chip, reg::CIU_T_COUNTER_LO)?;
        let counter = u32::from(hi) << 8 | u32::from(lo);
        Ok(0xFFFF - counter)
    }

    /// Release the currently selected target back to the field.
    pub fn deselect_target(&mut self) -> Result<()> {
        self.guard()?;
        let (driver, chip) = self.parts();
        let timeout = chip.command_timeout;
        let result =
            chip::transceive(driver, chip, &[opcodes::IN_DESELECT, 0x00], timeout).map(|_| ());
        self.note(result)
    }

    /// Jump into DEP with a peer: passive or active mode at 106/212/424
    /// kbps, with optional NFCID3i and general bytes.
    pub fn select_dep_target(
        &mut self,
        active: bool,
        baud: BaudRate,
        nfcid3i: Option<&[u8; 10]>,
        general_bytes: Option<&[u8]>,
    ) -> Result<target::DepTarget> {
        self.guard()?;
        let result = self.select_dep_inner(active, baud, nfcid3i, general_bytes);
        self.note(result)
    }

    fn select_dep_inner(
        &mut self,
        active: bool,
        baud: BaudRate,
        nfcid3i: Option<&[u8; 10]>,
        general_bytes: Option<&[u8]>,
    ) -> Result<target::DepTarget> {
        let baud_index = match baud {
            BaudRate::B106 => 0x00,
            BaudRate::B212 => 0x01,
            BaudRate::B424 => 0x02,
            BaudRate::B847 => return Err(Error::NotSupported("DEP at 847 kbps")),
        };

        let mut cmd = vec![opcodes::IN_JUMP_FOR_DEP, active as u8, baud_index, 0x00];
        let mut next = 0u8;
        if let Some(nfcid3) = nfcid3i {
            next |= 0x02;
            cmd.extend_from_slice(nfcid3);
        }
        if let Some(gb) = general_bytes {
            next |= 0x04;
            cmd.extend_from_slice(gb);
        }
        cmd[3] = next;

        let (driver, chip) = self.parts();
        let timeout = chip.command_timeout;
        let rx = chip::transceive(driver, chip, &cmd, timeout)?;
        // status | Tg | ATR_RES
        if rx.len() < 2 {
            return Err(Error::FrameFormat("short ATR_RES"));
        }
        target::decode_atr_res(&rx[2..])
    }
}
