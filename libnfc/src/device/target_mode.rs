// libnfc-rs/libnfc/src/device/target_mode.rs

//! Target (tag/peer emulation) operations.

use std::time::Duration;

use crate::chip::{self, opcodes};
use crate::device::Device;
use crate::protocol::bitframe;
use crate::target::Target;
use crate::types::Property;
use crate::{Error, Result};

impl Device {
    /// Configure the chip for emulation and block in TgInitAsTarget until
    /// a foreign initiator sends its first non-anti-collision command.
    ///
    /// `emulated` describes the identity to present: an ISO14443-A tag
    /// (PICC mode), a FeliCa card, or a DEP peer. Returns the initiator's
    /// first command and the mode byte the chip reported (activated baud
    /// and framing).
    pub fn target_init(
        &mut self,
        emulated: &Target,
        timeout: Duration,
    ) -> Result<(Vec<u8>, u8)> {
        self.guard()?;

        // Emulation configuration: no host-visible framing help, field
        // off until the initiator provides it, strict frames, chip CRC
        // and parity, Crypto1 off.
        self.set_property_bool(Property::EasyFraming, false)?;
        self.set_property_bool(Property::ActivateField, false)?;
        self.set_property_bool(Property::AcceptInvalidFrames, false)?;
        self.set_property_bool(Property::AcceptMultipleFrames, false)?;
        self.set_property_bool(Property::HandleCrc, true)?;
        self.set_property_bool(Property::HandleParity, true)?;
        self.set_property_bool(Property::ActivateCrypto1, false)?;

        let result = self.target_init_inner(emulated, timeout);
        self.note(result)
    }

    fn target_init_inner(
        &mut self,
        emulated: &Target,
        timeout: Duration,
    ) -> Result<(Vec<u8>, u8)> {
        let mut mode = 0u8;
        let mut mifare = [0u8; 6];
        let mut felica = [0u8; 18];
        let mut nfcid3 = [0u8; 10];
        let mut general_bytes: &[u8] = &[];

        match emulated {
            Target::Iso14443a(t) => {
                // PICC only
                mode |= 0x04;
                if t.uid.len() < 4 {
                    return Err(Error::InvalidArgument("emulated uid too short"));
                }
                // SENS_RES travels LSB first; the first UID byte is fixed
                // by the chip, only bytes 1..3 are configurable
                mifare = [t.atqa[1], t.atqa[0], t.uid[1], t.uid[2], t.uid[3], t.sak];
            }
            Target::Felica(t) => {
                felica[..8].copy_from_slice(&t.id);
                felica[8..16].copy_from_slice(&t.pad);
                felica[16..18].copy_from_slice(&t.sys_code.unwrap_or([0xFF, 0xFF]));
            }
            Target::Dep(t) => {
                // DEP only
                mode |= 0x02;
                nfcid3 = t.nfcid3;
                general_bytes = &t.gb;
            }
            _ => return Err(Error::NotSupported("emulation for this family")),
        }

        if general_bytes.len() > 47 {
            return Err(Error::InvalidArgument("general bytes too long"));
        }

        // ISO14443-4 capable PICC emulation needs the chip-side framing
        // parameter; everything else must run without it
        let picc = matches!(emulated, Target::Iso14443a(t) if t.sak & 0x20 != 0);
        {
            let (driver, chip) = self.parts();
            chip::set_parameter_bit(driver, chip, chip::PARAM_14443_4_PICC, picc)?;
        }

        let mut cmd = Vec::with_capacity(39 + general_bytes.len());
        cmd.push(opcodes::TG_INIT_AS_TARGET);
        cmd.push(mode);
        cmd.extend_from_slice(&mifare);
        cmd.extend_from_slice(&felica);
        cmd.extend_from_slice(&nfcid3);
        cmd.push(general_bytes.len() as u8);
        cmd.extend_from_slice(general_bytes);
        // No historical bytes (Tk)
        cmd.push(0x00);

        let (driver, chip) = self.parts();
        let rx = chip::transceive(driver, chip, &cmd, timeout)?;
        if rx.is_empty() {
            return Err(Error::FrameFormat("empty activation reply"));
        }
        Ok((rx[1..].to_vec(), rx[0]))
    }

    /// Send a frame to the initiator as the emulated tag or peer. Easy
    /// framing (DEP) goes through TgSetData, raw emulation through
    /// TgResponseToInitiator.
    pub fn target_send_bytes(&mut self, tx: &[u8], timeout: Duration) -> Result<()> {
        self.guard()?;
        let (driver, chip) = self.parts();
        let opcode = if chip.easy_framing {
            opcodes::TG_SET_DATA
        } else {
            opcodes::TG_RESPONSE_TO_INITIATOR
        };
        let mut cmd = Vec::with_capacity(1 + tx.len());
        cmd.push(opcode);
        cmd.extend_from_slice(tx);
        let result = chip::transceive(driver, chip, &cmd, timeout).map(|_| ());
        self.note(result)
    }

    /// Receive the initiator's next frame.
    pub fn target_receive_bytes(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        self.guard()?;
        let (driver, chip) = self.parts();
        let opcode = if chip.easy_framing {
            opcodes::TG_GET_DATA
        } else {
            opcodes::TG_GET_INITIATOR_COMMAND
        };
        let result = chip::transceive(driver, chip, &[opcode], timeout)
            .map(|rx| rx.get(1..).unwrap_or_default().to_vec());
        self.note(result)
    }

    /// Send a raw bit stream to the initiator (host-supplied parity when
    /// parity handling is off).
    pub fn target_send_bits(
        &mut self,
        tx: &[u8],
        tx_bits: usize,
        tx_parity: &[u8],
    ) -> Result<()> {
        self.guard()?;
        let result = self.target_send_bits_inner(tx, tx_bits, tx_parity);
        self.note(result)
    }

    fn target_send_bits_inner(
        &mut self,
        tx: &[u8],
        tx_bits: usize,
        tx_parity: &[u8],
    ) -> Result<()> {
        let (driver, chip) = self.parts();
        chip::set_tx_bits(driver, chip, (tx_bits % 8) as u8)?;
        let frame = if !chip.handle_parity {
            bitframe::wrap_bits(tx, tx_bits, tx_parity)?.0
        } else {
            tx.to_vec()
        };
        let mut cmd = vec![opcodes::TG_RESPONSE_TO_INITIATOR];
        cmd.extend_from_slice(&frame);
        let timeout = chip.command_timeout;
        chip::transceive(driver, chip, &cmd, timeout).map(|_| ())
    }

    /// Receive a raw bit stream from the initiator.
    pub fn target_receive_bits(
        &mut self,
        timeout: Duration,
    ) -> Result<(Vec<u8>, usize, Vec<u8>)> {
        self.guard()?;
        let result = self.target_receive_bits_inner(timeout);
        self.note(result)
    }

    fn target_receive_bits_inner(
        &mut self,
        timeout: Duration,
    ) -> Result<(Vec<u8>, usize, Vec<u8>)> {
        let (driver, chip) = self.parts();
        let rx = chip::transceive(driver, chip, &[opcodes::TG_GET_INITIATOR_COMMAND], timeout)?;
        let data = rx.get(1..).unwrap_or_default();
        if !chip.handle_parity {
            bitframe::unwrap_bits(data, data.len() * 8)
        } else {
            Ok((data.to_vec(), data.len() * 8, Vec::new()))
        }
    }

    /// Current emulation state and activated baud, as reported by
    /// TgGetTargetStatus.
    pub fn target_status(&mut self) -> Result<(u8, u8)> {
        self.guard()?;
        let (driver, chip) = self.parts();
        let timeout = chip.command_timeout;
        let result = chip::transceive(driver, chip, &[opcodes::TG_GET_TARGET_STATUS], timeout)
            .and_then(|rx| {
                if rx.len() < 2 {
                    Err(Error::FrameFormat("short target status"))
                } else {
                    Ok((rx[0], rx[1]))
                }
            });
        self.note(result)
    }

    /// Replace the ATR_RES general bytes for subsequent DEP activations.
    pub fn target_set_general_bytes(&mut self, gb: &[u8]) -> Result<()> {
        self.guard()?;
        if gb.len() > 47 {
            return Err(Error::InvalidArgument("general bytes too long"));
        }
        let (driver, chip) = self.parts();
        let mut cmd = vec![opcodes::TG_SET_GENERAL_BYTES];
        cmd.extend_from_slice(gb);
        let timeout = chip.command_timeout;
        let result = chip::transceive(driver, chip, &cmd, timeout).map(|_| ());
        self.note(result)
    }

    /// Supply metadata for a chained DEP response (MI set).
    pub fn target_set_meta_data(&mut self, data: &[u8]) -> Result<()> {
        self.guard()?;
        let (driver, chip) = self.parts();
        let mut cmd = vec![opcodes::TG_SET_META_DATA];
        cmd.extend_from_slice(data);
        let timeout = chip.command_timeout;
        let result = chip::transceive(driver, chip, &cmd, timeout).map(|_| ());
        self.note(result)
    }
}
