// libnfc-rs/libnfc/src/chip/mod.rs

//! PN53x command engine.
//!
//! Everything here speaks chip-level payloads (`opcode | args`); the
//! driver layer owns the wire framing and the ACK handshake. The engine
//! classifies status bytes, performs masked register access, realizes the
//! public [`Property`] set onto CIU registers and SetParameters bits, and
//! keeps the per-handle caches (tx-bits, parameter byte, last status).

pub mod opcodes;
pub mod registers;

use std::time::Duration;

use crate::constants::DIR_HOST_TO_CHIP;
use crate::driver::Driver;
use crate::error::ChipError;
use crate::types::{ChipVariant, Property};
use crate::utils::bytes_to_hex_spaced;
use crate::{Error, Result};

use registers as reg;

// SetParameters flag bits
pub const PARAM_NAD_USED: u8 = 0x01;
pub const PARAM_DID_USED: u8 = 0x02;
pub const PARAM_AUTO_ATR_RES: u8 = 0x04;
pub const PARAM_AUTO_RATS: u8 = 0x10;
pub const PARAM_14443_4_PICC: u8 = 0x20;

// RFConfiguration items
pub const RFCI_FIELD: u8 = 0x01;
pub const RFCI_TIMINGS: u8 = 0x02;
pub const RFCI_RETRY_SELECT: u8 = 0x05;

/// Default ACK wait applied by the drivers.
pub const ACK_TIMEOUT: Duration = Duration::from_secs(1);
/// Default response wait when the caller does not supply one.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Mutable per-handle chip state: operational flags, register caches and
/// the last status code reported by the chip.
#[derive(Debug, Clone)]
pub struct ChipState {
    pub variant: ChipVariant,
    pub handle_crc: bool,
    pub handle_parity: bool,
    pub easy_framing: bool,
    pub field_active: bool,
    pub crypto1: bool,
    pub infinite_select: bool,
    pub auto_iso14443_4: bool,
    pub accept_invalid_frames: bool,
    pub accept_multiple_frames: bool,
    pub force_iso14443a: bool,
    pub force_iso14443b: bool,
    pub force_speed_106: bool,
    /// Cached CIU_BitFraming TxLastBits value
    pub tx_bits: u8,
    /// Cached SetParameters flag byte
    pub parameters: u8,
    /// Status code of the last status-coded command (0 = clean)
    pub last_status: u8,
    /// Host-side wait for a command response
    pub command_timeout: Duration,
    /// Target-activation timeout index (RFConfiguration timings)
    pub timeout_atr: u8,
    /// Data-exchange timeout index (RFConfiguration timings)
    pub timeout_com: u8,
}

impl ChipState {
    pub fn new(variant: ChipVariant) -> Self {
        Self {
            variant,
            handle_crc: true,
            handle_parity: true,
            easy_framing: true,
            field_active: false,
            crypto1: false,
            infinite_select: false,
            auto_iso14443_4: true,
            accept_invalid_frames: false,
            accept_multiple_frames: false,
            force_iso14443a: false,
            force_iso14443b: false,
            force_speed_106: false,
            tx_bits: 0,
            parameters: PARAM_AUTO_ATR_RES | PARAM_AUTO_RATS,
            last_status: 0,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            timeout_atr: 0x0B,
            timeout_com: 0x0A,
        }
    }
}

/// Send one chip command (`opcode | args`, no direction byte) and return
/// the response body. For status-coded opcodes the leading status byte is
/// checked and left in place for the caller.
pub fn transceive(
    drv: &mut dyn Driver,
    st: &mut ChipState,
    cmd: &[u8],
    timeout: Duration,
) -> Result<Vec<u8>> {
    if cmd.is_empty() {
        return Err(Error::InvalidArgument("empty chip command"));
    }

    let mut tx = Vec::with_capacity(cmd.len() + 1);
    tx.push(DIR_HOST_TO_CHIP);
    tx.extend_from_slice(cmd);
    log::trace!("chip tx: {}", bytes_to_hex_spaced(&tx));

    let rx = drv.transceive(&tx, timeout)?;
    log::trace!("chip rx: {}", bytes_to_hex_spaced(&rx));

    if opcodes::has_status_byte(cmd[0]) {
        let status = rx.first().copied().unwrap_or(0) & 0x3F;
        st.last_status = status;
        if status != 0 {
            return Err(Error::Chip(ChipError::from_code(status)));
        }
    } else {
        st.last_status = 0;
    }

    Ok(rx)
}

/// Read a single CIU register.
pub fn read_register(drv: &mut dyn Driver, st: &mut ChipState, address: u16) -> Result<u8> {
    let cmd = [
        opcodes::READ_REGISTER,
        (address >> 8) as u8,
        address as u8,
    ];
    let timeout = st.command_timeout;
    let rx = transceive(drv, st, &cmd, timeout)?;
    // The PN533 prepends a status byte the earlier variants omit.
    match rx.len() {
        0 => Err(Error::FrameFormat("empty register read")),
        1 => Ok(rx[0]),
        _ => Ok(rx[rx.len() - 1]),
    }
}

/// Write the masked bits of a CIU register, reading first when the mask
/// leaves other bits intact.
pub fn write_register_mask(
    drv: &mut dyn Driver,
    st: &mut ChipState,
    address: u16,
    mask: u8,
    value: u8,
) -> Result<()> {
    let value = if mask != 0xFF {
        let current = read_register(drv, st, address)?;
        (value & mask) | (current & !mask)
    } else {
        value
    };
    let cmd = [
        opcodes::WRITE_REGISTER,
        (address >> 8) as u8,
        address as u8,
        value,
    ];
    let timeout = st.command_timeout;
    transceive(drv, st, &cmd, timeout)?;
    Ok(())
}

/// Replace the SetParameters flag byte and cache it.
pub fn set_parameters(drv: &mut dyn Driver, st: &mut ChipState, flags: u8) -> Result<()> {
    let timeout = st.command_timeout;
    transceive(drv, st, &[opcodes::SET_PARAMETERS, flags], timeout)?;
    st.parameters = flags;
    Ok(())
}

/// Set or clear one SetParameters flag, reusing the cached byte.
pub fn set_parameter_bit(
    drv: &mut dyn Driver,
    st: &mut ChipState,
    bit: u8,
    enable: bool,
) -> Result<()> {
    let flags = if enable {
        st.parameters | bit
    } else {
        st.parameters & !bit
    };
    if flags == st.parameters {
        return Ok(());
    }
    set_parameters(drv, st, flags)
}

/// Put the PN532 SAM companion in normal (pass-through) mode. A no-op on
/// the other variants, which have no SAM interface.
pub fn sam_configuration(drv: &mut dyn Driver, st: &mut ChipState) -> Result<()> {
    if st.variant != ChipVariant::Pn532 {
        return Ok(());
    }
    let timeout = st.command_timeout;
    transceive(drv, st, &[opcodes::SAM_CONFIGURATION, 0x01], timeout)?;
    Ok(())
}

/// RFConfiguration with an arbitrary item payload.
pub fn rf_configuration(
    drv: &mut dyn Driver,
    st: &mut ChipState,
    item: u8,
    data: &[u8],
) -> Result<()> {
    let mut cmd = Vec::with_capacity(2 + data.len());
    cmd.push(opcodes::RF_CONFIGURATION);
    cmd.push(item);
    cmd.extend_from_slice(data);
    let timeout = st.command_timeout;
    transceive(drv, st, &cmd, timeout)?;
    Ok(())
}

/// Energize or drop the RF field.
pub fn rf_field(drv: &mut dyn Driver, st: &mut ChipState, on: bool) -> Result<()> {
    rf_configuration(drv, st, RFCI_FIELD, &[on as u8])?;
    st.field_active = on;
    Ok(())
}

/// Push the cached per-phase timeouts to the chip.
fn rf_timings(drv: &mut dyn Driver, st: &mut ChipState) -> Result<()> {
    let data = [0x00, st.timeout_atr, st.timeout_com];
    rf_configuration(drv, st, RFCI_TIMINGS, &data)
}

/// Convert a millisecond timeout to the chip's exponential index:
/// index n covers 100 us * 2^(n-1), 0 disables the timeout.
pub fn timeout_to_index(ms: i32) -> u8 {
    if ms <= 0 {
        return 0;
    }
    let us = (ms as u64) * 1000;
    let mut index = 1u8;
    let mut span = 100u64;
    while span < us && index < 0x10 {
        span *= 2;
        index += 1;
    }
    index
}

/// Update the TxLastBits field only when it differs from the cache. The
/// cache is written after the register, so a failed write leaves it
/// untouched.
pub fn set_tx_bits(drv: &mut dyn Driver, st: &mut ChipState, bits: u8) -> Result<()> {
    if st.tx_bits == bits {
        return Ok(());
    }
    write_register_mask(drv, st, reg::CIU_BIT_FRAMING, reg::SYMBOL_TX_LAST_BITS, bits)?;
    st.tx_bits = bits;
    Ok(())
}

/// Query the firmware and identify the chip variant. The PN531 answers
/// with a bare 2-byte version; PN532/PN533 prepend an IC byte.
pub fn firmware_version(
    drv: &mut dyn Driver,
    st: &mut ChipState,
    timeout: Duration,
) -> Result<(ChipVariant, String)> {
    let rx = transceive(drv, st, &[opcodes::GET_FIRMWARE_VERSION], timeout)?;
    match rx.len() {
        2 => Ok((
            ChipVariant::Pn531,
            format!("PN531 v{}.{}", rx[0], rx[1]),
        )),
        n if n >= 4 => {
            let variant = ChipVariant::from_ic_byte(rx[0])
                .ok_or(Error::FrameFormat("unknown IC byte in firmware reply"))?;
            Ok((variant, format!("{} v{}.{}", variant.name(), rx[1], rx[2])))
        }
        _ => Err(Error::FrameFormat("short firmware reply")),
    }
}

/// Bring the chip to its lowest-power idle state.
pub fn idle(drv: &mut dyn Driver, st: &mut ChipState) -> Result<()> {
    if st.field_active {
        rf_field(drv, st, false)?;
    }
    if st.variant == ChipVariant::Pn532 {
        // Wake up on HSU or I2C activity
        let timeout = st.command_timeout;
        transceive(drv, st, &[opcodes::POWER_DOWN, 0x30], timeout)?;
    }
    Ok(())
}

/// Apply a boolean property: register/parameter write first, cache flag
/// after, so a rejected write leaves the cached value unchanged.
pub fn set_property_bool(
    drv: &mut dyn Driver,
    st: &mut ChipState,
    property: Property,
    enable: bool,
) -> Result<()> {
    match property {
        Property::HandleCrc => {
            if st.handle_crc == enable {
                return Ok(());
            }
            let value = if enable { reg::SYMBOL_TX_CRC_EN } else { 0 };
            write_register_mask(drv, st, reg::CIU_TX_MODE, reg::SYMBOL_TX_CRC_EN, value)?;
            write_register_mask(drv, st, reg::CIU_RX_MODE, reg::SYMBOL_RX_CRC_EN, value)?;
            st.handle_crc = enable;
        }
        Property::HandleParity => {
            if st.handle_parity == enable {
                return Ok(());
            }
            // ParityDisable is the inverse of "chip handles parity"
            let value = if enable { 0 } else { reg::SYMBOL_PARITY_DISABLE };
            write_register_mask(
                drv,
                st,
                reg::CIU_MANUAL_RCV,
                reg::SYMBOL_PARITY_DISABLE,
                value,
            )?;
            st.handle_parity = enable;
        }
        Property::ActivateField => {
            rf_field(drv, st, enable)?;
        }
        Property::ActivateCrypto1 => {
            let value = if enable { reg::SYMBOL_MF_CRYPTO1_ON } else { 0 };
            write_register_mask(drv, st, reg::CIU_STATUS2, reg::SYMBOL_MF_CRYPTO1_ON, value)?;
            st.crypto1 = enable;
        }
        Property::InfiniteSelect => {
            // MxRtyATR, MxRtyPSL, MxRtyPassiveActivation
            let retries: [u8; 3] = if enable {
                [0xFF, 0xFF, 0xFF]
            } else {
                [0x00, 0x01, 0x02]
            };
            rf_configuration(drv, st, RFCI_RETRY_SELECT, &retries)?;
            st.infinite_select = enable;
        }
        Property::AcceptInvalidFrames => {
            let value = if enable { reg::SYMBOL_RX_NO_ERROR } else { 0 };
            write_register_mask(drv, st, reg::CIU_RX_MODE, reg::SYMBOL_RX_NO_ERROR, value)?;
            st.accept_invalid_frames = enable;
        }
        Property::AcceptMultipleFrames => {
            let value = if enable { reg::SYMBOL_RX_MULTIPLE } else { 0 };
            write_register_mask(drv, st, reg::CIU_RX_MODE, reg::SYMBOL_RX_MULTIPLE, value)?;
            st.accept_multiple_frames = enable;
        }
        Property::AutoIso14443_4 => {
            set_parameter_bit(drv, st, PARAM_AUTO_RATS, enable)?;
            st.auto_iso14443_4 = enable;
        }
        Property::EasyFraming => {
            // Host-side framing choice (InDataExchange vs
            // InCommunicateThru); no chip traffic involved
            st.easy_framing = enable;
        }
        Property::ForceIso14443a => {
            if enable {
                write_register_mask(
                    drv,
                    st,
                    reg::CIU_TX_MODE,
                    reg::SYMBOL_TX_FRAMING,
                    reg::framing::ISO14443A,
                )?;
                write_register_mask(
                    drv,
                    st,
                    reg::CIU_RX_MODE,
                    reg::SYMBOL_RX_FRAMING,
                    reg::framing::ISO14443A,
                )?;
            }
            st.force_iso14443a = enable;
            if enable {
                st.force_iso14443b = false;
            }
        }
        Property::ForceIso14443b => {
            if enable {
                write_register_mask(
                    drv,
                    st,
                    reg::CIU_TX_MODE,
                    reg::SYMBOL_TX_FRAMING,
                    reg::framing::ISO14443B,
                )?;
                write_register_mask(
                    drv,
                    st,
                    reg::CIU_RX_MODE,
                    reg::SYMBOL_RX_FRAMING,
                    reg::framing::ISO14443B,
                )?;
            }
            st.force_iso14443b = enable;
            if enable {
                st.force_iso14443a = false;
            }
        }
        Property::ForceSpeed106 => {
            if enable {
                write_register_mask(
                    drv,
                    st,
                    reg::CIU_TX_MODE,
                    reg::SYMBOL_TX_SPEED,
                    reg::speed_bits(106),
                )?;
                write_register_mask(
                    drv,
                    st,
                    reg::CIU_RX_MODE,
                    reg::SYMBOL_RX_SPEED,
                    reg::speed_bits(106),
                )?;
            }
            st.force_speed_106 = enable;
        }
        Property::TimeoutCommand | Property::TimeoutAtr | Property::TimeoutCom => {
            return Err(Error::InvalidArgument("integer property set as bool"));
        }
    }
    Ok(())
}

/// Read back the cached value of a boolean property.
pub fn get_property_bool(st: &ChipState, property: Property) -> Result<bool> {
    Ok(match property {
        Property::HandleCrc => st.handle_crc,
        Property::HandleParity => st.handle_parity,
        Property::ActivateField => st.field_active,
        Property::ActivateCrypto1 => st.crypto1,
        Property::InfiniteSelect => st.infinite_select,
        Property::AcceptInvalidFrames => st.accept_invalid_frames,
        Property::AcceptMultipleFrames => st.accept_multiple_frames,
        Property::AutoIso14443_4 => st.auto_iso14443_4,
        Property::EasyFraming => st.easy_framing,
        Property::ForceIso14443a => st.force_iso14443a,
        Property::ForceIso14443b => st.force_iso14443b,
        Property::ForceSpeed106 => st.force_speed_106,
        _ => return Err(Error::InvalidArgument("integer property read as bool")),
    })
}

/// Apply an integer property (the per-phase timeouts, in milliseconds).
pub fn set_property_int(
    drv: &mut dyn Driver,
    st: &mut ChipState,
    property: Property,
    value: i32,
) -> Result<()> {
    match property {
        Property::TimeoutCommand => {
            if value < 0 {
                return Err(Error::InvalidArgument("negative timeout"));
            }
            st.command_timeout = if value == 0 {
                DEFAULT_COMMAND_TIMEOUT
            } else {
                Duration::from_millis(value as u64)
            };
            Ok(())
        }
        Property::TimeoutAtr => {
            let prev = st.timeout_atr;
            st.timeout_atr = timeout_to_index(value);
            if let Err(e) = rf_timings(drv, st) {
                st.timeout_atr = prev;
                return Err(e);
            }
            Ok(())
        }
        Property::TimeoutCom => {
            let prev = st.timeout_com;
            st.timeout_com = timeout_to_index(value);
            if let Err(e) = rf_timings(drv, st) {
                st.timeout_com = prev;
                return Err(e);
            }
            Ok(())
        }
        _ => Err(Error::InvalidArgument("boolean property set as int")),
    }
}

/// Canonical reader bring-up: SAM pass-through, the standard property
/// run (field drop/raise, infinite select, auto ISO14443-4, type A at
/// 106 kbps, strict frames, chip CRC/parity, easy framing, Crypto1 off)
/// and the CIU initiator bit.
pub fn initiator_init(drv: &mut dyn Driver, st: &mut ChipState) -> Result<()> {
    sam_configuration(drv, st)?;

    set_property_bool(drv, st, Property::ActivateField, false)?;
    set_property_bool(drv, st, Property::ActivateField, true)?;
    set_property_bool(drv, st, Property::InfiniteSelect, true)?;
    set_property_bool(drv, st, Property::AutoIso14443_4, true)?;
    set_property_bool(drv, st, Property::ForceIso14443a, true)?;
    set_property_bool(drv, st, Property::ForceSpeed106, true)?;
    set_property_bool(drv, st, Property::AcceptInvalidFrames, false)?;
    set_property_bool(drv, st, Property::AcceptMultipleFrames, false)?;
    set_property_bool(drv, st, Property::HandleCrc, true)?;
    set_property_bool(drv, st, Property::HandleParity, true)?;
    set_property_bool(drv, st, Property::EasyFraming, true)?;
    set_property_bool(drv, st, Property::ActivateCrypto1, false)?;

    write_register_mask(
        drv,
        st,
        reg::CIU_CONTROL,
        reg::SYMBOL_INITIATOR,
        reg::SYMBOL_INITIATOR,
    )?;
    rf_timings(drv, st)
}
