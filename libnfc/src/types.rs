// libnfc-rs/libnfc/src/types.rs

use crate::{Error, Result};

/// PN53x chip variant, discovered from the GetFirmwareVersion reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipVariant {
    Pn531,
    Pn532,
    Pn533,
}

impl ChipVariant {
    /// Map the IC byte of a GetFirmwareVersion reply. A PN531 answers with
    /// a bare 2-byte version and no IC byte; callers detect that case from
    /// the reply length before asking here.
    pub fn from_ic_byte(ic: u8) -> Option<Self> {
        match ic {
            0x31 => Some(Self::Pn531),
            0x32 => Some(Self::Pn532),
            0x33 => Some(Self::Pn533),
            _ => None,
        }
    }

    /// Display name as printed on the package.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pn531 => "PN531",
            Self::Pn532 => "PN532",
            Self::Pn533 => "PN533",
        }
    }
}

/// RF baud rate of a modulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaudRate {
    B106,
    B212,
    B424,
    B847,
}

impl BaudRate {
    /// Numeric kbps value.
    pub fn kbps(&self) -> u16 {
        match self {
            Self::B106 => 106,
            Self::B212 => 212,
            Self::B424 => 424,
            Self::B847 => 847,
        }
    }
}

/// Modulation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModulationType {
    Iso14443a,
    Iso14443b,
    /// ISO14443-B' (legacy Calypso)
    Iso14443bPrime,
    /// ISO14443-B-2 ST SRx
    Iso14443b2Sr,
    /// ISO14443-B-2 ASK CTx
    Iso14443b2Ct,
    Felica,
    Jewel,
    Dep,
}

/// A (type, baud) modulation pair. Not every pair is legal on every chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Modulation {
    pub modulation_type: ModulationType,
    pub baud_rate: BaudRate,
}

impl Modulation {
    pub const fn new(modulation_type: ModulationType, baud_rate: BaudRate) -> Self {
        Self {
            modulation_type,
            baud_rate,
        }
    }

    /// The BrTy byte used by InListPassiveTarget for this modulation.
    pub fn brty(&self) -> Result<u8> {
        use BaudRate::*;
        use ModulationType::*;
        match (self.modulation_type, self.baud_rate) {
            (Iso14443a, B106) => Ok(0x00),
            (Felica, B212) => Ok(0x01),
            (Felica, B424) => Ok(0x02),
            (Iso14443b, B106) => Ok(0x03),
            (Jewel, B106) => Ok(0x04),
            _ => Err(Error::NotSupported("modulation/baud combination")),
        }
    }

    /// Whether the chip variant can poll this modulation at all.
    pub fn supported_by(&self, chip: ChipVariant) -> bool {
        use ModulationType::*;
        match self.modulation_type {
            Iso14443a => self.baud_rate == BaudRate::B106,
            Felica => matches!(self.baud_rate, BaudRate::B212 | BaudRate::B424),
            Iso14443b => {
                chip != ChipVariant::Pn531
                    && (self.baud_rate == BaudRate::B106
                        || (chip == ChipVariant::Pn533 && self.baud_rate == BaudRate::B847))
            }
            Jewel => chip != ChipVariant::Pn531 && self.baud_rate == BaudRate::B106,
            Dep => self.baud_rate != BaudRate::B847,
            Iso14443bPrime | Iso14443b2Sr | Iso14443b2Ct => false,
        }
    }

    /// True when the chip cannot deselect a tag of this family, so target
    /// enumeration must stop after the first hit.
    pub fn single_shot(&self) -> bool {
        matches!(
            self.modulation_type,
            ModulationType::Felica
                | ModulationType::Jewel
                | ModulationType::Iso14443bPrime
                | ModulationType::Iso14443b2Sr
                | ModulationType::Iso14443b2Ct
        )
    }

    /// The target-type byte used by InAutoPoll for this modulation.
    pub fn poll_type(&self) -> Result<u8> {
        use BaudRate::*;
        use ModulationType::*;
        match (self.modulation_type, self.baud_rate) {
            (Iso14443a, B106) => Ok(0x10),
            (Felica, B212) => Ok(0x11),
            (Felica, B424) => Ok(0x12),
            (Iso14443b, B106) => Ok(0x23),
            (Jewel, B106) => Ok(0x04),
            _ => Err(Error::NotSupported("modulation/baud combination")),
        }
    }

    /// Inverse of `poll_type`, for decoding InAutoPoll results.
    pub fn from_poll_type(ty: u8) -> Option<Self> {
        use BaudRate::*;
        use ModulationType::*;
        match ty & 0x3F {
            0x00 | 0x10 | 0x20 => Some(Self::new(Iso14443a, B106)),
            0x11 => Some(Self::new(Felica, B212)),
            0x12 => Some(Self::new(Felica, B424)),
            0x03 | 0x23 => Some(Self::new(Iso14443b, B106)),
            0x04 => Some(Self::new(Jewel, B106)),
            _ => None,
        }
    }
}

/// Configurable device option. Booleans go through
/// [`Device::set_property_bool`](crate::device::Device::set_property_bool),
/// the timeouts through
/// [`Device::set_property_int`](crate::device::Device::set_property_int).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    /// Chip computes/validates the ISO CRC on TX and RX
    HandleCrc,
    /// Chip computes/validates the 8th parity bit of every byte
    HandleParity,
    /// Energize the RF antenna
    ActivateField,
    /// MIFARE Crypto1 cipher on
    ActivateCrypto1,
    /// Poll forever instead of a bounded number of attempts
    InfiniteSelect,
    /// Pass malformed frames up to the host
    AcceptInvalidFrames,
    /// Do not clear the FIFO between frames
    AcceptMultipleFrames,
    /// Automatic RATS after SEL
    AutoIso14443_4,
    /// Chip prepends/strips the ISO-DEP framing layer
    EasyFraming,
    /// Restrict modulation to ISO14443-A
    ForceIso14443a,
    /// Restrict modulation to ISO14443-B
    ForceIso14443b,
    /// Restrict baud to 106 kbps
    ForceSpeed106,
    /// Timeout for command processing (ms)
    TimeoutCommand,
    /// Timeout for target activation (ms)
    TimeoutAtr,
    /// Timeout for data exchange (ms)
    TimeoutCom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chip_variant_from_ic() {
        assert_eq!(ChipVariant::from_ic_byte(0x32), Some(ChipVariant::Pn532));
        assert_eq!(ChipVariant::from_ic_byte(0x33), Some(ChipVariant::Pn533));
        assert_eq!(ChipVariant::from_ic_byte(0x99), None);
    }

    #[test]
    fn brty_mapping() {
        let m = Modulation::new(ModulationType::Iso14443a, BaudRate::B106);
        assert_eq!(m.brty().unwrap(), 0x00);
        let m = Modulation::new(ModulationType::Felica, BaudRate::B424);
        assert_eq!(m.brty().unwrap(), 0x02);
        let m = Modulation::new(ModulationType::Felica, BaudRate::B106);
        assert!(matches!(m.brty(), Err(Error::NotSupported(_))));
    }

    #[test]
    fn chip_support_table() {
        let b = Modulation::new(ModulationType::Iso14443b, BaudRate::B106);
        assert!(!b.supported_by(ChipVariant::Pn531));
        assert!(b.supported_by(ChipVariant::Pn532));

        let b847 = Modulation::new(ModulationType::Iso14443b, BaudRate::B847);
        assert!(!b847.supported_by(ChipVariant::Pn532));
        assert!(b847.supported_by(ChipVariant::Pn533));

        let jewel = Modulation::new(ModulationType::Jewel, BaudRate::B106);
        assert!(!jewel.supported_by(ChipVariant::Pn531));
        assert!(jewel.supported_by(ChipVariant::Pn533));
    }

    #[test]
    fn single_shot_families() {
        assert!(Modulation::new(ModulationType::Felica, BaudRate::B212).single_shot());
        assert!(Modulation::new(ModulationType::Jewel, BaudRate::B106).single_shot());
        assert!(!Modulation::new(ModulationType::Iso14443a, BaudRate::B106).single_shot());
    }

    #[test]
    fn poll_type_roundtrip() {
        let m = Modulation::new(ModulationType::Felica, BaudRate::B212);
        assert_eq!(
            Modulation::from_poll_type(m.poll_type().unwrap()),
            Some(m)
        );
        // The ISO14443-4 flavours fold back onto plain type A
        assert_eq!(
            Modulation::from_poll_type(0x20),
            Some(Modulation::new(ModulationType::Iso14443a, BaudRate::B106))
        );
    }
}
