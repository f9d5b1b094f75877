// libnfc-rs/libnfc/src/chip/registers.rs

//! CIU (Contactless Interface Unit) register addresses and the bit
//! symbols the engine manipulates. Addresses are the SFR-mapped 16-bit
//! values accepted by ReadRegister/WriteRegister.

pub const CIU_TX_MODE: u16 = 0x6302;
pub const CIU_RX_MODE: u16 = 0x6303;
pub const CIU_TX_AUTO: u16 = 0x6305;
pub const CIU_MANUAL_RCV: u16 = 0x630D;
pub const CIU_STATUS2: u16 = 0x6338;
pub const CIU_BIT_FRAMING: u16 = 0x633D;
pub const CIU_CONTROL: u16 = 0x633C;
pub const CIU_T_MODE: u16 = 0x632A;
pub const CIU_T_PRESCALER: u16 = 0x632B;
pub const CIU_T_RELOAD_HI: u16 = 0x632C;
pub const CIU_T_RELOAD_LO: u16 = 0x632D;
pub const CIU_T_COUNTER_HI: u16 = 0x632E;
pub const CIU_T_COUNTER_LO: u16 = 0x632F;

// CIU_TxMode / CIU_RxMode
pub const SYMBOL_TX_CRC_EN: u8 = 0x80;
pub const SYMBOL_RX_CRC_EN: u8 = 0x80;
pub const SYMBOL_TX_SPEED: u8 = 0x70;
pub const SYMBOL_RX_SPEED: u8 = 0x70;
pub const SYMBOL_TX_FRAMING: u8 = 0x03;
pub const SYMBOL_RX_FRAMING: u8 = 0x03;
pub const SYMBOL_RX_NO_ERROR: u8 = 0x08;
pub const SYMBOL_RX_MULTIPLE: u8 = 0x04;

// CIU_ManualRCV
pub const SYMBOL_PARITY_DISABLE: u8 = 0x10;

// CIU_Status2
pub const SYMBOL_MF_CRYPTO1_ON: u8 = 0x08;

// CIU_BitFraming
pub const SYMBOL_TX_LAST_BITS: u8 = 0x07;

// CIU_Control
pub const SYMBOL_INITIATOR: u8 = 0x10;

// CIU_TMode
pub const SYMBOL_TAUTO: u8 = 0x80;

/// Speed field value (both Tx and Rx) for a baud rate, pre-shifted.
pub fn speed_bits(kbps: u16) -> u8 {
    match kbps {
        106 => 0x00,
        212 => 0x10,
        424 => 0x20,
        847 => 0x30,
        _ => 0x00,
    }
}

/// Framing field value for a modulation family.
pub mod framing {
    pub const ISO14443A: u8 = 0x00;
    pub const ACTIVE: u8 = 0x01;
    pub const FELICA: u8 = 0x02;
    pub const ISO14443B: u8 = 0x03;
}
