// libnfc-rs/libnfc/src/prelude.rs

//! Convenience re-exports for consumers:
//! `use libnfc::prelude::*;`

pub use crate::device::Device;
pub use crate::error::{ChipError, Error, Result};
pub use crate::target::{
    DepTarget, FelicaTarget, Iso14443aTarget, Iso14443bTarget, JewelTarget, Target,
};
pub use crate::types::{BaudRate, ChipVariant, Modulation, ModulationType, Property};
