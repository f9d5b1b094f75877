// libnfc-rs/libnfc/src/target.rs

//! Decoder for the byte layouts the chip returns per modulation family:
//! InListPassiveTarget entries, InAutoPoll entries and ATR_RES payloads.

use crate::constants::CASCADE_TAG;
use crate::types::{BaudRate, ChipVariant, Modulation, ModulationType};
use crate::{Error, Result};

/// ISO/IEC 14443 Type A tag (MIFARE family).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iso14443aTarget {
    pub atqa: [u8; 2],
    pub sak: u8,
    /// 4, 7 or 10 bytes, cascade tags stripped
    pub uid: Vec<u8>,
    /// Answer-to-select, empty when the tag sent none
    pub ats: Vec<u8>,
}

/// ISO/IEC 14443 Type B tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iso14443bTarget {
    pub atqb: [u8; 12],
    pub id: [u8; 4],
    pub params: [u8; 4],
    /// Higher-layer response, empty when absent
    pub inf: Vec<u8>,
}

/// FeliCa tag (212/424 kbps).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FelicaTarget {
    pub len: u8,
    pub res_code: u8,
    /// NFCID2
    pub id: [u8; 8],
    pub pad: [u8; 8],
    pub sys_code: Option<[u8; 2]>,
}

/// Innovision Jewel / Topaz tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JewelTarget {
    pub sens_res: [u8; 2],
    pub id: [u8; 4],
}

/// NFCIP DEP peer, decoded from an ATR_RES.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepTarget {
    pub nfcid3: [u8; 10],
    pub did: u8,
    pub bs: u8,
    pub br: u8,
    pub to: u8,
    pub pp: u8,
    /// General bytes, empty when absent
    pub gb: Vec<u8>,
}

/// A discovered target, tagged by modulation family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Iso14443a(Iso14443aTarget),
    Iso14443b(Iso14443bTarget),
    Felica(FelicaTarget),
    Jewel(JewelTarget),
    Dep(DepTarget),
}

fn ensure_len(data: &[u8], min: usize) -> Result<()> {
    if data.len() < min {
        return Err(Error::FrameFormat("target payload too short"));
    }
    Ok(())
}

/// Strip cascade tags from a raw UID: `88 x x x …` marks a continuation,
/// so 8 raw bytes carry a 7-byte UID and 12 raw bytes (two tags) a
/// 10-byte one.
pub fn strip_cascade(raw: &[u8]) -> Vec<u8> {
    match raw.len() {
        8 if raw[0] == CASCADE_TAG => raw[1..].to_vec(),
        12 if raw[0] == CASCADE_TAG && raw[4] == CASCADE_TAG => {
            let mut uid = Vec::with_capacity(10);
            uid.extend_from_slice(&raw[1..4]);
            uid.extend_from_slice(&raw[5..]);
            uid
        }
        7 if raw[0] == CASCADE_TAG => raw[1..].to_vec(),
        _ => raw.to_vec(),
    }
}

/// Inverse of [`strip_cascade`]: rebuild the InitData form of a UID for
/// re-selecting a specific tag (7 and 10 byte UIDs regain their tags).
pub fn cascade_uid(uid: &[u8]) -> Result<Vec<u8>> {
    match uid.len() {
        4 => Ok(uid.to_vec()),
        7 => {
            let mut out = Vec::with_capacity(8);
            out.push(CASCADE_TAG);
            out.extend_from_slice(uid);
            Ok(out)
        }
        10 => {
            let mut out = Vec::with_capacity(12);
            out.push(CASCADE_TAG);
            out.extend_from_slice(&uid[..3]);
            out.push(CASCADE_TAG);
            out.extend_from_slice(&uid[3..]);
            Ok(out)
        }
        _ => Err(Error::InvalidArgument("uid must be 4, 7 or 10 bytes")),
    }
}

/// Decode one InListPassiveTarget entry. `raw` starts at the target
/// number (Tg); `chip` matters because the PN531 delivers the two ATQA
/// bytes swapped.
pub fn decode_target(raw: &[u8], modulation: Modulation, chip: ChipVariant) -> Result<Target> {
    ensure_len(raw, 1)?;
    decode_target_body(&raw[1..], modulation, chip)
}

fn decode_target_body(raw: &[u8], modulation: Modulation, chip: ChipVariant) -> Result<Target> {
    match modulation.modulation_type {
        ModulationType::Iso14443a => decode_iso14443a(raw, chip).map(Target::Iso14443a),
        ModulationType::Iso14443b => decode_iso14443b(raw).map(Target::Iso14443b),
        ModulationType::Felica => decode_felica(raw).map(Target::Felica),
        ModulationType::Jewel => decode_jewel(raw).map(Target::Jewel),
        ModulationType::Dep => decode_atr_res(raw).map(Target::Dep),
        _ => Err(Error::NotSupported("modulation has no list layout")),
    }
}

fn decode_iso14443a(raw: &[u8], chip: ChipVariant) -> Result<Iso14443aTarget> {
    // ATQA + SAK + UID length byte
    ensure_len(raw, 4)?;
    let atqa = if chip == ChipVariant::Pn531 {
        // The PN531 delivers the ATQA bytes swapped
        [raw[1], raw[0]]
    } else {
        [raw[0], raw[1]]
    };
    let sak = raw[2];
    let uid_len = raw[3] as usize;
    ensure_len(raw, 4 + uid_len)?;
    let uid = strip_cascade(&raw[4..4 + uid_len]);

    let mut ats = Vec::new();
    if raw.len() > 4 + uid_len {
        // The ATS length byte counts itself
        let ats_len = (raw[4 + uid_len] as usize).saturating_sub(1);
        ensure_len(raw, 5 + uid_len + ats_len)?;
        ats.extend_from_slice(&raw[5 + uid_len..5 + uid_len + ats_len]);
    }

    Ok(Iso14443aTarget {
        atqa,
        sak,
        uid,
        ats,
    })
}

fn decode_iso14443b(raw: &[u8]) -> Result<Iso14443bTarget> {
    // ATQB + ATTRIB_RES length + ID + params
    ensure_len(raw, 21)?;
    let mut atqb = [0u8; 12];
    atqb.copy_from_slice(&raw[..12]);
    let attrib_res_len = raw[12];
    let mut id = [0u8; 4];
    id.copy_from_slice(&raw[13..17]);
    let mut params = [0u8; 4];
    params.copy_from_slice(&raw[17..21]);

    let mut inf = Vec::new();
    if attrib_res_len > 8 {
        ensure_len(raw, 22)?;
        let inf_len = raw[21] as usize;
        ensure_len(raw, 22 + inf_len)?;
        inf.extend_from_slice(&raw[22..22 + inf_len]);
    }

    Ok(Iso14443bTarget {
        atqb,
        id,
        params,
        inf,
    })
}

fn decode_felica(raw: &[u8]) -> Result<FelicaTarget> {
    ensure_len(raw, 18)?;
    let len = raw[0];
    let res_code = raw[1];
    let mut id = [0u8; 8];
    id.copy_from_slice(&raw[2..10]);
    let mut pad = [0u8; 8];
    pad.copy_from_slice(&raw[10..18]);

    let sys_code = if len > 18 {
        ensure_len(raw, 20)?;
        Some([raw[18], raw[19]])
    } else {
        None
    };

    Ok(FelicaTarget {
        len,
        res_code,
        id,
        pad,
        sys_code,
    })
}

fn decode_jewel(raw: &[u8]) -> Result<JewelTarget> {
    ensure_len(raw, 6)?;
    Ok(JewelTarget {
        sens_res: [raw[0], raw[1]],
        id: [raw[2], raw[3], raw[4], raw[5]],
    })
}

/// Decode an ATR_RES body (after status and Tg): NFCID3, DID, BS, BR,
/// TO, PP, general bytes.
pub fn decode_atr_res(raw: &[u8]) -> Result<DepTarget> {
    ensure_len(raw, 15)?;
    let mut nfcid3 = [0u8; 10];
    nfcid3.copy_from_slice(&raw[..10]);
    Ok(DepTarget {
        nfcid3,
        did: raw[10],
        bs: raw[11],
        br: raw[12],
        to: raw[13],
        pp: raw[14],
        gb: raw[15..].to_vec(),
    })
}

/// Decode one InAutoPoll entry (`type | len | target data`), returning
/// the modulation the chip reported along with the target.
pub fn decode_autopoll_entry(
    raw: &[u8],
    chip: ChipVariant,
) -> Result<(Modulation, Target, usize)> {
    ensure_len(raw, 2)?;
    let poll_type = raw[0];
    let len = raw[1] as usize;
    ensure_len(raw, 2 + len)?;
    let modulation = Modulation::from_poll_type(poll_type)
        .ok_or(Error::NotSupported("unknown poll target type"))?;
    let body = &raw[2..2 + len];
    // Entries for tag families carry the Tg byte first, like
    // InListPassiveTarget
    let target = decode_target(body, modulation, chip)?;
    Ok((modulation, target, 2 + len))
}

impl Target {
    /// Modulation family this target was decoded from.
    pub fn modulation_type(&self) -> ModulationType {
        match self {
            Target::Iso14443a(_) => ModulationType::Iso14443a,
            Target::Iso14443b(_) => ModulationType::Iso14443b,
            Target::Felica(_) => ModulationType::Felica,
            Target::Jewel(_) => ModulationType::Jewel,
            Target::Dep(_) => ModulationType::Dep,
        }
    }

    /// The bytes a caller would feed back as InitData to re-select this
    /// exact target, where the family supports it.
    pub fn reselect_data(&self) -> Result<Vec<u8>> {
        match self {
            Target::Iso14443a(t) => cascade_uid(&t.uid),
            Target::Felica(t) => {
                let mut data = vec![0x00];
                data.extend_from_slice(match &t.sys_code {
                    Some(sc) => sc,
                    None => &[0xFF, 0xFF],
                });
                data.extend_from_slice(&[0x01, 0x00]);
                Ok(data)
            }
            _ => Err(Error::NotSupported("target family cannot be re-selected")),
        }
    }
}

/// Default modulation used when decoding FeliCa poll results at either
/// baud; the payload layout is identical.
pub fn felica_modulation(baud: BaudRate) -> Modulation {
    Modulation::new(ModulationType::Felica, baud)
}
