//! Built-in gamma curves and the routine that loads one into the ISP.

use thiserror::Error;
use tracing::{debug, warn};

use crate::bus::{RegisterBus, REGISTER_STRIDE};
use crate::error::BusFault;

/// Number of built-in curves.
pub const GAMMA_SETS: usize = 3;
/// Words per curve; each word packs four 8-bit samples.
pub const GAMMA_POINTS: usize = 64;
/// Offset of the lookup table from the image-correction block base.
pub const GAMMA_TABLE_OFFSET: u32 = 0x300;

/// Status returned for a set index with no matching preset.
pub const STATUS_INVALID_SELECTION: u8 = 1;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GammaError {
    #[error("no gamma set {0}")]
    InvalidSelection(usize),
    #[error(transparent)]
    Bus(#[from] BusFault),
}

impl GammaError {
    /// Numeric status as seen by callers that only deal in codes; success is 0.
    pub fn status(&self) -> u8 {
        match self {
            GammaError::InvalidSelection(_) => STATUS_INVALID_SELECTION,
            GammaError::Bus(fault) => fault.status,
        }
    }
}

/// A 256-entry curve stored as 64 little-endian packed words.
#[derive(Debug, PartialEq, Eq)]
pub struct GammaTable {
    name: &'static str,
    words: [u32; GAMMA_POINTS],
}

impl GammaTable {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn words(&self) -> &[u32; GAMMA_POINTS] {
        &self.words
    }

    /// Output samples in input order, lowest byte of each word first.
    pub fn samples(&self) -> impl Iterator<Item = u8> + '_ {
        self.words.iter().flat_map(|w| w.to_le_bytes())
    }
}

pub static PRESETS: [GammaTable; GAMMA_SETS] = [
    GammaTable {
        name: "all-zero",
        words: [0; GAMMA_POINTS],
    },
    GammaTable {
        name: "filmic",
        words: [
            0x03020100, 0x07060504, 0x0B0A0908, 0x100E0D0C,
            0x14131211, 0x19181716, 0x1E1D1C1B, 0x24222120,
            0x29272625, 0x2E2D2B2A, 0x3332312F, 0x38373635,
            0x3E3C3B3A, 0x4342403F, 0x48474644, 0x4D4C4B49,
            0x5251504E, 0x57565554, 0x5C5B5A59, 0x61605F5E,
            0x66656462, 0x6B6A6867, 0x706E6D6C, 0x74737271,
            0x79787675, 0x7D7C7B7A, 0x82817F7E, 0x86858483,
            0x8A898887, 0x8F8E8D8B, 0x93929190, 0x97969594,
            0x9B9A9998, 0x9F9E9D9C, 0xA3A2A1A0, 0xA7A6A5A4,
            0xABAAA9A8, 0xAFAEADAC, 0xB2B1B0AF, 0xB6B5B4B3,
            0xB9B9B8B7, 0xBDBCBBBA, 0xC0C0BFBE, 0xC4C3C2C1,
            0xC7C6C6C5, 0xCBCAC9C8, 0xCECDCCCB, 0xD1D0D0CF,
            0xD4D4D3D2, 0xD7D7D6D5, 0xDBDAD9D8, 0xDEDDDCDB,
            0xE1E0DFDE, 0xE4E3E2E1, 0xE7E6E5E4, 0xE9E9E8E7,
            0xECECEBEA, 0xEFEEEEED, 0xF2F1F0F0, 0xF5F4F3F2,
            0xF7F7F6F5, 0xFAF9F9F8, 0xFCFCFBFA, 0xFFFEFEFD,
        ],
    },
    GammaTable {
        name: "sRGB",
        words: [
            0x1C160D00, 0x2E2A2622, 0x3B383532, 0x4542403D,
            0x4D4B4947, 0x5553514F, 0x5C5A5856, 0x62605F5D,
            0x68666563, 0x6D6C6A69, 0x7271706E, 0x77767573,
            0x7C7A7978, 0x807F7E7D, 0x84838281, 0x88878685,
            0x8C8B8A89, 0x908F8E8D, 0x94939291, 0x97969594,
            0x9B9A9998, 0x9E9D9C9B, 0xA1A09F9F, 0xA4A3A3A2,
            0xA7A7A6A5, 0xAAAAA9A8, 0xADADACAB, 0xB0AFAFAE,
            0xB3B2B2B1, 0xB6B5B4B4, 0xB9B8B7B6, 0xBBBBBAB9,
            0xBEBDBDBC, 0xC0C0BFBE, 0xC3C2C2C1, 0xC5C5C4C4,
            0xC8C7C7C6, 0xCACAC9C8, 0xCDCCCBCB, 0xCFCECECD,
            0xD1D1D0D0, 0xD4D3D2D2, 0xD6D5D5D4, 0xD8D7D7D6,
            0xDADAD9D8, 0xDCDCDBDB, 0xDEDEDDDD, 0xE0E0DFDF,
            0xE3E2E2E1, 0xE5E4E4E3, 0xE7E6E6E5, 0xE9E8E8E7,
            0xEBEAEAE9, 0xEDECECEB, 0xEEEEEEED, 0xF0F0EFEF,
            0xF2F2F1F1, 0xF4F4F3F3, 0xF6F6F5F5, 0xF8F7F7F6,
            0xFAF9F9F8, 0xFBFBFBFA, 0xFDFDFCFC, 0xFFFFFEFE,
        ],
    },
];

pub fn preset(set: usize) -> Option<&'static GammaTable> {
    PRESETS.get(set)
}

/// Writes preset `set` word by word from `block_base + 0x300` upwards.
///
/// Stops at the first failed write and returns its fault. Words already
/// written stay written.
pub fn load<B: RegisterBus + ?Sized>(
    bus: &mut B,
    block_base: u32,
    set: usize,
) -> Result<(), GammaError> {
    let table = preset(set).ok_or(GammaError::InvalidSelection(set))?;
    let mut addr = block_base.wrapping_add(GAMMA_TABLE_OFFSET);

    debug!("Loading gamma set {set} ({}) at {addr:#010X}", table.name);

    for (i, &word) in table.words.iter().enumerate() {
        if let Err(fault) = bus.write32(addr, word) {
            warn!("Gamma load aborted at entry {i}: {fault}");
            return Err(fault.into());
        }
        addr = addr.wrapping_add(REGISTER_STRIDE);
    }

    Ok(())
}
