//! Conversions between operator values and register encodings.
//!
//! CCM coefficients are entered as percentages and stored as Q1.15 fixed
//! point in the low half of a 32-bit register. The decode divides with
//! truncation, so a written percentage may read back one lower; that loss is
//! kept as is since calibration scripts compare against it.
//!
//! Translation offsets are plain 16-bit two's complement values.

use crate::error::CommandError;

/// Hardware value of a +100% coefficient.
pub const CCM_SCALE: i32 = 32768;

/// Percentage of a coefficient the operator types in, validated to -99..=99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CcmCoefficient(i8);

impl CcmCoefficient {
    pub const MIN: i32 = -99;
    pub const MAX: i32 = 99;

    pub fn new(percent: i32) -> Result<Self, CommandError> {
        if (Self::MIN..=Self::MAX).contains(&percent) {
            Ok(Self(percent as i8))
        } else {
            Err(CommandError::Range {
                what: "CCM coefficient",
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub fn percent(self) -> i32 {
        self.0 as i32
    }

    /// Fixed point value, `p * 32768 / 100` truncated toward zero.
    pub fn encode(self) -> i32 {
        self.percent() * CCM_SCALE / 100
    }

    /// Word written to the register: the encoded value sign-extended to 32 bits.
    pub fn to_register(self) -> u32 {
        self.encode() as u32
    }
}

/// Percentage held in a CCM register. Only the low 16 bits are significant.
pub fn decode_ccm(raw: u32) -> i32 {
    let hw = raw as u16 as i16 as i32;
    hw * 100 / CCM_SCALE
}

/// Geometric translation offset, validated to -255..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Translation(i16);

impl Translation {
    pub const MIN: i32 = -255;
    pub const MAX: i32 = 255;

    pub fn new(value: i32) -> Result<Self, CommandError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as i16))
        } else {
            Err(CommandError::Range {
                what: "T data",
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub fn get(self) -> i16 {
        self.0
    }

    pub fn encode(self) -> u16 {
        self.0 as u16
    }

    /// Register word: the 16-bit value in the low half, upper half zero.
    pub fn to_register(self) -> u32 {
        self.encode() as u32
    }
}

/// Sign-extends the low 16 bits of a translation register.
pub fn decode_translation(raw: u32) -> i16 {
    raw as u16 as i16
}
