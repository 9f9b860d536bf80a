//! Error types shared by the interpreter, the codecs and the gamma loader.

use thiserror::Error;

use crate::command::Field;
use crate::gamma::GammaError;

/// A register transaction that the transactor reported as failed.
///
/// `status` is the non-zero code handed back by the bus driver.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Bus fault at 0x{addr:08X} (status {status})")]
pub struct BusFault {
    pub addr: u32,
    pub status: u8,
}

impl BusFault {
    pub fn new(addr: u32, status: u8) -> Self {
        Self { addr, status }
    }
}

/// Reasons a command line is rejected or aborted.
///
/// The `Display` text is what the console prints after `ERR: ` in verbose mode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Fewer than the two leading tokens, or a leading token that is not a letter.
    #[error("Cannot parse command")]
    Malformed,
    /// `V` given without an argument.
    #[error("V command requires ON or OFF")]
    MissingVerboseArgument,
    /// `V` given something other than ON/OFF.
    #[error("Unknown V argument '{0}'")]
    UnknownVerboseArgument(String),
    /// A required field is missing, too wide, or not a number in its radix.
    #[error("Cannot parse {0}")]
    Parse(Field),
    /// A numeric operand outside its accepted range.
    #[error("{what} out of range ({min}..{max})")]
    Range {
        what: &'static str,
        min: i32,
        max: i32,
    },
    /// Unrecognised family letter.
    #[error("Unknown command type '{0}'")]
    UnknownCommand(char),
    /// Unrecognised operation letter within a known family.
    #[error("Unknown {family} operation '{op}'")]
    UnknownOperation { family: char, op: char },
    #[error(transparent)]
    Hardware(#[from] BusFault),
    #[error("Gamma load failed (status {})", .0.status())]
    Gamma(#[from] GammaError),
}
