//! Command grammar.
//!
//! A line is split on ASCII whitespace. The first token picks the family, the
//! second the operation, and the remaining tokens are operands whose width and
//! radix come from [`Field::rule`]. Every field of a command is validated here,
//! before the console touches any register. Tokens past the last operand are
//! ignored, but `HELP` must stand alone.

use core::fmt;
use core::str::SplitAsciiWhitespace;

use crate::codec::{CcmCoefficient, Translation};
use crate::error::CommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Sensor,
    FpgaRegister,
    ColorCorrectionMatrix,
    TranslationMatrix,
    Gamma,
    Verbose,
    Help,
}

impl Family {
    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'S' => Some(Family::Sensor),
            'F' => Some(Family::FpgaRegister),
            'C' => Some(Family::ColorCorrectionMatrix),
            'T' => Some(Family::TranslationMatrix),
            'G' => Some(Family::Gamma),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Family::Sensor => 'S',
            Family::FpgaRegister => 'F',
            Family::ColorCorrectionMatrix => 'C',
            Family::TranslationMatrix => 'T',
            Family::Gamma => 'G',
            Family::Verbose => 'V',
            Family::Help => 'H',
        }
    }

    /// Operation letters this family accepts.
    fn operation(self, letter: char) -> Option<Operation> {
        let op = Operation::from_letter(letter)?;
        let allowed = match self {
            Family::Sensor | Family::FpgaRegister | Family::TranslationMatrix => {
                matches!(op, Operation::Read | Operation::Write)
            }
            Family::ColorCorrectionMatrix => {
                matches!(op, Operation::Read | Operation::Write | Operation::Update)
            }
            Family::Gamma => op == Operation::Load,
            Family::Verbose | Family::Help => false,
        };
        allowed.then_some(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
    Update,
    Load,
    SetOn,
    SetOff,
    /// `HELP` takes no operation letter.
    Print,
}

impl Operation {
    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'R' => Some(Operation::Read),
            'W' => Some(Operation::Write),
            'U' => Some(Operation::Update),
            'L' => Some(Operation::Load),
            _ => None,
        }
    }
}

/// Operand slots, each with its own width and radix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SensorAddress,
    SensorData,
    FpgaBase,
    FpgaOffset,
    FpgaData,
    CcmOffset,
    CcmCoefficient,
    TranslationOffset,
    TranslationData,
    GammaSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Hex,
    Decimal,
    SignedDecimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    /// Maximum characters in the token, sign included.
    pub width: usize,
    pub radix: Radix,
}

impl Field {
    pub const fn rule(self) -> FieldRule {
        let (width, radix) = match self {
            Field::SensorAddress => (4, Radix::Hex),
            Field::SensorData => (2, Radix::Hex),
            Field::FpgaBase => (8, Radix::Hex),
            Field::FpgaOffset => (2, Radix::Hex),
            Field::FpgaData => (8, Radix::Hex),
            Field::CcmOffset => (2, Radix::Hex),
            Field::CcmCoefficient => (8, Radix::SignedDecimal),
            Field::TranslationOffset => (4, Radix::Hex),
            Field::TranslationData => (8, Radix::SignedDecimal),
            Field::GammaSet => (3, Radix::Decimal),
        };
        FieldRule { width, radix }
    }

    fn name(self) -> &'static str {
        match self {
            Field::SensorAddress => "sensor address",
            Field::SensorData => "sensor data",
            Field::FpgaBase => "F base address",
            Field::FpgaOffset => "F offset",
            Field::FpgaData => "F data",
            Field::CcmOffset => "C offset",
            Field::CcmCoefficient => "C coefficient",
            Field::TranslationOffset => "T offset",
            Field::TranslationData => "T data",
            Field::GammaSet => "gamma set",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Verbose(bool),
    Help,
    SensorRead {
        reg: u16,
    },
    SensorWrite {
        reg: u16,
        value: u8,
    },
    FpgaRead {
        base: u32,
        offset: u8,
    },
    FpgaWrite {
        base: u32,
        offset: u8,
        value: u32,
    },
    CcmRead {
        offset: u8,
    },
    CcmWrite {
        offset: u8,
        coefficient: CcmCoefficient,
    },
    CcmUpdate,
    TranslationRead {
        offset: u16,
    },
    TranslationWrite {
        offset: u16,
        value: Translation,
    },
    GammaLoad {
        set: usize,
    },
}

impl Command {
    /// Parses one line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut tokens = Tokens::new(line);
        let Some(head) = tokens.next() else {
            return Ok(None);
        };

        if head == "HELP" {
            return match tokens.next() {
                None => Ok(Some(Command::Help)),
                Some(_) => Err(CommandError::Malformed),
            };
        }
        if head == "V" {
            return parse_verbose(tokens.next()).map(Some);
        }

        let family_letter = single_char(head).ok_or(CommandError::Malformed)?;
        let op_letter = tokens
            .next()
            .and_then(single_char)
            .ok_or(CommandError::Malformed)?;

        let family =
            Family::from_letter(family_letter).ok_or(CommandError::UnknownCommand(family_letter))?;
        let op = family
            .operation(op_letter)
            .ok_or(CommandError::UnknownOperation {
                family: family_letter,
                op: op_letter,
            })?;

        let command = match (family, op) {
            (Family::Sensor, Operation::Read) => Command::SensorRead {
                reg: tokens.hex(Field::SensorAddress)? as u16,
            },
            (Family::Sensor, Operation::Write) => Command::SensorWrite {
                reg: tokens.hex(Field::SensorAddress)? as u16,
                value: tokens.hex(Field::SensorData)? as u8,
            },
            (Family::FpgaRegister, Operation::Read) => Command::FpgaRead {
                base: tokens.hex(Field::FpgaBase)?,
                offset: tokens.hex(Field::FpgaOffset)? as u8,
            },
            (Family::FpgaRegister, Operation::Write) => Command::FpgaWrite {
                base: tokens.hex(Field::FpgaBase)?,
                offset: tokens.hex(Field::FpgaOffset)? as u8,
                value: tokens.hex(Field::FpgaData)?,
            },
            (Family::ColorCorrectionMatrix, Operation::Read) => Command::CcmRead {
                offset: tokens.hex(Field::CcmOffset)? as u8,
            },
            (Family::ColorCorrectionMatrix, Operation::Write) => {
                let offset = tokens.hex(Field::CcmOffset)? as u8;
                let coefficient = CcmCoefficient::new(tokens.signed(Field::CcmCoefficient)?)?;
                Command::CcmWrite {
                    offset,
                    coefficient,
                }
            }
            (Family::ColorCorrectionMatrix, Operation::Update) => Command::CcmUpdate,
            (Family::TranslationMatrix, Operation::Read) => Command::TranslationRead {
                offset: tokens.hex(Field::TranslationOffset)? as u16,
            },
            (Family::TranslationMatrix, Operation::Write) => {
                let offset = tokens.hex(Field::TranslationOffset)? as u16;
                let value = Translation::new(tokens.signed(Field::TranslationData)?)?;
                Command::TranslationWrite { offset, value }
            }
            (Family::Gamma, Operation::Load) => Command::GammaLoad {
                set: tokens.unsigned(Field::GammaSet)? as usize,
            },
            _ => {
                return Err(CommandError::UnknownOperation {
                    family: family_letter,
                    op: op_letter,
                })
            }
        };

        Ok(Some(command))
    }

    pub fn family(&self) -> Family {
        match self {
            Command::Verbose(_) => Family::Verbose,
            Command::Help => Family::Help,
            Command::SensorRead { .. } | Command::SensorWrite { .. } => Family::Sensor,
            Command::FpgaRead { .. } | Command::FpgaWrite { .. } => Family::FpgaRegister,
            Command::CcmRead { .. } | Command::CcmWrite { .. } | Command::CcmUpdate => {
                Family::ColorCorrectionMatrix
            }
            Command::TranslationRead { .. } | Command::TranslationWrite { .. } => {
                Family::TranslationMatrix
            }
            Command::GammaLoad { .. } => Family::Gamma,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Command::Verbose(true) => Operation::SetOn,
            Command::Verbose(false) => Operation::SetOff,
            Command::Help => Operation::Print,
            Command::SensorRead { .. }
            | Command::FpgaRead { .. }
            | Command::CcmRead { .. }
            | Command::TranslationRead { .. } => Operation::Read,
            Command::SensorWrite { .. }
            | Command::FpgaWrite { .. }
            | Command::CcmWrite { .. }
            | Command::TranslationWrite { .. } => Operation::Write,
            Command::CcmUpdate => Operation::Update,
            Command::GammaLoad { .. } => Operation::Load,
        }
    }
}

fn parse_verbose(arg: Option<&str>) -> Result<Command, CommandError> {
    match arg {
        None => Err(CommandError::MissingVerboseArgument),
        Some(a) if a.eq_ignore_ascii_case("ON") => Ok(Command::Verbose(true)),
        Some(a) if a.eq_ignore_ascii_case("OFF") => Ok(Command::Verbose(false)),
        Some(a) => Err(CommandError::UnknownVerboseArgument(a.to_string())),
    }
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Typed operand extraction over whitespace-separated tokens.
struct Tokens<'a> {
    inner: SplitAsciiWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            inner: line.split_ascii_whitespace(),
        }
    }

    fn next(&mut self) -> Option<&'a str> {
        self.inner.next()
    }

    /// Next token, checked against the field's width.
    fn field(&mut self, field: Field) -> Result<&'a str, CommandError> {
        match self.next() {
            Some(token) if token.len() <= field.rule().width => Ok(token),
            _ => Err(CommandError::Parse(field)),
        }
    }

    fn hex(&mut self, field: Field) -> Result<u32, CommandError> {
        debug_assert_eq!(field.rule().radix, Radix::Hex);
        let token = self.field(field)?;
        if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CommandError::Parse(field));
        }
        u32::from_str_radix(token, 16).map_err(|_| CommandError::Parse(field))
    }

    fn unsigned(&mut self, field: Field) -> Result<u32, CommandError> {
        debug_assert_eq!(field.rule().radix, Radix::Decimal);
        let token = self.field(field)?;
        if !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CommandError::Parse(field));
        }
        token.parse().map_err(|_| CommandError::Parse(field))
    }

    fn signed(&mut self, field: Field) -> Result<i32, CommandError> {
        debug_assert_eq!(field.rule().radix, Radix::SignedDecimal);
        let token = self.field(field)?;
        let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CommandError::Parse(field));
        }
        token.parse().map_err(|_| CommandError::Parse(field))
    }
}
