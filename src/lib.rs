//! # ISP Register Console
//!
//! This library contains the command interpreter used to bring up and debug a
//! camera image pipeline: an image sensor on a register-oriented serial bus and
//! an FPGA exposing colour-correction, translation and gamma registers on a
//! memory-mapped bus.
//!
//! An operator types short command lines over a character stream. The
//! [`Console`] assembles them byte by byte, validates every field, performs the
//! register transaction through the [`SensorBus`] / [`RegisterBus`] traits and
//! answers either in verbose, human-readable form or with the bare value.
//!
//! ```text
//! S R 1000               read sensor register 0x1000
//! F W 40000000 04 1234   write 0x1234 to 0x40000000 + (0x04 << 2)
//! C W 04 50              set CCM coefficient 4 to 50%
//! C U                    latch the new CCM coefficients
//! T W 0010 -12           set translation register 0x10 to -12
//! G L 1                  load the filmic gamma curve
//! V OFF                  bare machine-readable output
//! ```
//!
//! ## Modules
//!
//! - [`console`] - the interpreter and its output formats
//! - [`command`] - line grammar and field validation
//! - [`line`] - byte-at-a-time line framing
//! - [`codec`] - CCM and translation value encodings
//! - [`gamma`] - built-in gamma curves and their loader
//! - [`bus`] - transactor traits
//! - [`sim`] - in-memory transactors for running without hardware
//! - [`i2c`] - sensor transactor over `embedded-hal` I2C

pub mod bus;
pub mod codec;
pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod gamma;
pub mod i2c;
pub mod line;
pub mod sim;

pub use bus::{RegisterBus, SensorBus};
pub use command::Command;
pub use config::ConsoleConfig;
pub use console::Console;
pub use error::{BusFault, CommandError};
pub use gamma::GammaError;
