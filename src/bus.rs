//! Register transactor seams.
//!
//! The console never drives a bus itself. It issues logical register reads and
//! writes through these two traits and trusts whatever the implementation
//! reports. Implementations exist for the in-memory simulator
//! ([`crate::sim`]) and for a sensor on an `embedded-hal` I2C bus
//! ([`crate::i2c`]).

use crate::error::BusFault;

/// Byte distance between consecutive 32-bit registers on the memory-mapped bus.
pub const REGISTER_STRIDE: u32 = 4;

/// Byte address of register `index` in the bank starting at `base`.
///
/// Operators give offsets in register units; the shift by 2 turns them into
/// byte addresses.
pub fn register_address(base: u32, index: u32) -> u32 {
    base.wrapping_add(index << 2)
}

/// Image sensor configuration registers: 16-bit address, 8-bit data.
pub trait SensorBus {
    fn read(&mut self, reg: u16) -> Result<u8, BusFault>;

    fn write(&mut self, reg: u16, value: u8) -> Result<(), BusFault>;
}

/// 32-bit memory-mapped FPGA registers.
pub trait RegisterBus {
    fn read32(&mut self, addr: u32) -> Result<u32, BusFault>;

    /// An `Err` carries the non-zero status returned by the bus.
    fn write32(&mut self, addr: u32, value: u32) -> Result<(), BusFault>;
}

impl<T: SensorBus + ?Sized> SensorBus for &mut T {
    fn read(&mut self, reg: u16) -> Result<u8, BusFault> {
        (**self).read(reg)
    }

    fn write(&mut self, reg: u16, value: u8) -> Result<(), BusFault> {
        (**self).write(reg, value)
    }
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    fn read32(&mut self, addr: u32) -> Result<u32, BusFault> {
        (**self).read32(addr)
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<(), BusFault> {
        (**self).write32(addr, value)
    }
}
