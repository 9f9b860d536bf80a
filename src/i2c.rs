//! Image sensor on a two-wire bus.
//!
//! The sensor uses 16-bit register addresses sent high byte first, followed
//! by one data byte for writes or a repeated-start read of one byte.

use core::fmt::Debug;

use embedded_hal::blocking::i2c::{Write, WriteRead};
use tracing::warn;

use crate::bus::SensorBus;
use crate::error::BusFault;

/// 7-bit address of the sensor with its address pin low.
pub const DEFAULT_SENSOR_ADDRESS: u8 = 0x1A;

/// Status reported for any transfer the I2C driver rejects.
pub const STATUS_I2C_FAILURE: u8 = 0xFF;

pub struct I2cSensor<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, CommE> I2cSensor<I2C>
where
    I2C: Write<Error = CommE> + WriteRead<Error = CommE>,
    CommE: Debug,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn default(i2c: I2C) -> Self {
        Self::new(i2c, DEFAULT_SENSOR_ADDRESS)
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, CommE> SensorBus for I2cSensor<I2C>
where
    I2C: Write<Error = CommE> + WriteRead<Error = CommE>,
    CommE: Debug,
{
    fn read(&mut self, reg: u16) -> Result<u8, BusFault> {
        let mut recv_buf = [0u8];
        self.i2c
            .write_read(self.address, &reg.to_be_bytes(), &mut recv_buf)
            .map_err(|e| {
                warn!("I2C read of {reg:#06X} failed: {e:?}");
                BusFault::new(reg as u32, STATUS_I2C_FAILURE)
            })?;
        Ok(recv_buf[0])
    }

    fn write(&mut self, reg: u16, value: u8) -> Result<(), BusFault> {
        let [hi, lo] = reg.to_be_bytes();
        self.i2c
            .write(self.address, &[hi, lo, value])
            .map_err(|e| {
                warn!("I2C write of {reg:#06X} failed: {e:?}");
                BusFault::new(reg as u32, STATUS_I2C_FAILURE)
            })
    }
}
