//! In-memory stand-ins for the sensor and the FPGA register bank.
//!
//! These let the console run on a host with no hardware attached, and record
//! every transaction so tests can check exactly what reached the bus.

use std::collections::HashMap;

use tracing::trace;

use crate::bus::{RegisterBus, SensorBus};
use crate::error::BusFault;

/// One bus call, in the order it was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    SensorRead { reg: u16 },
    SensorWrite { reg: u16, value: u8 },
    Read32 { addr: u32 },
    Write32 { addr: u32, value: u32 },
}

impl Transaction {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Transaction::SensorWrite { .. } | Transaction::Write32 { .. }
        )
    }
}

/// Sensor register map. Unwritten registers read as zero.
#[derive(Debug, Default, Clone)]
pub struct SimSensor {
    regs: HashMap<u16, u8>,
    log: Vec<Transaction>,
    read_faults: HashMap<u16, u8>,
}

impl SimSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a register without logging a transaction.
    pub fn preset(&mut self, reg: u16, value: u8) {
        self.regs.insert(reg, value);
    }

    pub fn peek(&self, reg: u16) -> u8 {
        self.regs.get(&reg).copied().unwrap_or(0)
    }

    /// Makes every later read of `reg` fail with `status`.
    pub fn fail_reads_at(&mut self, reg: u16, status: u8) {
        debug_assert_ne!(status, 0);
        self.read_faults.insert(reg, status);
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.log
    }

    pub fn write_count(&self) -> usize {
        self.log.iter().filter(|t| t.is_write()).count()
    }
}

impl SensorBus for SimSensor {
    fn read(&mut self, reg: u16) -> Result<u8, BusFault> {
        self.log.push(Transaction::SensorRead { reg });
        if let Some(&status) = self.read_faults.get(&reg) {
            trace!("sensor read {reg:#06X} faulted with status {status}");
            return Err(BusFault::new(reg as u32, status));
        }
        let value = self.peek(reg);
        trace!("sensor read {reg:#06X} -> {value:#04X}");
        Ok(value)
    }

    fn write(&mut self, reg: u16, value: u8) -> Result<(), BusFault> {
        self.log.push(Transaction::SensorWrite { reg, value });
        trace!("sensor write {reg:#06X} <- {value:#04X}");
        self.regs.insert(reg, value);
        Ok(())
    }
}

/// Sparse 32-bit register file. Unwritten registers read as zero.
#[derive(Debug, Default, Clone)]
pub struct RegisterFile {
    regs: HashMap<u32, u32>,
    log: Vec<Transaction>,
    write_faults: HashMap<u32, u8>,
    read_faults: HashMap<u32, u8>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a register without logging a transaction.
    pub fn preset(&mut self, addr: u32, value: u32) {
        self.regs.insert(addr, value);
    }

    pub fn peek(&self, addr: u32) -> u32 {
        self.regs.get(&addr).copied().unwrap_or(0)
    }

    /// Makes every later write to `addr` fail with `status`.
    ///
    /// `status` must be non-zero; zero means success on this bus.
    pub fn fail_writes_at(&mut self, addr: u32, status: u8) {
        debug_assert_ne!(status, 0);
        self.write_faults.insert(addr, status);
    }

    /// Makes every later read of `addr` fail with `status`. The register
    /// still accepts writes.
    pub fn fail_reads_at(&mut self, addr: u32, status: u8) {
        debug_assert_ne!(status, 0);
        self.read_faults.insert(addr, status);
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.log
    }

    pub fn write_count(&self) -> usize {
        self.log.iter().filter(|t| t.is_write()).count()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }
}

impl RegisterBus for RegisterFile {
    fn read32(&mut self, addr: u32) -> Result<u32, BusFault> {
        self.log.push(Transaction::Read32 { addr });
        if let Some(&status) = self.read_faults.get(&addr) {
            trace!("read32 {addr:#010X} faulted with status {status}");
            return Err(BusFault::new(addr, status));
        }
        let value = self.peek(addr);
        trace!("read32 {addr:#010X} -> {value:#010X}");
        Ok(value)
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<(), BusFault> {
        self.log.push(Transaction::Write32 { addr, value });
        if let Some(&status) = self.write_faults.get(&addr) {
            trace!("write32 {addr:#010X} faulted with status {status}");
            return Err(BusFault::new(addr, status));
        }
        trace!("write32 {addr:#010X} <- {value:#010X}");
        self.regs.insert(addr, value);
        Ok(())
    }
}
