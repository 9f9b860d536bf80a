//! Console configuration: where the register banks live and how input is framed.

use crate::bus::register_address;

/// AHB-Lite to AXI-Lite bridge holding the CCM, translation and control registers.
pub const DEFAULT_BRIDGE_BASE: u32 = 0x4000_0000;
/// Byte offset of the configuration-update register inside the bridge bank.
pub const DEFAULT_UPDATE_OFFSET: u32 = 0x0000_0100;
/// Image-correction APB block holding the gamma lookup table.
pub const DEFAULT_GAMMA_BASE: u32 = 0x4001_0000;
/// Bytes in the input line buffer, terminator slot included.
pub const DEFAULT_LINE_CAPACITY: usize = 64;
/// Smallest buffer that can still hold one character.
pub const MIN_LINE_CAPACITY: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub bridge_base: u32,
    pub update_offset: u32,
    pub gamma_base: u32,
    pub line_capacity: usize,
    /// Verbosity at start-up.
    pub verbose: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            bridge_base: DEFAULT_BRIDGE_BASE,
            update_offset: DEFAULT_UPDATE_OFFSET,
            gamma_base: DEFAULT_GAMMA_BASE,
            line_capacity: DEFAULT_LINE_CAPACITY,
            verbose: true,
        }
    }
}

impl ConsoleConfig {
    pub fn with_bridge_base(mut self, base: u32) -> Self {
        self.bridge_base = base;
        self
    }

    pub fn with_update_offset(mut self, offset: u32) -> Self {
        self.update_offset = offset;
        self
    }

    pub fn with_gamma_base(mut self, base: u32) -> Self {
        self.gamma_base = base;
        self
    }

    /// Capacities below [`MIN_LINE_CAPACITY`] are raised to it.
    pub fn with_line_capacity(mut self, capacity: usize) -> Self {
        self.line_capacity = capacity.max(MIN_LINE_CAPACITY);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Address of bridge register `index`.
    pub fn bridge_register(&self, index: u32) -> u32 {
        register_address(self.bridge_base, index)
    }

    /// Address of the register that latches new CCM coefficients.
    ///
    /// The update offset is a byte offset and is not scaled.
    pub fn update_register(&self) -> u32 {
        self.bridge_base.wrapping_add(self.update_offset)
    }
}
