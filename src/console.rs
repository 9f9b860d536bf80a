//! The interactive interpreter.
//!
//! [`Console`] owns everything one session needs: the configuration, the
//! verbosity flag, the line buffer, both transactors and the output stream.
//! Input arrives one byte at a time through [`Console::feed`]; a completed line
//! is parsed, executed and answered before the next byte is looked at.
//!
//! Verbose output is meant for people and carries addresses and read-backs.
//! Terse output is meant for scripts: only successful reads print, as a bare
//! value, and errors print nothing.

use std::io::{self, Write};

use tracing::{debug, warn};

use crate::bus::{register_address, RegisterBus, SensorBus};
use crate::codec::{decode_ccm, decode_translation};
use crate::command::Command;
use crate::config::ConsoleConfig;
use crate::error::{BusFault, CommandError};
use crate::gamma::{self, GAMMA_SETS};
use crate::line::{LineAssembler, LineEvent};

pub const PROMPT: &str = "\r\n> ";
const ERASE: &[u8] = b"\x08 \x08";

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const RESOLUTION: &str = "1920 x 1080";

/// Outcome of a verification read. A failed one does not undo the write.
type ReadBack<T> = Result<T, BusFault>;

/// Result of a successfully executed command, ready to be printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reply {
    Verbose(bool),
    Help,
    SensorRead {
        reg: u16,
        value: u8,
    },
    SensorWrite {
        reg: u16,
        value: u8,
        verified: Option<ReadBack<u8>>,
    },
    FpgaRead {
        addr: u32,
        value: u32,
    },
    FpgaWrite {
        addr: u32,
        value: u32,
        readback: Option<ReadBack<u32>>,
    },
    CcmRead {
        addr: u32,
        raw: u32,
        coefficient: i32,
    },
    CcmWrite {
        addr: u32,
        coefficient: i32,
        encoded: u32,
        readback: Option<ReadBack<u32>>,
    },
    CcmUpdate,
    TranslationRead {
        addr: u32,
        raw: u32,
        value: i16,
    },
    TranslationWrite {
        addr: u32,
        value: i16,
        encoded: u16,
        readback: Option<ReadBack<u32>>,
    },
    GammaLoaded {
        set: usize,
    },
}

pub struct Console<S, B, W> {
    config: ConsoleConfig,
    verbose: bool,
    line: LineAssembler,
    sensor: S,
    bus: B,
    out: W,
}

impl<S, B, W> Console<S, B, W>
where
    S: SensorBus,
    B: RegisterBus,
    W: Write,
{
    pub fn new(config: ConsoleConfig, sensor: S, bus: B, out: W) -> Self {
        Self {
            verbose: config.verbose,
            line: LineAssembler::new(config.line_capacity),
            config,
            sensor,
            bus,
            out,
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Bytes typed since the last terminator.
    pub fn pending_line(&self) -> &[u8] {
        self.line.pending()
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_parts(self) -> (S, B, W) {
        (self.sensor, self.bus, self.out)
    }

    pub fn prompt(&mut self) -> io::Result<()> {
        self.out.write_all(PROMPT.as_bytes())?;
        self.out.flush()
    }

    /// Handles one input byte: echo, erase, or run the completed line.
    pub fn feed(&mut self, byte: u8) -> io::Result<()> {
        match self.line.feed(byte) {
            LineEvent::Appended(b) => {
                if self.verbose {
                    self.out.write_all(&[b])?;
                }
            }
            LineEvent::Erased => {
                if self.verbose {
                    self.out.write_all(ERASE)?;
                }
            }
            LineEvent::Ignored | LineEvent::Dropped => {}
            LineEvent::Terminated(line) => {
                if let Some(line) = line {
                    // move off the echoed text before answering
                    if self.verbose {
                        self.out.write_all(b"\r\n")?;
                    }
                    self.process(&line)?;
                }
                return self.prompt();
            }
        }
        self.out.flush()
    }

    pub fn feed_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        bytes.iter().try_for_each(|&b| self.feed(b))
    }

    /// Parses and runs one command line, writing the response.
    ///
    /// Only failures of the output stream are returned; command errors are
    /// reported on the stream itself.
    pub fn process(&mut self, line: &str) -> io::Result<()> {
        let result = match Command::parse(line) {
            Ok(None) => return Ok(()),
            Ok(Some(command)) => {
                debug!("Dispatching {command:?}");
                self.execute(command)
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(reply) => self.render(reply),
            Err(err) => {
                match err {
                    CommandError::Hardware(_) | CommandError::Gamma(_) => warn!("{line:?}: {err}"),
                    _ => debug!("{line:?} rejected: {err}"),
                }
                if self.verbose {
                    write!(self.out, "ERR: {err}\r\n")?;
                }
                Ok(())
            }
        }
    }

    fn execute(&mut self, command: Command) -> Result<Reply, CommandError> {
        let reply = match command {
            Command::Verbose(on) => {
                self.verbose = on;
                Reply::Verbose(on)
            }
            Command::Help => Reply::Help,
            Command::SensorRead { reg } => Reply::SensorRead {
                reg,
                value: self.sensor.read(reg)?,
            },
            Command::SensorWrite { reg, value } => {
                self.sensor.write(reg, value)?;
                let verified = self.verbose.then(|| {
                    self.sensor.read(reg).inspect_err(|fault| {
                        warn!("Verification read after sensor write failed: {fault}")
                    })
                });
                Reply::SensorWrite {
                    reg,
                    value,
                    verified,
                }
            }
            Command::FpgaRead { base, offset } => {
                let addr = register_address(base, offset as u32);
                Reply::FpgaRead {
                    addr,
                    value: self.bus.read32(addr)?,
                }
            }
            Command::FpgaWrite {
                base,
                offset,
                value,
            } => {
                let addr = register_address(base, offset as u32);
                self.bus.write32(addr, value)?;
                Reply::FpgaWrite {
                    addr,
                    value,
                    readback: self.read_back(addr),
                }
            }
            Command::CcmRead { offset } => {
                let addr = self.config.bridge_register(offset as u32);
                let raw = self.bus.read32(addr)?;
                Reply::CcmRead {
                    addr,
                    raw,
                    coefficient: decode_ccm(raw),
                }
            }
            Command::CcmWrite {
                offset,
                coefficient,
            } => {
                let addr = self.config.bridge_register(offset as u32);
                let encoded = coefficient.to_register();
                self.bus.write32(addr, encoded)?;
                Reply::CcmWrite {
                    addr,
                    coefficient: coefficient.percent(),
                    encoded,
                    readback: self.read_back(addr),
                }
            }
            Command::CcmUpdate => {
                self.bus.write32(self.config.update_register(), 1)?;
                Reply::CcmUpdate
            }
            Command::TranslationRead { offset } => {
                let addr = self.config.bridge_register(offset as u32);
                let raw = self.bus.read32(addr)?;
                Reply::TranslationRead {
                    addr,
                    raw,
                    value: decode_translation(raw),
                }
            }
            Command::TranslationWrite { offset, value } => {
                let addr = self.config.bridge_register(offset as u32);
                self.bus.write32(addr, value.to_register())?;
                Reply::TranslationWrite {
                    addr,
                    value: value.get(),
                    encoded: value.encode(),
                    readback: self.read_back(addr),
                }
            }
            Command::GammaLoad { set } => {
                gamma::load(&mut self.bus, self.config.gamma_base, set)?;
                Reply::GammaLoaded { set }
            }
        };
        Ok(reply)
    }

    /// Verification read, only issued in verbose mode. The write it follows
    /// has already landed, so a fault here is reported, not propagated.
    fn read_back(&mut self, addr: u32) -> Option<ReadBack<u32>> {
        self.verbose.then(|| {
            self.bus
                .read32(addr)
                .inspect_err(|fault| warn!("Read-back after write failed: {fault}"))
        })
    }

    fn render(&mut self, reply: Reply) -> io::Result<()> {
        let out = &mut self.out;

        if !self.verbose {
            return match reply {
                Reply::SensorRead { value, .. } => write!(out, "0x{value:02X}\r\n"),
                Reply::FpgaRead { value, .. } => write!(out, "0x{value:08X}\r\n"),
                Reply::CcmRead { coefficient, .. } => write!(out, "{coefficient}\r\n"),
                Reply::TranslationRead { value, .. } => write!(out, "{value}\r\n"),
                _ => Ok(()),
            };
        }

        match reply {
            Reply::Verbose(on) => {
                write!(out, "Verbose mode {}\r\n", if on { "ON" } else { "OFF" })
            }
            Reply::Help => write_help(out),
            Reply::SensorRead { reg, value } => {
                write!(out, "Read: 0x{reg:04X} = 0x{value:02X}\r\n")
            }
            Reply::SensorWrite {
                reg,
                value,
                verified: Some(Ok(verified)),
            } => write!(
                out,
                "Wrote: 0x{value:02X} to 0x{reg:04X}, verified = 0x{verified:02X}\r\n"
            ),
            Reply::SensorWrite {
                reg,
                value,
                verified: Some(Err(fault)),
            } => write!(
                out,
                "Wrote: 0x{value:02X} to 0x{reg:04X}, verify failed: {fault}\r\n"
            ),
            Reply::SensorWrite { reg, value, .. } => {
                write!(out, "Wrote: 0x{value:02X} to 0x{reg:04X}\r\n")
            }
            Reply::FpgaRead { addr, value } => {
                write!(out, "F R: [0x{addr:08X}] = 0x{value:08X}\r\n")
            }
            Reply::FpgaWrite {
                addr,
                value,
                readback: Some(Ok(rb)),
            } => write!(out, "F W: [0x{addr:08X}] <= 0x{value:08X} (rb 0x{rb:08X})\r\n"),
            Reply::FpgaWrite {
                addr,
                value,
                readback: Some(Err(fault)),
            } => write!(
                out,
                "F W: [0x{addr:08X}] <= 0x{value:08X} (rb failed: {fault})\r\n"
            ),
            Reply::FpgaWrite { addr, value, .. } => {
                write!(out, "F W: [0x{addr:08X}] <= 0x{value:08X}\r\n")
            }
            Reply::CcmRead {
                addr,
                raw,
                coefficient,
            } => {
                let hw = raw as u16 as i16 as i32 as u32;
                write!(out, "C R: [0x{addr:08X}] = {coefficient} (hw 0x{hw:08X})\r\n")
            }
            Reply::CcmWrite {
                addr,
                coefficient,
                encoded,
                readback: Some(Ok(rb)),
            } => write!(
                out,
                "C W: [0x{addr:08X}] <= {coefficient} (hw 0x{encoded:08X}, rb 0x{rb:08X})\r\n"
            ),
            Reply::CcmWrite {
                addr,
                coefficient,
                encoded,
                readback: Some(Err(fault)),
            } => write!(
                out,
                "C W: [0x{addr:08X}] <= {coefficient} (hw 0x{encoded:08X}, rb failed: {fault})\r\n"
            ),
            Reply::CcmWrite {
                addr,
                coefficient,
                encoded,
                ..
            } => write!(
                out,
                "C W: [0x{addr:08X}] <= {coefficient} (hw 0x{encoded:08X})\r\n"
            ),
            Reply::CcmUpdate => write!(out, "CCM Update triggered\r\n"),
            Reply::TranslationRead { addr, raw, value } => {
                let hw = raw as u16;
                write!(out, "T R: [0x{addr:08X}] = {value} (hw 0x{hw:04X})\r\n")
            }
            Reply::TranslationWrite {
                addr,
                value,
                encoded,
                readback: Some(Ok(rb)),
            } => write!(
                out,
                "T W: [0x{addr:08X}] <= {value} (hw 0x{encoded:04X}, rb 0x{rb:08X})\r\n"
            ),
            Reply::TranslationWrite {
                addr,
                value,
                encoded,
                readback: Some(Err(fault)),
            } => write!(
                out,
                "T W: [0x{addr:08X}] <= {value} (hw 0x{encoded:04X}, rb failed: {fault})\r\n"
            ),
            Reply::TranslationWrite {
                addr,
                value,
                encoded,
                ..
            } => write!(out, "T W: [0x{addr:08X}] <= {value} (hw 0x{encoded:04X})\r\n"),
            Reply::GammaLoaded { set } => write!(out, "Gamma set {set} loaded\r\n"),
        }
    }
}

fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, " \r\n Version number : {VERSION} \r\n")?;
    write!(out, " Version Resolution : {RESOLUTION} \r\n")?;
    write!(out, " ISP register console \r\n")?;
    write!(out, "Available commands:\r\n")?;
    write!(out, "  V ON|OFF                 - Verbose output on/off\r\n")?;
    write!(out, "  S R <addr>               - Read sensor register\r\n")?;
    write!(out, "  S W <addr> <data>        - Write sensor register\r\n")?;
    write!(out, "  F R <base> <offset>      - Read FPGA AXI register\r\n")?;
    write!(out, "  F W <base> <offset> <d>  - Write FPGA AXI register\r\n")?;
    write!(out, "  C R <offset>             - Read CCM coefficient\r\n")?;
    write!(out, "  C W <offset> <i>         - Write CCM coefficient (-99..99)\r\n")?;
    write!(out, "  C U                      - Update and enable new CCM configuration\r\n")?;
    write!(out, "  T R <offset>             - Read translation value\r\n")?;
    write!(out, "  T W <offset> <i>         - Write translation value (-255..255)\r\n")?;
    write!(
        out,
        "  G L <set>                - Load gamma preset (0..{})\r\n",
        GAMMA_SETS - 1
    )?;
    write!(out, "    addr = base + (offset << 2)\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamma::PRESETS;
    use crate::sim::{RegisterFile, SimSensor, Transaction};

    type TestConsole = Console<SimSensor, RegisterFile, Vec<u8>>;

    const CCM_04: u32 = 0x4000_0010;

    fn console() -> TestConsole {
        Console::new(
            ConsoleConfig::default(),
            SimSensor::new(),
            RegisterFile::new(),
            Vec::new(),
        )
    }

    fn terse() -> TestConsole {
        Console::new(
            ConsoleConfig::default().with_verbose(false),
            SimSensor::new(),
            RegisterFile::new(),
            Vec::new(),
        )
    }

    /// Feeds `input` and returns everything written, clearing the output.
    fn run(console: &mut TestConsole, input: &str) -> String {
        console.feed_all(input.as_bytes()).unwrap();
        let out = String::from_utf8(console.output().clone()).unwrap();
        console.output_mut().clear();
        out
    }

    #[test]
    fn sensor_read_verbose() {
        let mut c = console();
        c.sensor.preset(0x1000, 0x5A);
        let out = run(&mut c, "S R 1000\r");
        assert_eq!(out, "S R 1000\r\nRead: 0x1000 = 0x5A\r\n\r\n> ");
    }

    #[test]
    fn sensor_read_terse_is_bare_value() {
        let mut c = terse();
        c.sensor.preset(0x1000, 0x5A);
        assert_eq!(run(&mut c, "S R 1000\r"), "0x5A\r\n\r\n> ");
    }

    #[test]
    fn sensor_write_verifies_only_when_verbose() {
        let mut c = console();
        let out = run(&mut c, "S W 3012 7\r");
        assert!(out.contains("Wrote: 0x07 to 0x3012, verified = 0x07\r\n"));
        assert_eq!(
            c.sensor().transactions(),
            &[
                Transaction::SensorWrite {
                    reg: 0x3012,
                    value: 0x07
                },
                Transaction::SensorRead { reg: 0x3012 },
            ]
        );

        let mut c = terse();
        assert_eq!(run(&mut c, "S W 3012 07\r"), PROMPT);
        assert_eq!(c.sensor().transactions().len(), 1);
    }

    /// Sensor whose registers ignore writes.
    struct StuckSensor;

    impl SensorBus for StuckSensor {
        fn read(&mut self, _reg: u16) -> Result<u8, BusFault> {
            Ok(0xFF)
        }

        fn write(&mut self, _reg: u16, _value: u8) -> Result<(), BusFault> {
            Ok(())
        }
    }

    #[test]
    fn sensor_verify_mismatch_is_reported_not_failed() {
        let mut c = Console::new(
            ConsoleConfig::default(),
            StuckSensor,
            RegisterFile::new(),
            Vec::new(),
        );
        c.feed_all(b"S W 0100 12\r").unwrap();
        let out = String::from_utf8(c.output().clone()).unwrap();
        assert!(out.contains("Wrote: 0x12 to 0x0100, verified = 0xFF\r\n"));
        assert!(!out.contains("ERR"));
    }

    #[test]
    fn fpga_read_uses_register_index() {
        let mut c = console();
        c.bus.preset(0x4000_0010, 0x1234_5678);
        let out = run(&mut c, "F R 40000000 04\r");
        assert!(out.contains("F R: [0x40000010] = 0x12345678\r\n"));

        let mut c = terse();
        c.bus.preset(0x8000_03FC, 0xCAFE);
        assert_eq!(run(&mut c, "F R 80000000 FF\r"), "0x0000CAFE\r\n\r\n> ");
    }

    #[test]
    fn fpga_write_reads_back_in_verbose_mode() {
        let mut c = console();
        let out = run(&mut c, "F W 40000000 01 DEADBEEF\r");
        assert!(out.contains("F W: [0x40000004] <= 0xDEADBEEF (rb 0xDEADBEEF)\r\n"));
        assert_eq!(
            c.bus().transactions(),
            &[
                Transaction::Write32 {
                    addr: 0x4000_0004,
                    value: 0xDEAD_BEEF
                },
                Transaction::Read32 { addr: 0x4000_0004 },
            ]
        );
    }

    #[test]
    fn ccm_write_scenario() {
        let mut c = console();
        let out = run(&mut c, "C W 04 50\r");
        assert_eq!(
            c.bus().transactions(),
            &[
                Transaction::Write32 {
                    addr: CCM_04,
                    value: 0x4000
                },
                Transaction::Read32 { addr: CCM_04 },
            ]
        );
        let lines: Vec<&str> = out
            .split("\r\n")
            .filter(|l| l.starts_with("C W:"))
            .collect();
        assert_eq!(
            lines,
            ["C W: [0x40000010] <= 50 (hw 0x00004000, rb 0x00004000)"]
        );
    }

    #[rstest::rstest]
    #[test]
    #[case::max(99, "98")]
    #[case::half(50, "50")]
    #[case::min(-99, "-98")]
    #[case::small(1, "0")]
    #[case::zero(0, "0")]
    fn ccm_round_trip_follows_truncation(#[case] percent: i32, #[case] expect: &str) {
        let mut c = terse();
        run(&mut c, &format!("C W 04 {percent}\r"));
        assert_eq!(run(&mut c, "C R 04\r"), format!("{expect}\r\n\r\n> "));
    }

    #[test]
    fn ccm_read_verbose_shows_both_forms() {
        let mut c = console();
        c.bus.preset(CCM_04, 0xFFFF_C000);
        let out = run(&mut c, "C R 04\r");
        assert!(out.contains("C R: [0x40000010] = -50 (hw 0xFFFFC000)\r\n"));
    }

    #[rstest::rstest]
    #[test]
    #[case::ccm_high("C W 04 100\r", "ERR: CCM coefficient out of range (-99..99)")]
    #[case::ccm_low("C W 04 -100\r", "ERR: CCM coefficient out of range (-99..99)")]
    #[case::t_high("T W 0002 256\r", "ERR: T data out of range (-255..255)")]
    #[case::t_low("T W 0002 -300\r", "ERR: T data out of range (-255..255)")]
    #[case::bad_hex("F W 4000000G 01 00\r", "ERR: Cannot parse F base address")]
    fn rejected_writes_touch_nothing(#[case] input: &str, #[case] message: &str) {
        let mut c = console();
        let out = run(&mut c, input);
        assert!(out.contains(message), "{out:?}");
        assert!(c.bus().transactions().is_empty());
        assert!(c.sensor().transactions().is_empty());

        let mut c = terse();
        assert_eq!(run(&mut c, input), PROMPT);
        assert_eq!(c.bus().write_count(), 0);
    }

    #[test]
    fn ccm_update_latches() {
        let mut c = console();
        let out = run(&mut c, "C U\r");
        assert!(out.contains("CCM Update triggered\r\n"));
        assert_eq!(
            c.bus().transactions(),
            &[Transaction::Write32 {
                addr: 0x4000_0100,
                value: 1
            }]
        );
    }

    #[rstest::rstest]
    #[test]
    #[case(-255)]
    #[case(-5)]
    #[case(0)]
    #[case(1)]
    #[case(255)]
    fn translation_round_trip_is_exact(#[case] value: i32) {
        let mut c = terse();
        run(&mut c, &format!("T W 0020 {value}\r"));
        assert_eq!(run(&mut c, "T R 0020\r"), format!("{value}\r\n\r\n> "));
    }

    #[test]
    fn translation_verbose_format() {
        let mut c = console();
        let out = run(&mut c, "T W 0020 -5\r");
        assert!(out.contains("T W: [0x40000080] <= -5 (hw 0xFFFB, rb 0x0000FFFB)\r\n"));
        let out = run(&mut c, "T R 0020\r");
        assert!(out.contains("T R: [0x40000080] = -5 (hw 0xFFFB)\r\n"));
    }

    #[test]
    fn verbose_toggle() {
        let mut c = console();
        assert_eq!(run(&mut c, "V OFF\r"), "V OFF\r\n\r\n> ");
        assert!(!c.is_verbose());

        // errors are silent while terse, including bad V arguments
        assert_eq!(run(&mut c, "V MAYBE\r"), PROMPT);
        assert_eq!(run(&mut c, "Q R 00\r"), PROMPT);

        assert_eq!(run(&mut c, "v on\r"), PROMPT);
        assert_eq!(run(&mut c, "V on\r"), "Verbose mode ON\r\n\r\n> ");
        assert!(c.is_verbose());

        let out = run(&mut c, "V MAYBE\r");
        assert!(out.contains("ERR: Unknown V argument 'MAYBE'\r\n"));
        let out = run(&mut c, "V\r");
        assert!(out.contains("ERR: V command requires ON or OFF\r\n"));
    }

    #[test]
    fn instances_do_not_share_verbosity() {
        let mut a = console();
        let b = console();
        run(&mut a, "V OFF\r");
        assert!(!a.is_verbose());
        assert!(b.is_verbose());
    }

    #[test]
    fn help_only_when_verbose() {
        let mut c = console();
        let out = run(&mut c, "HELP\r");
        assert!(out.contains("Available commands:\r\n"));
        assert!(out.contains(&format!("Version number : {VERSION}")));
        assert!(c.bus().transactions().is_empty());

        let mut c = terse();
        assert_eq!(run(&mut c, "HELP\r"), PROMPT);
    }

    #[test]
    fn unknown_family_and_operation() {
        let mut c = console();
        assert!(run(&mut c, "X R 00\r").contains("ERR: Unknown command type 'X'\r\n"));
        assert!(run(&mut c, "T U\r").contains("ERR: Unknown T operation 'U'\r\n"));
        assert!(run(&mut c, "S\r").contains("ERR: Cannot parse command\r\n"));
    }

    #[test]
    fn gamma_load_from_console() {
        let mut c = console();
        let out = run(&mut c, "G L 2\r");
        assert!(out.contains("Gamma set 2 loaded\r\n"));
        assert_eq!(c.bus().write_count(), 64);
        assert_eq!(c.bus().peek(0x4001_0300), PRESETS[2].words()[0]);
        assert_eq!(c.bus().peek(0x4001_03FC), PRESETS[2].words()[63]);

        let mut c = console();
        let out = run(&mut c, "G L 3\r");
        assert!(out.contains("ERR: Gamma load failed (status 1)\r\n"));
        assert!(c.bus().transactions().is_empty());
    }

    #[test]
    fn bus_fault_aborts_before_read_back() {
        let mut c = console();
        c.bus.fail_writes_at(0x4000_0004, 4);
        let out = run(&mut c, "F W 40000000 01 00000001\r");
        assert!(out.contains("ERR: Bus fault at 0x40000004 (status 4)\r\n"));
        assert_eq!(c.bus().transactions().len(), 1);

        let mut c = terse();
        c.bus.fail_writes_at(0x4000_0100, 2);
        assert_eq!(run(&mut c, "C U\r"), PROMPT);
    }

    #[rstest::rstest]
    #[test]
    #[case::fpga("F W 40000000 04 00004000\r", "F W: [0x40000010] <= 0x00004000 (rb failed: Bus fault at 0x40000010 (status 9))")]
    #[case::ccm("C W 04 50\r", "C W: [0x40000010] <= 50 (hw 0x00004000, rb failed: Bus fault at 0x40000010 (status 9))")]
    #[case::translation("T W 0004 -5\r", "T W: [0x40000010] <= -5 (hw 0xFFFB, rb failed: Bus fault at 0x40000010 (status 9))")]
    fn failed_read_back_keeps_the_write(#[case] input: &str, #[case] line: &str) {
        let mut c = console();
        c.bus.fail_reads_at(CCM_04, 9);
        let out = run(&mut c, input);
        assert!(out.contains(&format!("{line}\r\n")), "{out:?}");
        assert!(!out.contains("ERR"));
        assert_eq!(c.bus().write_count(), 1);
        assert_ne!(c.bus().peek(CCM_04), 0);
    }

    #[test]
    fn failed_sensor_verify_keeps_the_write() {
        let mut c = console();
        c.sensor.fail_reads_at(0x3012, 3);
        let out = run(&mut c, "S W 3012 07\r");
        assert!(out.contains(
            "Wrote: 0x07 to 0x3012, verify failed: Bus fault at 0x00003012 (status 3)\r\n"
        ));
        assert!(!out.contains("ERR"));
        assert_eq!(c.sensor().peek(0x3012), 0x07);
    }

    #[rstest::rstest]
    #[test]
    #[case::sensor("S R 1000\r", "ERR: Bus fault at 0x00001000 (status 5)")]
    #[case::fpga("F R 40000000 04\r", "ERR: Bus fault at 0x40000010 (status 5)")]
    #[case::ccm("C R 04\r", "ERR: Bus fault at 0x40000010 (status 5)")]
    #[case::translation("T R 0004\r", "ERR: Bus fault at 0x40000010 (status 5)")]
    fn read_fault_aborts_the_command(#[case] input: &str, #[case] message: &str) {
        let mut c = console();
        c.sensor.fail_reads_at(0x1000, 5);
        c.bus.fail_reads_at(CCM_04, 5);
        let out = run(&mut c, input);
        assert!(out.contains(&format!("{message}\r\n")), "{out:?}");
        assert!(!out.contains(" = "));

        let mut c = terse();
        c.sensor.fail_reads_at(0x1000, 5);
        c.bus.fail_reads_at(CCM_04, 5);
        assert_eq!(run(&mut c, input), PROMPT);
    }

    #[test]
    fn parts_outlive_the_console() {
        let mut c = console();
        run(&mut c, "S W 0100 01\rF W 40000000 00 00000002\r");
        c.bus.clear_log();
        run(&mut c, "F R 40000000 00\r");

        let (sensor, bus, out) = c.into_parts();
        assert_eq!(sensor.peek(0x0100), 0x01);
        assert_eq!(bus.transactions(), &[Transaction::Read32 { addr: 0x4000_0000 }]);
        assert!(out.is_empty());
    }

    #[test]
    fn echo_and_erase_only_when_verbose() {
        let mut c = console();
        assert_eq!(run(&mut c, "AB\x08"), "AB\x08 \x08");
        assert_eq!(c.pending_line(), b"A");
        assert_eq!(run(&mut c, "\x7F\x7F"), "\x08 \x08");

        let mut c = terse();
        assert_eq!(run(&mut c, "AB\x08"), "");
        assert_eq!(c.pending_line(), b"A");
    }

    #[test]
    fn empty_line_only_prompts() {
        let mut c = console();
        assert_eq!(run(&mut c, "\r"), PROMPT);
        assert_eq!(run(&mut c, "   \r"), "   \r\n\r\n> ");
    }

    #[test]
    fn overflow_is_dropped_silently() {
        let mut c = Console::new(
            ConsoleConfig::default().with_line_capacity(10),
            SimSensor::new(),
            RegisterFile::new(),
            Vec::new(),
        );
        c.sensor.preset(0x1000, 0x11);
        let out = run(&mut c, "S R 1000XXXXXXXX");
        assert_eq!(out, "S R 1000X");
        assert_eq!(c.pending_line(), b"S R 1000X");

        // erase the extra byte and the line still runs
        let out = run(&mut c, "\x08\r");
        assert!(out.contains("Read: 0x1000 = 0x11\r\n"));
    }
}
