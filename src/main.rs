use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use isp_console::config::{
    ConsoleConfig, DEFAULT_BRIDGE_BASE, DEFAULT_GAMMA_BASE, DEFAULT_LINE_CAPACITY,
    DEFAULT_UPDATE_OFFSET,
};
use isp_console::line::{BACKSPACE, DELETE};
use isp_console::sim::{RegisterFile, SimSensor};
use isp_console::Console;
use std::io::{self, BufRead, Read, Write};
use std::time::Duration;

const BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115200];
const CTRL_C: u8 = 0x03;

#[derive(Parser, Debug)]
#[command(
    name = "isp_console",
    about = "Register console for ISP bring-up, backed by simulated sensor and FPGA registers."
)]
struct Args {
    /// Serial port to serve the console on. Without it an interactive menu is shown.
    #[arg(long, value_name = "NAME")]
    port: Option<String>,

    /// Baud rate used with --port.
    #[arg(long, default_value_t = 115200)]
    baud: u32,

    /// Start with verbose output off.
    #[arg(long, default_value_t = false)]
    quiet: bool,

    /// Base address of the CCM/translation bridge bank (hex, default 40000000).
    #[arg(long, value_name = "HEX", value_parser = parse_hex)]
    bridge_base: Option<u32>,

    /// Byte offset of the CCM update register from the bridge base (hex, default 100).
    #[arg(long, value_name = "HEX", value_parser = parse_hex)]
    update_offset: Option<u32>,

    /// Base address of the image-correction block holding the gamma table (hex, default 40010000).
    #[arg(long, value_name = "HEX", value_parser = parse_hex)]
    gamma_base: Option<u32>,

    /// Input line buffer size in bytes.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_LINE_CAPACITY)]
    line_capacity: usize,

    /// Log level for diagnostics on stderr.
    #[arg(long, value_name = "LEVEL", default_value_t = tracing::Level::WARN)]
    log_level: tracing::Level,
}

impl Args {
    fn config(&self) -> ConsoleConfig {
        ConsoleConfig::default()
            .with_bridge_base(self.bridge_base.unwrap_or(DEFAULT_BRIDGE_BASE))
            .with_update_offset(self.update_offset.unwrap_or(DEFAULT_UPDATE_OFFSET))
            .with_gamma_base(self.gamma_base.unwrap_or(DEFAULT_GAMMA_BASE))
            .with_line_capacity(self.line_capacity)
            .with_verbose(!self.quiet)
    }
}

fn parse_hex(s: &str) -> Result<u32, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value '{s}': {e}"))
}

/// The simulated hardware lives as long as the program, across mode switches.
struct Hardware {
    sensor: SimSensor,
    bus: RegisterFile,
}

// The main entry point for the console application.
fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    let config = args.config();
    let mut hw = Hardware {
        sensor: SimSensor::new(),
        bus: RegisterFile::new(),
    };

    if let Some(port) = &args.port {
        return run_serial_mode(&mut hw, &config, port, args.baud);
    }

    println!("==========================");
    println!("  ISP Register Console    ");
    println!("==========================");

    // Main menu loop.
    loop {
        println!("\nSelect mode:");
        println!("  1. Terminal Console");
        println!("  2. Serve on Serial Port");
        println!("  3. Exit");

        match prompt_line("> ")?.as_str() {
            "1" => run_terminal_mode(&mut hw, &config)?,
            "2" => {
                if let Err(e) = select_and_run_serial(&mut hw, &config) {
                    eprintln!("[ERROR] {e:#}");
                }
            }
            "3" => break,
            _ => eprintln!("[ERROR] Invalid choice. Please enter 1, 2, or 3."),
        }
    }

    Ok(())
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_index(prompt: &str, len: usize) -> Result<usize> {
    match prompt_line(prompt)?.parse() {
        Ok(i) if i < len => Ok(i),
        _ => bail!("Invalid selection."),
    }
}

/// Leaves raw mode when dropped, including on early return.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("could not enter raw terminal mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Maps a key press onto the byte a serial terminal would send.
///
/// Of the control chords only Ctrl+C (leave) and Ctrl+H (backspace) mean
/// anything to the console; the rest are dropped.
fn key_to_byte(key: KeyEvent) -> Option<u8> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => Some(CTRL_C),
        KeyCode::Char('h') if ctrl => Some(BACKSPACE),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) if c.is_ascii() => Some(c as u8),
        KeyCode::Enter => Some(b'\r'),
        KeyCode::Backspace => Some(BACKSPACE),
        KeyCode::Delete => Some(DELETE),
        _ => None,
    }
}

// Runs the console on the local terminal, one key at a time.
fn run_terminal_mode(hw: &mut Hardware, config: &ConsoleConfig) -> Result<()> {
    println!("\n--- Terminal Console ---");
    println!("Type HELP for commands. Press Ctrl+C to return to the menu.");

    let _raw = RawModeGuard::enable()?;
    let mut console = Console::new(config.clone(), &mut hw.sensor, &mut hw.bus, io::stdout());
    console.prompt()?;

    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key_to_byte(key) {
            Some(CTRL_C) => break,
            Some(byte) => console.feed(byte)?,
            None => {}
        }
    }

    console.output_mut().write_all(b"\r\n")?;
    Ok(())
}

// Lets the user pick a port and baud rate, then serves the console on it.
fn select_and_run_serial(hw: &mut Hardware, config: &ConsoleConfig) -> Result<()> {
    println!("\n--- Serial Mode ---");

    let ports = serialport::available_ports().context("could not enumerate serial ports")?;
    if ports.is_empty() {
        bail!("No serial ports found.");
    }

    println!("Available serial ports:");
    for (i, port) in ports.iter().enumerate() {
        println!("  {}: {}", i, port.port_name);
    }
    let port_index = prompt_index("Select a port (number): ", ports.len())?;

    println!("Available baud rates:");
    for (i, rate) in BAUD_RATES.iter().enumerate() {
        println!("  {}: {}", i, rate);
    }
    let baud_index = prompt_index("Select a baud rate (number): ", BAUD_RATES.len())?;

    run_serial_mode(hw, config, &ports[port_index].port_name, BAUD_RATES[baud_index])
}

// Serves the console on a serial port: bytes in are fed, responses go back out.
fn run_serial_mode(
    hw: &mut Hardware,
    config: &ConsoleConfig,
    port_name: &str,
    baud_rate: u32,
) -> Result<()> {
    let mut port = serialport::new(port_name, baud_rate)
        .timeout(Duration::from_millis(10))
        .open()
        .with_context(|| format!("failed to open port '{port_name}'"))?;
    let writer = port
        .try_clone()
        .with_context(|| format!("failed to clone port '{port_name}'"))?;

    println!(
        "\nServing console on {} at {} baud. Press Ctrl+C to exit.",
        port_name, baud_rate
    );

    let mut console = Console::new(config.clone(), &mut hw.sensor, &mut hw.bus, writer);
    console.prompt()?;

    let mut serial_buf = [0u8; 128];
    loop {
        match port.read(&mut serial_buf) {
            Ok(bytes_read) => console.feed_all(&serial_buf[..bytes_read])?,
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => (),
            Err(e) => return Err(e).context("serial port error"),
        }
    }
}
