use crate::domain::port::SelectionCriterion;
use clap::{error::ErrorKind, ArgGroup, CommandFactory, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command line arguments for SerialGrab
#[derive(Parser, Debug)]
#[command(
    name = "serialgrab",
    version = env!("CARGO_PKG_VERSION"),
    about = "Find a serial device and extract a file from it",
    long_about = "Scans serial ports, finds a target device by USB vendor/product ID, description or explicit port, sends it a file request command and saves the streamed reply to disk."
)]
#[command(group(ArgGroup::new("device").args(["vid", "name", "port"]).multiple(false)))]
pub struct Args {
    /// Scan and list all available serial ports and devices
    #[arg(long, help_heading = "Device identification")]
    pub scan_all: bool,

    /// Vendor ID of the target device, 4 hex digits (e.g. 0403)
    #[arg(long, value_parser = parse_usb_id, requires = "pid", help_heading = "Device identification")]
    pub vid: Option<String>,

    /// Product ID of the target device, 4 hex digits (e.g. 6001)
    #[arg(long, value_parser = parse_usb_id, requires = "vid", help_heading = "Device identification")]
    pub pid: Option<String>,

    /// Name or part of the name of the target device
    #[arg(long, help_heading = "Device identification")]
    pub name: Option<String>,

    /// Serial port to use directly (e.g. COM3 or /dev/ttyUSB0)
    #[arg(long, help_heading = "Device identification")]
    pub port: Option<String>,

    /// Baud rate [default: 9600, or the configured value]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..), help_heading = "Connection")]
    pub baud: Option<u32>,

    /// Serial read timeout in seconds [default: 1, or the configured value]
    #[arg(long, help_heading = "Connection")]
    pub timeout: Option<u64>,

    /// Command that asks the device for the file
    #[arg(long, required_unless_present_any = ["scan_all", "init_config"], help_heading = "File extraction")]
    pub command: Option<String>,

    /// Path where the extracted file is saved
    #[arg(long, required_unless_present_any = ["scan_all", "init_config"], help_heading = "File extraction")]
    pub output: Option<PathBuf>,

    /// Expected file size in bytes
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..), help_heading = "File extraction")]
    pub size: Option<u64>,

    /// Also print log events to stderr, at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format for scan results and transfer reports
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write a default .serialgrab/config.toml in the current directory
    #[arg(long)]
    pub init_config: bool,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// Table output
    Table,
    /// JSON output
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl Args {
    /// Device selection from `--vid`/`--pid`, `--name` or `--port`.
    pub fn selection(&self) -> Option<SelectionCriterion> {
        SelectionCriterion::from_parts(
            self.vid.as_deref(),
            self.pid.as_deref(),
            self.name.as_deref(),
            self.port.as_deref(),
        )
    }

    /// Checks clap cannot express declaratively. Extraction mode needs a
    /// device selector.
    pub fn validate(&self) -> Result<(), clap::Error> {
        if self.scan_all || self.init_config {
            return Ok(());
        }
        if self.selection().is_none() {
            return Err(Args::command().error(
                ErrorKind::MissingRequiredArgument,
                "one of --vid and --pid, --name, or --port is required",
            ));
        }
        Ok(())
    }
}

/// Accept exactly four hex digits.
fn parse_usb_id(value: &str) -> Result<String, String> {
    if value.len() == 4 && value.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(value.to_string())
    } else {
        Err(format!("'{}' is not a 4-digit hex ID", value))
    }
}
