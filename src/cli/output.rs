use crate::cli::args::OutputFormat;
use crate::core::extractor::{Completion, TransferReport};
use crate::domain::port::PortInfo;
use serde::Serialize;
use std::cell::Cell;
use std::io::{self, Write};
use std::rc::Rc;
use tabled::{Table, Tabled};

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_ports(&self, ports: &[PortInfo]) -> Result<(), OutputError>;
    fn write_report(&self, report: &TransferReport) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::GrabError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_ports(&self, ports: &[PortInfo]) -> Result<(), OutputError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        match self.format {
            OutputFormat::Text => write_ports_text(&mut out, ports)?,
            OutputFormat::Table => {
                let rows: Vec<PortTableRow> = ports.iter().map(PortTableRow::from).collect();
                writeln!(out, "{}", Table::new(rows))?;
            }
            OutputFormat::Json => {
                let rows: Vec<PortJson> = ports.iter().map(PortJson::from).collect();
                writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
            }
        }
        Ok(())
    }

    fn write_report(&self, report: &TransferReport) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "output": report.output_path.display().to_string(),
                    "bytes_received": report.bytes_received,
                    "elapsed_secs": report.elapsed.as_secs_f64(),
                    "completion": completion_label(report.completion),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                println!(
                    "File transfer complete. Received {} bytes in {:.2} seconds ({:.0} B/s, {})",
                    report.bytes_received,
                    report.elapsed.as_secs_f64(),
                    report.throughput(),
                    completion_label(report.completion)
                );
                println!("File saved to: {}", report.output_path.display());
            }
        }
        Ok(())
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "message": message,
                    "level": "info"
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                println!("{}", message);
            }
        }
        Ok(())
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "error": error,
                    "level": "error"
                });
                eprintln!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                eprintln!("Error: {}", error);
            }
        }
        Ok(())
    }
}

fn completion_label(completion: Completion) -> &'static str {
    match completion {
        Completion::SizeReached => "size reached",
        Completion::IdleSilence => "line went idle",
    }
}

/// Cut `text` to `width` characters, ending in "..." when shortened.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

/// Plain listing: one line per port, then indented USB details.
pub fn write_ports_text(out: &mut impl Write, ports: &[PortInfo]) -> io::Result<()> {
    writeln!(out, "\n=== Serial devices found ===")?;
    writeln!(out, "{:<14} {:<50} {:<30}", "Port", "Description", "Hardware ID")?;
    writeln!(out, "{}", "-".repeat(94))?;

    for (i, port) in ports.iter().enumerate() {
        writeln!(
            out,
            "{:<14} {:<50} {:<30}",
            port.device_path,
            truncate(&port.description, 50),
            truncate(&port.hardware_id, 30)
        )?;

        if let Some(ids) = port.usb_ids() {
            writeln!(out, "    └─ VID:PID = {}", ids)?;
        }
        if let Some(manufacturer) = port.manufacturer.as_deref().filter(|s| !s.is_empty()) {
            writeln!(out, "    └─ Manufacturer: {}", manufacturer)?;
        }
        if let Some(product) = port.product.as_deref().filter(|s| !s.is_empty()) {
            writeln!(out, "    └─ Product: {}", product)?;
        }
        if let Some(serial) = port.serial_number.as_deref().filter(|s| !s.is_empty()) {
            writeln!(out, "    └─ Serial number: {}", serial)?;
        }

        if i + 1 < ports.len() {
            writeln!(out)?;
        }
    }

    writeln!(out, "\nTotal devices found: {}", ports.len())
}

/// Table row for port listing
#[derive(Tabled)]
struct PortTableRow {
    port: String,
    description: String,
    #[tabled(rename = "vid:pid")]
    ids: String,
    manufacturer: String,
    serial: String,
}

impl From<&PortInfo> for PortTableRow {
    fn from(port: &PortInfo) -> Self {
        Self {
            port: port.device_path.clone(),
            description: port.description.clone(),
            ids: port.usb_ids().map(|ids| ids.to_string()).unwrap_or_default(),
            manufacturer: port.manufacturer.clone().unwrap_or_default(),
            serial: port.serial_number.clone().unwrap_or_default(),
        }
    }
}

/// JSON shape for port listing
#[derive(Serialize)]
struct PortJson<'a> {
    #[serde(flatten)]
    port: &'a PortInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    vid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pid: Option<String>,
}

impl<'a> From<&'a PortInfo> for PortJson<'a> {
    fn from(port: &'a PortInfo) -> Self {
        let ids = port.usb_ids();
        Self {
            port,
            vid: ids.as_ref().map(|ids| ids.vid.clone()),
            pid: ids.map(|ids| ids.pid),
        }
    }
}

/// Status line on stderr that transfer progress redraws in place.
#[derive(Clone, Default)]
pub struct ProgressLine {
    drawn: Rc<Cell<bool>>,
}

impl ProgressLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback for `FileExtractor::with_progress`.
    pub fn callback(&self) -> impl FnMut(u64, Option<u64>) {
        let drawn = Rc::clone(&self.drawn);
        move |received, total| {
            drawn.set(true);
            let mut stderr = io::stderr();
            // A broken terminal must not abort the transfer.
            let _ = stderr.write_all(progress_text(received, total).as_bytes());
            let _ = stderr.flush();
        }
    }

    /// End the status line, if one was drawn, so later output starts on
    /// a fresh line.
    pub fn finish(&self) {
        let _ = self.finish_into(&mut io::stderr());
    }

    fn finish_into(&self, out: &mut impl Write) -> io::Result<()> {
        if self.drawn.replace(false) {
            writeln!(out)?;
        }
        Ok(())
    }
}

fn progress_text(received: u64, total: Option<u64>) -> String {
    match total {
        Some(total) if total > 0 => format!(
            "\rDownloading: {}/{} bytes ({:.1}%)",
            received,
            total,
            received as f64 * 100.0 / total as f64
        ),
        _ => format!("\rDownloading: {} bytes", received),
    }
}
