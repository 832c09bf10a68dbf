//! Streamed file transfer over a serial session.
//!
//! The device is asked for a file with a single text command and then
//! streams raw bytes with no framing and no end marker. The transfer is
//! considered done when either the expected byte count has arrived, or
//! the line has been quiet for the idle timeout. Silence after at least
//! one byte counts as success; silence with nothing received is a timeout.
//!
//! A device that stalls mid-stream for longer than the idle timeout is
//! indistinguishable from one that finished, so a truncated file can be
//! reported as complete.

use crate::domain::{config::TransferDefaults, error::{GrabError, GrabResult}};
use crate::infrastructure::serial::SerialSession;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Callback invoked after every chunk with `(bytes_so_far, expected_size)`.
pub type ProgressCallback = Box<dyn FnMut(u64, Option<u64>)>;

/// Tuning for one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Total length, when the caller knows it
    pub expected_size: Option<u64>,
    /// Largest single read from the input buffer
    pub chunk_size: usize,
    /// Wait after sending the request before reading the acknowledgement
    pub request_settle: Duration,
    /// Quiet period that ends a transfer
    pub idle_timeout: Duration,
    /// Sleep between polls of an empty input buffer
    pub poll_interval: Duration,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            expected_size: None,
            chunk_size: 1024,
            request_settle: Duration::from_secs(1),
            idle_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ExtractOptions {
    pub fn with_expected_size(mut self, size: Option<u64>) -> Self {
        self.expected_size = size;
        self
    }
}

impl From<&TransferDefaults> for ExtractOptions {
    fn from(defaults: &TransferDefaults) -> Self {
        Self {
            expected_size: None,
            chunk_size: defaults.chunk_size.max(1),
            request_settle: defaults.request_settle(),
            idle_timeout: defaults.idle_timeout(),
            poll_interval: defaults.poll_interval(),
        }
    }
}

/// How a finished transfer was recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// `expected_size` bytes arrived
    SizeReached,
    /// The line went quiet after at least one byte
    IdleSilence,
}

/// Outcome of a successful extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReport {
    pub output_path: PathBuf,
    pub bytes_received: u64,
    pub elapsed: Duration,
    pub completion: Completion,
}

impl TransferReport {
    /// Average bytes per second over the whole transfer.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes_received as f64 / secs
        } else {
            self.bytes_received as f64
        }
    }
}

/// Per-call transfer bookkeeping.
struct TransferState {
    bytes_received: u64,
    started_at: Instant,
    last_activity: Instant,
    expected_size: Option<u64>,
}

impl TransferState {
    fn new(expected_size: Option<u64>) -> Self {
        let now = Instant::now();
        Self {
            bytes_received: 0,
            started_at: now,
            last_activity: now,
            expected_size,
        }
    }

    fn record(&mut self, n: usize) {
        self.bytes_received += n as u64;
        self.last_activity = Instant::now();
    }

    fn size_reached(&self) -> bool {
        self.expected_size
            .map_or(false, |size| self.bytes_received >= size)
    }

    fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

/// Pulls a file off a device over an open [`SerialSession`].
pub struct FileExtractor {
    options: ExtractOptions,
    progress: Option<ProgressCallback>,
}

impl FileExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            options,
            progress: None,
        }
    }

    /// Report progress through `callback` after every chunk.
    pub fn with_progress(mut self, callback: impl FnMut(u64, Option<u64>) + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Send `command` and stream the device's answer into `output_path`.
    ///
    /// The file is created (or truncated) and its parent directories are
    /// created as needed. The immediate reply to the command is treated as
    /// an acknowledgement and is not written to the file.
    pub fn extract(
        &mut self,
        session: &mut SerialSession,
        command: &str,
        output_path: impl AsRef<Path>,
    ) -> GrabResult<TransferReport> {
        let output_path = output_path.as_ref();
        if !session.is_open() {
            error!("Not connected to any device");
            return Err(GrabError::NotConnected);
        }

        let result = self.run_transfer(session, command, output_path);
        if let Err(e) = &result {
            error!("File extraction failed: {}", e);
        }
        result
    }

    fn run_transfer(
        &mut self,
        session: &mut SerialSession,
        command: &str,
        output_path: &Path,
    ) -> GrabResult<TransferReport> {
        create_parent_dir(output_path)?;

        info!("Requesting file with command: {}", command);
        session.clear_input()?;
        let response = session.send_command(command, self.options.request_settle)?;
        if response.is_empty() {
            error!("No response from device after file request");
            return Err(GrabError::NoResponse {
                command: command.to_string(),
            });
        }
        debug!(
            "Device acknowledged request: {:?} ({})",
            response.text(),
            hex::encode(&response.as_bytes()[..response.len().min(32)])
        );

        info!("Starting file transfer...");
        let mut file = File::create(output_path)?;
        let mut state = TransferState::new(self.options.expected_size);
        let mut buf = vec![0u8; self.options.chunk_size.max(1)];

        let completion = loop {
            let pending = session.bytes_available()?;
            if pending > 0 {
                let want = pending.min(buf.len());
                let n = session.read_chunk(&mut buf[..want])?;
                if n == 0 {
                    // Driver reported data but read timed out empty; poll again.
                    thread::sleep(self.options.poll_interval);
                    continue;
                }
                file.write_all(&buf[..n])?;
                state.record(n);
                self.report_progress(&state);
                continue;
            }

            if state.size_reached() {
                break Completion::SizeReached;
            }

            if state.idle_for() > self.options.idle_timeout {
                if state.bytes_received > 0 {
                    info!("Transfer appears complete (line idle for {:?})", self.options.idle_timeout);
                    if let Some(size) = state.expected_size {
                        warn!(
                            "Received {} of {} expected bytes before the line went quiet",
                            state.bytes_received, size
                        );
                    }
                    break Completion::IdleSilence;
                }
                error!("Timed out waiting for data");
                return Err(GrabError::Timeout {
                    waited: state.started_at.elapsed(),
                });
            }

            thread::sleep(self.options.poll_interval);
        };

        file.flush()?;

        let report = TransferReport {
            output_path: output_path.to_path_buf(),
            bytes_received: state.bytes_received,
            elapsed: state.started_at.elapsed(),
            completion,
        };
        info!(
            "File transfer complete. Received {} bytes in {:.2} seconds",
            report.bytes_received,
            report.elapsed.as_secs_f64()
        );
        info!("File saved to: {}", report.output_path.display());
        Ok(report)
    }

    fn report_progress(&mut self, state: &TransferState) {
        match state.expected_size {
            Some(size) if size > 0 => debug!(
                "Received {}/{} bytes ({:.1}%)",
                state.bytes_received,
                size,
                state.bytes_received as f64 * 100.0 / size as f64
            ),
            _ => debug!("Received {} bytes", state.bytes_received),
        }
        if let Some(callback) = self.progress.as_mut() {
            callback(state.bytes_received, state.expected_size);
        }
    }
}

fn create_parent_dir(output_path: &Path) -> GrabResult<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
