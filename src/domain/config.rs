use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// SerialGrab configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GrabConfig {
    /// Serial connection defaults
    #[serde(default)]
    pub serial: SerialDefaults,
    /// File transfer tuning
    #[serde(default)]
    pub transfer: TransferDefaults,
    /// Log sink settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial connection defaults, overridden by `--baud` / `--timeout`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialDefaults {
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Read timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Transfer timing and sizing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferDefaults {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Wait after the file request command before draining the reply
    #[serde(default = "default_request_settle_ms")]
    pub request_settle_ms: u64,
    /// Silence after which a transfer is considered finished
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Sleep between polls while the input buffer is empty
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Log sink configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions
fn default_baud_rate() -> u32 {
    9600
}

fn default_timeout_secs() -> u64 {
    1
}

fn default_chunk_size() -> usize {
    1024
}

fn default_request_settle_ms() -> u64 {
    1000
}

fn default_idle_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_log_file() -> PathBuf {
    PathBuf::from("serialgrab.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SerialDefaults {
    fn default() -> Self {
        Self {
            baud_rate: default_baud_rate(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TransferDefaults {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            request_settle_ms: default_request_settle_ms(),
            idle_timeout_secs: default_idle_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

impl TransferDefaults {
    pub fn request_settle(&self) -> Duration {
        Duration::from_millis(self.request_settle_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
