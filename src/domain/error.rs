use std::time::Duration;
use thiserror::Error;

/// SerialGrab unified error type
#[derive(Error, Debug)]
pub enum GrabError {
    #[error("No serial ports found")]
    NoPortsFound,

    #[error("No serial port matched {criterion}")]
    DeviceNotMatched { criterion: String },

    #[error("Failed to open serial port {port}: {source}")]
    Connection {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Device not connected")]
    NotConnected,

    #[error("No response from device after command '{command}'")]
    NoResponse { command: String },

    #[error("Timed out after {waited:?} without receiving any data")]
    Timeout { waited: Duration },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to enumerate serial ports: {0}")]
    Enumeration(#[source] serialport::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl GrabError {
    /// Process exit code for this failure. Every failure ends the run with 1.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

pub type GrabResult<T> = Result<T, GrabError>;
