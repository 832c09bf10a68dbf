//! SerialGrab Library
//!
//! Finds a serial device by USB vendor/product ID or description, opens a
//! connection to it and extracts a file the device streams back in
//! response to a text command.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use domain::error::{GrabError, GrabResult};
pub use domain::config::GrabConfig;
pub use domain::port::{PortInfo, SelectionCriterion};
pub use crate::core::{find_device, FileExtractor, ExtractOptions, TransferReport, Completion};
pub use infrastructure::serial::{list_ports, SerialSession, ConnectionSettings};
