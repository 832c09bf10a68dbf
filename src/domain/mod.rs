// Domain module - Data model, errors and configuration types
pub mod config;
pub mod error;
pub mod port;

pub use port::{PortInfo, SelectionCriterion, UsbIds};
