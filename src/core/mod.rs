// Core module - Device matching and file extraction
pub mod extractor;
pub mod matcher;

pub use extractor::{Completion, ExtractOptions, FileExtractor, TransferReport};
pub use matcher::find_device;
