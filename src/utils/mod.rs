//! Utility modules for configuration, error handling, and formatting.

pub mod config;
pub mod error;
pub mod format;

// Re-export commonly used error types for convenience
pub use error::{CodecError, FormatError, OutputError, TimelineError};
pub use format::format_bytes;
