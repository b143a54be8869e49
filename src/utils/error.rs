//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

use crate::snapshot::TraceAction;

/// Fatal conditions that make a byte stream not a valid snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("bad magic {0:?}, expected \"SNAP\"")]
    BadMagic([u8; 4]),

    #[error("unsupported format version {found}, expected {expected}")]
    UnsupportedVersion { found: u8, expected: u8 },

    #[error("unmapped {field} value {value}")]
    UnmappedEnum { field: &'static str, value: u8 },

    #[error("string id {id} out of range (table holds {len} strings)")]
    StringIdOutOfRange { id: u32, len: usize },

    #[error("string table entry {index} is not valid UTF-8")]
    InvalidUtf8 { index: usize },

    #[error("{action:?} entry carries the wrong trailing field, expected {expected:?}")]
    MismatchedTarget {
        action: TraceAction,
        expected: &'static str,
    },
}

/// Errors raised while encoding or decoding the binary snapshot format
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("invalid snapshot: {0}")]
    Format(#[from] FormatError),

    #[error("truncated snapshot: {field} needs {needed} bytes, only {available} remain")]
    TruncatedData {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("{what} of {len} does not fit in a u32 field")]
    TooLarge { what: &'static str, len: usize },

    #[error("frame string {0:?} is not in the string table")]
    MissingString(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while selecting or replaying a device trace
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    #[error("device id {device} out of range: snapshot records {count} device(s)")]
    DeviceIndex { device: usize, count: usize },
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Archive {0} has no matching JSON member")]
    MissingMember(String),

    #[error("{count} allocation record(s) have mismatched timesteps/offsets lengths")]
    MismatchedLengths { count: usize },
}
