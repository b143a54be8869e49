//! Versioned binary format for allocator snapshots.
//!
//! Layout (all integers little-endian):
//! - header: magic `SNAP`, u8 version (= 1)
//! - string table: u32 count, then `u32 len + UTF-8 bytes` per string
//! - segments: u32 count, each with its blocks and their frames
//! - device traces: u32 device count, then per device a u32 entry count and entries
//!
//! Frame strings are written as u32 string-table ids. A trace entry's
//! trailing u64 is `device_free` when the action is `oom` and `addr` otherwise.

pub mod decoder;
pub mod encoder;
pub mod format;
pub mod io;
pub mod strings;

pub use decoder::{decode, Decoder};
pub use encoder::{encode, Encoder};
pub use format::{FORMAT_VERSION, SNAPSHOT_MAGIC};
pub use strings::StringTable;

use std::path::Path;

use log::{debug, info};

use crate::snapshot::Snapshot;
use crate::utils::error::CodecError;

/// Read and decode a snapshot file
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<Snapshot, CodecError> {
    let path = path.as_ref();
    debug!("Reading snapshot from: {}", path.display());

    let data = std::fs::read(path)?;
    let snapshot = decode(&data)?;

    info!(
        "Decoded {} ({} bytes): {} segment(s), {} device trace(s)",
        path.display(),
        data.len(),
        snapshot.segments.len(),
        snapshot.device_traces.len()
    );
    Ok(snapshot)
}

/// Encode a snapshot and write it to a file
pub fn write_snapshot(snapshot: &Snapshot, path: impl AsRef<Path>) -> Result<usize, CodecError> {
    let path = path.as_ref();
    let data = encode(snapshot)?;
    std::fs::write(path, &data)?;
    info!("Snapshot written to {} ({} bytes)", path.display(), data.len());
    Ok(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Frame, TraceAction, TraceEntry, TraceTarget};
    use crate::utils::error::FormatError;
    use pretty_assertions::assert_eq;

    fn tiny_snapshot() -> Snapshot {
        Snapshot {
            segments: vec![],
            device_traces: vec![vec![TraceEntry::new(
                TraceAction::Oom,
                -1,
                0x20,
                0x99,
                vec![Frame::new("f", 7, "g")],
            )]],
        }
    }

    #[test]
    fn test_exact_layout() {
        let bytes = encode(&tiny_snapshot()).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"SNAP");
        expected.push(1);
        // string table: "f", "g"
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.push(b'f');
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.push(b'g');
        // no segments
        expected.extend_from_slice(&0u32.to_le_bytes());
        // one device, one entry
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.push(5);
        expected.extend_from_slice(&(-1i64).to_le_bytes());
        expected.extend_from_slice(&0x20u64.to_le_bytes());
        expected.extend_from_slice(&0x99u64.to_le_bytes());
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&0u32.to_le_bytes());
        expected.extend_from_slice(&7u32.to_le_bytes());
        expected.extend_from_slice(&1u32.to_le_bytes());

        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_empty_snapshot() {
        let bytes = encode(&Snapshot::default()).unwrap();
        assert_eq!(bytes.len(), 4 + 1 + 4 + 4 + 4);
        assert_eq!(decode(&bytes).unwrap(), Snapshot::default());
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = encode(&tiny_snapshot()).unwrap();
        bytes[0] = b'X';
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::Format(FormatError::BadMagic(m)) if &m == b"XNAP"));
    }

    #[test]
    fn test_rejects_bad_version() {
        let mut bytes = encode(&tiny_snapshot()).unwrap();
        bytes[4] = 2;
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Format(FormatError::UnsupportedVersion { found: 2, expected: 1 })
        ));
    }

    #[test]
    fn test_rejects_every_truncation() {
        let bytes = encode(&tiny_snapshot()).unwrap();
        for len in 0..bytes.len() {
            let err = decode(&bytes[..len]).unwrap_err();
            assert!(
                matches!(err, CodecError::TruncatedData { .. }),
                "prefix of {} bytes gave {:?}",
                len,
                err
            );
        }
    }

    #[test]
    fn test_rejects_unmapped_action() {
        let mut bytes = encode(&tiny_snapshot()).unwrap();
        // magic + version + table (4 + 5 + 5) + segment count + device count + entry count
        let action_offset = 4 + 1 + 14 + 4 + 4 + 4;
        assert_eq!(bytes[action_offset], 5);
        bytes[action_offset] = 9;
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Format(FormatError::UnmappedEnum { field: "trace action", value: 9 })
        ));
    }

    #[test]
    fn test_rejects_string_id_out_of_range() {
        let mut bytes = encode(&tiny_snapshot()).unwrap();
        // last u32 is the frame's name id
        let at = bytes.len() - 4;
        bytes[at..].copy_from_slice(&2u32.to_le_bytes());
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Format(FormatError::StringIdOutOfRange { id: 2, len: 2 })
        ));
    }

    #[test]
    fn test_encode_rejects_target_not_matching_action() {
        let mut oom_with_addr = tiny_snapshot();
        oom_with_addr.device_traces[0][0].target = TraceTarget::Addr(0x99);
        let err = encode(&oom_with_addr).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Format(FormatError::MismatchedTarget {
                action: TraceAction::Oom,
                expected: "device_free",
            })
        ));

        let mut alloc = TraceEntry::new(TraceAction::Alloc, 0, 16, 0x10, vec![]);
        alloc.target = TraceTarget::DeviceFree(16);
        let alloc_with_device_free = Snapshot {
            segments: vec![],
            device_traces: vec![vec![alloc]],
        };
        let err = encode(&alloc_with_device_free).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Format(FormatError::MismatchedTarget {
                action: TraceAction::Alloc,
                expected: "addr",
            })
        ));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut bytes = encode(&tiny_snapshot()).unwrap();
        bytes.extend_from_slice(&[0xde, 0xad]);
        assert_eq!(decode(&bytes).unwrap(), tiny_snapshot());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.snap");

        let written = write_snapshot(&tiny_snapshot(), &path).unwrap();
        assert_eq!(written as u64, std::fs::metadata(&path).unwrap().len());
        assert_eq!(read_snapshot(&path).unwrap(), tiny_snapshot());
    }
}
