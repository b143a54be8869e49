//! Interned strings for frame filenames and function names.
//!
//! Ids are positions in the lexicographically sorted set of distinct strings,
//! so the same snapshot always gets the same ids no matter how it was built.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;

use super::io::{SliceReader, WriteLeExt};
use crate::snapshot::Snapshot;
use crate::utils::error::{CodecError, FormatError};

/// Bijection between a sorted set of strings and dense ids `0..n`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    strings: Vec<String>,
    ids: HashMap<String, u32>,
}

impl StringTable {
    /// Collect every frame string in the snapshot and assign sorted ids
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, CodecError> {
        let unique: BTreeSet<&str> = snapshot
            .frames()
            .flat_map(|frame| [frame.filename.as_str(), frame.name.as_str()])
            .collect();

        Self::from_sorted(unique.into_iter().map(str::to_owned).collect())
    }

    fn from_sorted(strings: Vec<String>) -> Result<Self, CodecError> {
        if u32::try_from(strings.len()).is_err() {
            return Err(CodecError::TooLarge {
                what: "string table",
                len: strings.len(),
            });
        }

        let ids = strings
            .iter()
            .enumerate()
            .map(|(id, s)| (s.clone(), id as u32))
            .collect();

        Ok(Self { strings, ids })
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Id of an interned string
    pub fn id(&self, s: &str) -> Option<u32> {
        self.ids.get(s).copied()
    }

    /// String for an id read off the wire
    pub fn resolve(&self, id: u32) -> Result<&str, FormatError> {
        self.strings
            .get(id as usize)
            .map(String::as_str)
            .ok_or(FormatError::StringIdOutOfRange {
                id,
                len: self.strings.len(),
            })
    }

    /// Write count, then `u32 len + UTF-8 bytes` per string
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CodecError> {
        writer.write_len_u32("string count", self.strings.len())?;
        for s in &self.strings {
            writer.write_string_u32(s)?;
        }
        Ok(())
    }

    /// Read a table written by [`StringTable::write_to`].
    ///
    /// The wire order is taken as-is; decode never re-sorts.
    pub fn read_from(reader: &mut SliceReader<'_>) -> Result<Self, CodecError> {
        let (count, mut strings) = reader.read_count::<String>("string_count", 4)?;

        for index in 0..count {
            let len = reader.read_u32_le("string length")? as usize;
            let bytes = reader.read_bytes("string bytes", len)?;
            let s = std::str::from_utf8(bytes).map_err(|_| FormatError::InvalidUtf8 { index })?;
            strings.push(s.to_owned());
        }

        let ids = strings
            .iter()
            .enumerate()
            .map(|(id, s)| (s.clone(), id as u32))
            .collect();

        Ok(Self { strings, ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Frame, TraceAction, TraceEntry};

    fn snapshot_with_frames(frames: Vec<Frame>) -> Snapshot {
        Snapshot {
            segments: vec![],
            device_traces: vec![vec![TraceEntry::new(TraceAction::Alloc, 0, 8, 0, frames)]],
        }
    }

    #[test]
    fn test_ids_are_sorted_and_deduplicated() {
        let snapshot = snapshot_with_frames(vec![
            Frame::new("z.py", 1, "main"),
            Frame::new("a.py", 2, "main"),
        ]);

        let table = StringTable::from_snapshot(&snapshot).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.id("a.py"), Some(0));
        assert_eq!(table.id("main"), Some(1));
        assert_eq!(table.id("z.py"), Some(2));
    }

    #[test]
    fn test_traversal_order_does_not_change_ids() {
        let forward = snapshot_with_frames(vec![
            Frame::new("x.py", 1, "f"),
            Frame::new("y.py", 1, "g"),
        ]);
        let reversed = snapshot_with_frames(vec![
            Frame::new("y.py", 1, "g"),
            Frame::new("x.py", 1, "f"),
        ]);

        assert_eq!(
            StringTable::from_snapshot(&forward).unwrap(),
            StringTable::from_snapshot(&reversed).unwrap()
        );
    }

    #[test]
    fn test_wire_roundtrip_and_layout() {
        let snapshot = snapshot_with_frames(vec![Frame::new("ab", 1, "c")]);
        let table = StringTable::from_snapshot(&snapshot).unwrap();

        let mut buf = Vec::new();
        table.write_to(&mut buf).unwrap();
        assert_eq!(buf, vec![2, 0, 0, 0, 2, 0, 0, 0, b'a', b'b', 1, 0, 0, 0, b'c']);

        let mut reader = SliceReader::new(&buf);
        let decoded = StringTable::read_from(&mut reader).unwrap();
        assert_eq!(decoded, table);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_resolve_out_of_range() {
        let table = StringTable::default();
        assert_eq!(
            table.resolve(0),
            Err(FormatError::StringIdOutOfRange { id: 0, len: 0 })
        );
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let buf = [1, 0, 0, 0, 2, 0, 0, 0, 0xc3, 0x28];
        let err = StringTable::read_from(&mut SliceReader::new(&buf)).unwrap_err();
        assert!(matches!(err, CodecError::Format(FormatError::InvalidUtf8 { index: 0 })));
    }
}
