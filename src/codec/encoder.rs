//! Snapshot encoder.

use std::io::Write;

use log::debug;

use super::format::{FORMAT_VERSION, SNAPSHOT_MAGIC};
use super::io::WriteLeExt;
use super::strings::StringTable;
use crate::snapshot::{Block, Frame, Segment, Snapshot, TraceEntry};
use crate::utils::error::{CodecError, FormatError};

type Result<T> = std::result::Result<T, CodecError>;

/// Writes one snapshot using a string table built from that same snapshot
pub struct Encoder<'a> {
    snapshot: &'a Snapshot,
    strings: StringTable,
}

impl<'a> Encoder<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Result<Self> {
        let strings = StringTable::from_snapshot(snapshot)?;
        debug!("Interned {} distinct frame strings", strings.len());
        Ok(Self { snapshot, strings })
    }

    /// Write the complete snapshot: header, string table, segments, device traces
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(SNAPSHOT_MAGIC)?;
        writer.write_u8(FORMAT_VERSION)?;

        self.strings.write_to(writer)?;

        writer.write_len_u32("segment count", self.snapshot.segments.len())?;
        for segment in &self.snapshot.segments {
            self.write_segment(writer, segment)?;
        }

        writer.write_len_u32("device count", self.snapshot.device_traces.len())?;
        for trace in &self.snapshot.device_traces {
            writer.write_len_u32("trace entry count", trace.len())?;
            for entry in trace {
                self.write_trace_entry(writer, entry)?;
            }
        }

        Ok(())
    }

    fn write_segment<W: Write + ?Sized>(&self, writer: &mut W, segment: &Segment) -> Result<()> {
        writer.write_u64_le(segment.address)?;
        writer.write_u64_le(segment.total_size)?;
        writer.write_i64_le(segment.stream)?;
        writer.write_u8(segment.segment_type.to_wire())?;
        writer.write_u64_le(segment.allocated_size)?;
        writer.write_u64_le(segment.active_size)?;

        writer.write_len_u32("block count", segment.blocks.len())?;
        for block in &segment.blocks {
            self.write_block(writer, block)?;
        }
        Ok(())
    }

    fn write_block<W: Write + ?Sized>(&self, writer: &mut W, block: &Block) -> Result<()> {
        writer.write_u64_le(block.size)?;
        writer.write_u64_le(block.requested_size)?;
        writer.write_u64_le(block.address)?;
        writer.write_u8(block.state.to_wire())?;
        self.write_frames(writer, &block.frames)
    }

    fn write_trace_entry<W: Write + ?Sized>(&self, writer: &mut W, entry: &TraceEntry) -> Result<()> {
        // Decode picks the variant from the action byte, so a mismatch would not survive a round trip
        if !entry.target_matches_action() {
            return Err(FormatError::MismatchedTarget {
                action: entry.action,
                expected: entry.action.target_key(),
            }
            .into());
        }

        writer.write_u8(entry.action.to_wire())?;
        writer.write_i64_le(entry.stream)?;
        writer.write_u64_le(entry.size)?;
        writer.write_u64_le(entry.target.raw())?;
        self.write_frames(writer, &entry.frames)
    }

    fn write_frames<W: Write + ?Sized>(&self, writer: &mut W, frames: &[Frame]) -> Result<()> {
        writer.write_len_u32("frame count", frames.len())?;
        for frame in frames {
            writer.write_u32_le(self.string_id(&frame.filename)?)?;
            writer.write_u32_le(frame.line)?;
            writer.write_u32_le(self.string_id(&frame.name)?)?;
        }
        Ok(())
    }

    fn string_id(&self, s: &str) -> Result<u32> {
        // The table was collected from this snapshot, so every frame string is present
        self.strings
            .id(s)
            .ok_or_else(|| CodecError::MissingString(s.to_owned()))
    }
}

/// Encode a snapshot into a fresh byte buffer.
///
/// Output is deterministic: equal snapshots give identical bytes.
pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let encoder = Encoder::new(snapshot)?;
    let mut buf = Vec::new();
    encoder.write_to(&mut buf)?;
    debug!("Encoded snapshot into {} bytes", buf.len());
    Ok(buf)
}
