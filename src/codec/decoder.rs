//! Snapshot decoder.

use log::{debug, warn};

use super::format::{
    BLOCK_MIN_WIRE_SIZE, FORMAT_VERSION, FRAME_WIRE_SIZE, SEGMENT_MIN_WIRE_SIZE, SNAPSHOT_MAGIC,
    TRACE_ENTRY_MIN_WIRE_SIZE,
};
use super::io::SliceReader;
use super::strings::StringTable;
use crate::snapshot::{
    Block, BlockState, Frame, Segment, SegmentType, Snapshot, TraceAction, TraceEntry, TraceTarget,
};
use crate::utils::error::{CodecError, FormatError};

type Result<T> = std::result::Result<T, CodecError>;

/// Reads one snapshot out of a byte buffer
pub struct Decoder<'a> {
    reader: SliceReader<'a>,
    strings: StringTable,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: SliceReader::new(data),
            strings: StringTable::default(),
        }
    }

    /// Decode header, string table, segments and device traces
    pub fn decode(mut self) -> Result<Snapshot> {
        self.read_header()?;
        self.strings = StringTable::read_from(&mut self.reader)?;
        debug!("Decoded string table with {} entries", self.strings.len());

        let (count, mut segments) = self
            .reader
            .read_count::<Segment>("segment_count", SEGMENT_MIN_WIRE_SIZE)?;
        for _ in 0..count {
            segments.push(self.read_segment()?);
        }

        let (count, mut device_traces) = self.reader.read_count::<Vec<TraceEntry>>("device_count", 4)?;
        for _ in 0..count {
            let (entries, mut trace) = self
                .reader
                .read_count::<TraceEntry>("entry_count", TRACE_ENTRY_MIN_WIRE_SIZE)?;
            for _ in 0..entries {
                trace.push(self.read_trace_entry()?);
            }
            device_traces.push(trace);
        }

        if self.reader.remaining() > 0 {
            warn!(
                "Ignoring {} trailing bytes after snapshot at offset {}",
                self.reader.remaining(),
                self.reader.position()
            );
        }

        Ok(Snapshot {
            segments,
            device_traces,
        })
    }

    fn read_header(&mut self) -> Result<()> {
        let magic = self.reader.read_bytes("magic", SNAPSHOT_MAGIC.len())?;
        if magic != SNAPSHOT_MAGIC {
            let mut found = [0u8; 4];
            found.copy_from_slice(magic);
            return Err(FormatError::BadMagic(found).into());
        }

        let version = self.reader.read_u8("version")?;
        if version != FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion {
                found: version,
                expected: FORMAT_VERSION,
            }
            .into());
        }
        Ok(())
    }

    fn read_segment(&mut self) -> Result<Segment> {
        let address = self.reader.read_u64_le("segment address")?;
        let total_size = self.reader.read_u64_le("segment total_size")?;
        let stream = self.reader.read_i64_le("segment stream")?;
        let segment_type = SegmentType::from_wire(self.reader.read_u8("segment_type")?)?;
        let allocated_size = self.reader.read_u64_le("segment allocated_size")?;
        let active_size = self.reader.read_u64_le("segment active_size")?;

        let (count, mut blocks) = self.reader.read_count::<Block>("block_count", BLOCK_MIN_WIRE_SIZE)?;
        for _ in 0..count {
            blocks.push(self.read_block()?);
        }

        Ok(Segment {
            address,
            total_size,
            stream,
            segment_type,
            allocated_size,
            active_size,
            blocks,
        })
    }

    fn read_block(&mut self) -> Result<Block> {
        let size = self.reader.read_u64_le("block size")?;
        let requested_size = self.reader.read_u64_le("block requested_size")?;
        let address = self.reader.read_u64_le("block address")?;
        let state = BlockState::from_wire(self.reader.read_u8("block state")?)?;
        let frames = self.read_frames()?;

        Ok(Block {
            size,
            requested_size,
            address,
            state,
            frames,
        })
    }

    fn read_trace_entry(&mut self) -> Result<TraceEntry> {
        let action = TraceAction::from_wire(self.reader.read_u8("trace action")?)?;
        let stream = self.reader.read_i64_le("trace stream")?;
        let size = self.reader.read_u64_le("trace size")?;
        let target = if action.carries_device_free() {
            TraceTarget::DeviceFree(self.reader.read_u64_le("trace device_free")?)
        } else {
            TraceTarget::Addr(self.reader.read_u64_le("trace addr")?)
        };
        let frames = self.read_frames()?;

        Ok(TraceEntry {
            action,
            target,
            frames,
            size,
            stream,
        })
    }

    fn read_frames(&mut self) -> Result<Vec<Frame>> {
        let (count, mut frames) = self.reader.read_count::<Frame>("frame_count", FRAME_WIRE_SIZE)?;
        for _ in 0..count {
            let filename_id = self.reader.read_u32_le("frame filename id")?;
            let line = self.reader.read_u32_le("frame line")?;
            let name_id = self.reader.read_u32_le("frame name id")?;

            frames.push(Frame {
                filename: self.strings.resolve(filename_id)?.to_owned(),
                line,
                name: self.strings.resolve(name_id)?.to_owned(),
            });
        }
        Ok(frames)
    }
}

/// Decode a complete snapshot from bytes
pub fn decode(data: &[u8]) -> Result<Snapshot> {
    Decoder::new(data).decode()
}
