//! Wire constants and enum byte mappings.

use crate::snapshot::{BlockState, SegmentType, TraceAction};
use crate::utils::error::FormatError;

pub const SNAPSHOT_MAGIC: &[u8; 4] = b"SNAP";
pub const FORMAT_VERSION: u8 = 1;

/// u32 filename id + u32 line + u32 name id
pub const FRAME_WIRE_SIZE: usize = 12;

/// Smallest possible encoded trace entry (no frames)
pub const TRACE_ENTRY_MIN_WIRE_SIZE: usize = 1 + 8 + 8 + 8 + 4;

/// Smallest possible encoded block (no frames)
pub const BLOCK_MIN_WIRE_SIZE: usize = 8 + 8 + 8 + 1 + 4;

/// Smallest possible encoded segment (no blocks)
pub const SEGMENT_MIN_WIRE_SIZE: usize = 8 + 8 + 8 + 1 + 8 + 8 + 4;

impl BlockState {
    pub fn to_wire(self) -> u8 {
        match self {
            BlockState::ActiveAllocated => 0,
            BlockState::ActiveAwaitingFree => 1,
            BlockState::Inactive => 2,
        }
    }

    pub fn from_wire(value: u8) -> Result<Self, FormatError> {
        match value {
            0 => Ok(BlockState::ActiveAllocated),
            1 => Ok(BlockState::ActiveAwaitingFree),
            2 => Ok(BlockState::Inactive),
            _ => Err(FormatError::UnmappedEnum {
                field: "block state",
                value,
            }),
        }
    }
}

impl SegmentType {
    pub fn to_wire(self) -> u8 {
        match self {
            SegmentType::Small => 0,
            SegmentType::Large => 1,
        }
    }

    pub fn from_wire(value: u8) -> Result<Self, FormatError> {
        match value {
            0 => Ok(SegmentType::Small),
            1 => Ok(SegmentType::Large),
            _ => Err(FormatError::UnmappedEnum {
                field: "segment type",
                value,
            }),
        }
    }
}

impl TraceAction {
    pub fn to_wire(self) -> u8 {
        match self {
            TraceAction::Alloc => 0,
            TraceAction::FreeRequested => 1,
            TraceAction::FreeCompleted => 2,
            TraceAction::SegmentAlloc => 3,
            TraceAction::SegmentFree => 4,
            TraceAction::Oom => 5,
            TraceAction::Snapshot => 6,
        }
    }

    pub fn from_wire(value: u8) -> Result<Self, FormatError> {
        match value {
            0 => Ok(TraceAction::Alloc),
            1 => Ok(TraceAction::FreeRequested),
            2 => Ok(TraceAction::FreeCompleted),
            3 => Ok(TraceAction::SegmentAlloc),
            4 => Ok(TraceAction::SegmentFree),
            5 => Ok(TraceAction::Oom),
            6 => Ok(TraceAction::Snapshot),
            _ => Err(FormatError::UnmappedEnum {
                field: "trace action",
                value,
            }),
        }
    }
}
