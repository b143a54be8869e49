//! Allocator snapshot data model.
//!
//! A snapshot is what the allocator producer hands us: the segments it
//! currently owns (with their blocks) and one ordered event trace per device.
//! Values are immutable once decoded; every type here round-trips through
//! both the binary codec and the JSON rendition used by `snapviz encode`.

use serde::{Deserialize, Serialize};

use crate::utils::error::FormatError;

/// One call-stack entry attached to a block or trace event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame {
    pub filename: String,
    pub line: u32,
    /// Function name
    pub name: String,
}

impl Frame {
    pub fn new(filename: impl Into<String>, line: u32, name: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            line,
            name: name.into(),
        }
    }
}

/// Allocation state of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockState {
    /// Used by a live tensor
    ActiveAllocated,
    /// Freed, waiting for another stream to finish with it
    ActiveAwaitingFree,
    /// Free for reuse
    Inactive,
}

/// A piece of device memory inside a segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub size: u64,
    /// Size asked for by the caller; never larger than `size`
    pub requested_size: u64,
    pub address: u64,
    pub state: BlockState,
    pub frames: Vec<Frame>,
}

/// Size class of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    Small,
    Large,
}

/// A coarse memory region obtained from the device in one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub address: u64,
    pub total_size: u64,
    pub stream: i64,
    pub segment_type: SegmentType,
    /// Bytes in use
    pub allocated_size: u64,
    /// Bytes in use or awaiting cross-stream release
    pub active_size: u64,
    pub blocks: Vec<Block>,
}

/// Kind of allocator event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceAction {
    Alloc,
    FreeRequested,
    FreeCompleted,
    SegmentAlloc,
    SegmentFree,
    /// Out of memory; `size` is the request that failed
    Oom,
    Snapshot,
}

impl TraceAction {
    pub const ALL: [TraceAction; 7] = [
        TraceAction::Alloc,
        TraceAction::FreeRequested,
        TraceAction::FreeCompleted,
        TraceAction::SegmentAlloc,
        TraceAction::SegmentFree,
        TraceAction::Oom,
        TraceAction::Snapshot,
    ];

    /// Whether the trailing field of this event is `device_free` rather than `addr`
    pub fn carries_device_free(self) -> bool {
        self == TraceAction::Oom
    }

    /// JSON key of the trailing field
    pub fn target_key(self) -> &'static str {
        if self.carries_device_free() {
            "device_free"
        } else {
            "addr"
        }
    }
}

/// Action-discriminated trailing field of a trace entry.
///
/// Serialises as a single `"addr"` or `"device_free"` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceTarget {
    /// Device address the event concerns
    Addr(u64),
    /// Free device memory reported when an allocation failed
    DeviceFree(u64),
}

impl TraceTarget {
    /// Pick the variant the given action carries
    pub fn for_action(action: TraceAction, value: u64) -> Self {
        if action.carries_device_free() {
            TraceTarget::DeviceFree(value)
        } else {
            TraceTarget::Addr(value)
        }
    }

    /// Raw 8-byte payload regardless of variant
    pub fn raw(self) -> u64 {
        match self {
            TraceTarget::Addr(v) | TraceTarget::DeviceFree(v) => v,
        }
    }
}

/// One recorded allocator event
///
/// Deserialization rejects an entry whose trailing key does not match its
/// action (`device_free` on anything but `oom`, `addr` on `oom`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTraceEntry")]
pub struct TraceEntry {
    pub action: TraceAction,
    #[serde(flatten)]
    pub target: TraceTarget,
    pub frames: Vec<Frame>,
    pub size: u64,
    pub stream: i64,
}

impl TraceEntry {
    /// Build an entry whose trailing field matches its action
    pub fn new(action: TraceAction, stream: i64, size: u64, value: u64, frames: Vec<Frame>) -> Self {
        Self {
            action,
            target: TraceTarget::for_action(action, value),
            frames,
            size,
            stream,
        }
    }

    /// Whether the trailing field is the variant this action carries
    pub fn target_matches_action(&self) -> bool {
        self.target == TraceTarget::for_action(self.action, self.target.raw())
    }

    pub fn addr(&self) -> Option<u64> {
        match self.target {
            TraceTarget::Addr(addr) => Some(addr),
            TraceTarget::DeviceFree(_) => None,
        }
    }

    pub fn device_free(&self) -> Option<u64> {
        match self.target {
            TraceTarget::DeviceFree(free) => Some(free),
            TraceTarget::Addr(_) => None,
        }
    }
}

/// Unchecked wire shape of a trace entry as it appears in JSON
#[derive(Deserialize)]
struct RawTraceEntry {
    action: TraceAction,
    #[serde(flatten)]
    target: TraceTarget,
    frames: Vec<Frame>,
    size: u64,
    stream: i64,
}

impl TryFrom<RawTraceEntry> for TraceEntry {
    type Error = FormatError;

    fn try_from(raw: RawTraceEntry) -> Result<Self, Self::Error> {
        let entry = TraceEntry {
            action: raw.action,
            target: raw.target,
            frames: raw.frames,
            size: raw.size,
            stream: raw.stream,
        };
        if entry.target_matches_action() {
            Ok(entry)
        } else {
            Err(FormatError::MismatchedTarget {
                action: entry.action,
                expected: entry.action.target_key(),
            })
        }
    }
}

/// Full allocator snapshot; `device_traces[device_id]` is that device's trace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub segments: Vec<Segment>,
    pub device_traces: Vec<Vec<TraceEntry>>,
}

impl Snapshot {
    /// Trace for one device, if it was recorded
    pub fn device_trace(&self, device: usize) -> Option<&[TraceEntry]> {
        self.device_traces.get(device).map(Vec::as_slice)
    }

    /// Iterate every frame in every block and every trace entry
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        let block_frames = self
            .segments
            .iter()
            .flat_map(|segment| segment.blocks.iter())
            .flat_map(|block| block.frames.iter());

        let trace_frames = self
            .device_traces
            .iter()
            .flat_map(|trace| trace.iter())
            .flat_map(|entry| entry.frames.iter());

        block_frames.chain(trace_frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_follows_action() {
        let oom = TraceEntry::new(TraceAction::Oom, 0, 4096, 10240, vec![]);
        assert_eq!(oom.device_free(), Some(10240));
        assert_eq!(oom.addr(), None);

        for action in TraceAction::ALL.into_iter().filter(|a| *a != TraceAction::Oom) {
            let entry = TraceEntry::new(action, 0, 16, 0x1000, vec![]);
            assert_eq!(entry.addr(), Some(0x1000));
            assert_eq!(entry.device_free(), None);
        }
    }

    #[test]
    fn test_trace_entry_json_keys() {
        let alloc = TraceEntry::new(TraceAction::Alloc, 1, 1024, 0x1000, vec![]);
        let value = serde_json::to_value(&alloc).unwrap();
        assert_eq!(value["action"], "alloc");
        assert_eq!(value["addr"], 0x1000);
        assert!(value.get("device_free").is_none());

        let oom = TraceEntry::new(TraceAction::Oom, 2, 4096, 10240, vec![]);
        let value = serde_json::to_value(&oom).unwrap();
        assert_eq!(value["action"], "oom");
        assert_eq!(value["device_free"], 10240);
        assert!(value.get("addr").is_none());
    }

    #[test]
    fn test_trace_entry_from_json() {
        let json = r#"{
            "action": "free_completed",
            "addr": 4096,
            "frames": [{"filename": "model.py", "line": 12, "name": "forward"}],
            "size": 512,
            "stream": 0
        }"#;

        let entry: TraceEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.action, TraceAction::FreeCompleted);
        assert_eq!(entry.addr(), Some(4096));
        assert_eq!(entry.frames[0], Frame::new("model.py", 12, "forward"));
    }

    #[test]
    fn test_json_rejects_addr_on_oom() {
        let json = r#"{"action":"oom","addr":5,"frames":[],"size":4096,"stream":0}"#;
        let err = serde_json::from_str::<TraceEntry>(json).unwrap_err();
        assert!(err.to_string().contains("\"device_free\""), "{}", err);
    }

    #[test]
    fn test_json_rejects_device_free_on_alloc() {
        let json = r#"{"action":"alloc","device_free":16,"frames":[],"size":16,"stream":0}"#;
        assert!(serde_json::from_str::<TraceEntry>(json).is_err());
    }

    #[test]
    fn test_target_matches_action() {
        let mut entry = TraceEntry::new(TraceAction::Alloc, 0, 16, 0x1000, vec![]);
        assert!(entry.target_matches_action());

        entry.target = TraceTarget::DeviceFree(0x1000);
        assert!(!entry.target_matches_action());
    }

    #[test]
    fn test_frames_covers_blocks_and_traces() {
        let snapshot = Snapshot {
            segments: vec![Segment {
                address: 0,
                total_size: 2048,
                stream: 0,
                segment_type: SegmentType::Small,
                allocated_size: 1024,
                active_size: 1024,
                blocks: vec![Block {
                    size: 1024,
                    requested_size: 1000,
                    address: 0,
                    state: BlockState::ActiveAllocated,
                    frames: vec![Frame::new("a.py", 1, "f")],
                }],
            }],
            device_traces: vec![vec![TraceEntry::new(
                TraceAction::Alloc,
                0,
                1024,
                0,
                vec![Frame::new("b.py", 2, "g")],
            )]],
        };

        let names: Vec<&str> = snapshot.frames().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["f", "g"]);
    }
}
