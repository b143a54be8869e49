//! Timeline entities produced by a replay pass.

use serde::{Deserialize, Serialize};

use crate::snapshot::TraceEntry;

/// A classified event carried forward for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Position of the originating entry in the device trace
    pub trace_index: usize,
    pub entry: TraceEntry,
}

impl Element {
    pub fn size(&self) -> u64 {
        self.entry.size
    }
}

/// Offset/timestep curve of one individually displayed element.
///
/// `timesteps` and `offsets` always have equal length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    /// Elem id: index into the timeline's elements
    pub elem: usize,
    pub timesteps: Vec<u64>,
    pub offsets: Vec<u64>,
    pub size: u64,
    pub color: usize,
}

impl AllocationRecord {
    pub(crate) fn open(elem: usize, timestep: u64, offset: u64, size: u64) -> Self {
        Self {
            elem,
            timesteps: vec![timestep],
            offsets: vec![offset],
            size,
            color: elem,
        }
    }

    /// Append one sample
    pub(crate) fn push(&mut self, timestep: u64, offset: u64) {
        self.timesteps.push(timestep);
        self.offsets.push(offset);
    }

    pub fn last_offset(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    pub fn first_timestep(&self) -> u64 {
        self.timesteps.first().copied().unwrap_or(0)
    }

    pub fn last_timestep(&self) -> u64 {
        self.timesteps.last().copied().unwrap_or(0)
    }

    pub fn is_alive_at(&self, timestep: u64) -> bool {
        self.first_timestep() <= timestep && timestep <= self.last_timestep()
    }

    /// Highest point this record reaches in the stack: `max(offsets) + size`
    pub fn peak_mem(&self) -> u64 {
        self.offsets
            .iter()
            .max()
            .copied()
            .unwrap_or(0)
            .saturating_add(self.size)
    }

    /// Timesteps at which the record sits at its highest offset
    pub fn peak_timesteps(&self) -> Vec<u64> {
        let top = self.offsets.iter().max().copied().unwrap_or(0);
        self.timesteps
            .iter()
            .zip(&self.offsets)
            .filter(|(_, offset)| **offset == top)
            .map(|(&timestep, _)| timestep)
            .collect()
    }
}

/// Aggregate record for every element at or beyond the display cutoff.
///
/// Three parallel arrays, one sample per clock advance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizedBucket {
    pub timesteps: Vec<u64>,
    /// Live (non-summarized) bytes at the sample: the bucket stacks on top of them
    pub offsets: Vec<u64>,
    /// Summarized bytes at the sample
    pub size: Vec<u64>,
}

impl SummarizedBucket {
    pub(crate) fn sample(&mut self, timestep: u64, offset: u64, size: u64) {
        self.timesteps.push(timestep);
        self.offsets.push(offset);
        self.size.push(size);
    }

    pub fn len(&self) -> usize {
        self.timesteps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timesteps.is_empty()
    }
}

/// Output of one replay pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    /// Highest `live + summarized` bytes observed
    pub max_size: u64,
    /// One record per individually displayed element, in the order they were opened
    pub allocations: Vec<AllocationRecord>,
    pub summarized: SummarizedBucket,
    /// `live + summarized` bytes, one sample per clock tick
    pub max_at_time: Vec<u64>,
    pub elements: Vec<Element>,
    /// Clock value when the replay finished
    pub final_timestep: u64,
}
