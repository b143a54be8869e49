//! Timeline reconstruction.
//!
//! Replays a classified device trace as a simulated memory stack. Live
//! elements are stacked in allocation order; freeing one compacts everything
//! placed after it, which turns scattered address ranges into a stable
//! stacked timeline. Elements at or beyond `max_visible` are only tracked in
//! aggregate through the summarized bucket.

use std::collections::HashSet;

use log::{debug, info};

use super::classifier::{classify_trace, Classified, Granularity};
use super::model::{AllocationRecord, Element, SummarizedBucket, Timeline};
use crate::snapshot::TraceEntry;
use crate::utils::config::DEFAULT_MAX_ENTRIES;
use crate::utils::format_bytes;

/// Clock ticks consumed by placing a new allocation
pub const ALLOC_TICKS: u64 = 1;

/// Clock ticks used to animate compaction after a free
pub const SHIFT_TICKS: u64 = 3;

/// Clock ticks consumed by the free itself
pub const FREE_TICKS: u64 = 1;

/// Clock ticks consumed by a summarized element entering or leaving the bucket
pub const SUMMARIZED_TICKS: u64 = 1;

/// Replay parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Elem ids below this get their own allocation record
    pub max_visible: usize,
    pub granularity: Granularity,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            max_visible: DEFAULT_MAX_ENTRIES,
            granularity: Granularity::Block,
        }
    }
}

/// Mutable state of one replay pass
#[derive(Debug, Default)]
struct ReplayState {
    timestep: u64,
    total_live: u64,
    total_summarized: u64,
    max_size: u64,
    max_at_time: Vec<u64>,
    summarized: SummarizedBucket,
    summarized_elems: HashSet<usize>,
    /// Every record opened so far
    records: Vec<AllocationRecord>,
    /// Indices into `records` of live entries, in placement order
    current: Vec<usize>,
}

impl ReplayState {
    /// Advance the clock, sampling the bucket once and the totals once per tick
    fn advance(&mut self, ticks: u64) {
        self.summarized
            .sample(self.timestep, self.total_live, self.total_summarized);
        self.timestep += ticks;

        let total = self.total_live.saturating_add(self.total_summarized);
        for _ in 0..ticks {
            self.max_at_time.push(total);
        }
        self.observe_peak();
    }

    fn observe_peak(&mut self) {
        self.max_size = self
            .max_size
            .max(self.total_live.saturating_add(self.total_summarized));
    }

    /// Place an element on top of the stack without advancing the clock
    fn place(&mut self, elem: usize, size: u64) {
        let record = AllocationRecord::open(elem, self.timestep, self.total_live, size);
        self.records.push(record);
        self.current.push(self.records.len() - 1);
        self.total_live = self.total_live.saturating_add(size);
    }

    /// Position in `current` of the most recently placed record for `elem`
    fn find_live(&self, elem: usize) -> Option<usize> {
        self.current
            .iter()
            .rposition(|&record| self.records[record].elem == elem)
    }

    fn toggle_summarized(&mut self, elem: usize, size: u64) {
        if self.summarized_elems.remove(&elem) {
            self.advance(SUMMARIZED_TICKS);
            self.total_summarized = self.total_summarized.saturating_sub(size);
        } else {
            self.summarized_elems.insert(elem);
            self.total_summarized = self.total_summarized.saturating_add(size);
            self.advance(SUMMARIZED_TICKS);
        }
    }

    fn allocate(&mut self, elem: usize, size: u64) {
        self.place(elem, size);
        self.advance(ALLOC_TICKS);
    }

    /// Close the record at `position`, then slide everything above it down
    fn free(&mut self, position: usize, size: u64) {
        let freed = self.current.remove(position);
        let record = &mut self.records[freed];
        let offset = record.last_offset();
        record.push(self.timestep, offset);

        if position < self.current.len() {
            let start = self.timestep;
            for &above in &self.current[position..] {
                let record = &mut self.records[above];
                let offset = record.last_offset();
                record.push(start, offset);
                record.push(start + SHIFT_TICKS, offset.saturating_sub(size));
            }
            self.advance(SHIFT_TICKS);
        }

        self.total_live = self.total_live.saturating_sub(size);
        self.advance(FREE_TICKS);
    }

    /// Close every live record at the final clock value
    fn finish(mut self, elements: Vec<Element>) -> Timeline {
        let timestep = self.timestep;
        for &live in &self.current {
            let record = &mut self.records[live];
            let offset = record.last_offset();
            record.push(timestep, offset);
        }

        Timeline {
            max_size: self.max_size,
            allocations: self.records,
            summarized: self.summarized,
            max_at_time: self.max_at_time,
            elements,
            final_timestep: timestep,
        }
    }
}

/// Replay an already classified trace
pub fn replay(classified: Classified, max_visible: usize) -> Timeline {
    let Classified {
        elements,
        initially_live,
        actions,
    } = classified;
    let mut state = ReplayState::default();

    // Elements alive before the trace window, stacked in reverse discovery order
    for &elem in initially_live.iter().rev() {
        let size = elements[elem].size();
        if elem < max_visible {
            state.place(elem, size);
        } else {
            state.summarized_elems.insert(elem);
            state.total_summarized = state.total_summarized.saturating_add(size);
        }
    }

    for &elem in &actions {
        let size = elements[elem].size();

        if elem >= max_visible {
            state.toggle_summarized(elem, size);
        } else {
            match state.find_live(elem) {
                None => state.allocate(elem, size),
                Some(position) => state.free(position, size),
            }
        }

        state.observe_peak();
    }

    debug!(
        "Replayed {} actions over {} ticks, {} summarized element(s) still live",
        actions.len(),
        state.timestep,
        state.summarized_elems.len()
    );

    state.finish(elements)
}

/// Classify and replay one device trace
pub fn reconstruct(trace: &[TraceEntry], options: ReplayOptions) -> Timeline {
    let classified = classify_trace(trace, options.granularity);
    let timeline = replay(classified, options.max_visible);

    info!(
        "Reconstructed {} allocation record(s) from {} element(s), peak {}",
        timeline.allocations.len(),
        timeline.elements.len(),
        format_bytes(timeline.max_size)
    );

    timeline
}
