//! Allocation/free classification of trace events.
//!
//! Pass 1 of the replay: decide which entries allocate, which free, and pair
//! frees with their allocations by device address.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::model::Element;
use crate::snapshot::{TraceAction, TraceEntry};

/// Granularity at which memory is tracked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Individual blocks: `alloc`/`segment_alloc` allocate, `free_completed` frees
    #[default]
    Block,
    /// Whole segments: `segment_alloc` allocates, `segment_free` frees
    Segment,
}

/// Role of an event under a granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    Allocation,
    Free,
    /// Ignored by the replay
    Inert,
}

impl Granularity {
    pub fn classify(self, action: TraceAction) -> EventClass {
        match (self, action) {
            (Granularity::Block, TraceAction::Alloc | TraceAction::SegmentAlloc) => EventClass::Allocation,
            // free_requested is not terminal: the memory is still in use until completed
            (Granularity::Block, TraceAction::FreeCompleted) => EventClass::Free,
            (Granularity::Segment, TraceAction::SegmentAlloc) => EventClass::Allocation,
            (Granularity::Segment, TraceAction::SegmentFree) => EventClass::Free,
            _ => EventClass::Inert,
        }
    }
}

/// Result of classifying one device trace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub elements: Vec<Element>,
    /// Elem ids freed without a visible allocation, in discovery order
    pub initially_live: Vec<usize>,
    /// One elem id per allocation or free, in trace order
    pub actions: Vec<usize>,
}

/// Classify a device trace into elements, initially-live ids and actions.
///
/// A free whose address has no tracked allocation becomes its own element
/// and is filed as initially live: its lifetime predates the trace window.
/// This cannot be told apart from a gap in the log.
pub fn classify_trace(trace: &[TraceEntry], granularity: Granularity) -> Classified {
    let mut classified = Classified::default();
    let mut live_by_address: HashMap<u64, usize> = HashMap::new();

    for (trace_index, entry) in trace.iter().enumerate() {
        let class = granularity.classify(entry.action);
        if class == EventClass::Inert {
            continue;
        }
        let Some(addr) = entry.addr() else {
            continue;
        };

        match class {
            EventClass::Allocation => {
                let elem = classified.push_element(trace_index, entry);
                // A reused address overwrites the previous mapping
                live_by_address.insert(addr, elem);
                classified.actions.push(elem);
            }
            EventClass::Free => match live_by_address.remove(&addr) {
                Some(elem) => classified.actions.push(elem),
                None => {
                    let elem = classified.push_element(trace_index, entry);
                    classified.initially_live.push(elem);
                    classified.actions.push(elem);
                }
            },
            EventClass::Inert => {}
        }
    }

    debug!(
        "Classified {} entries: {} elements, {} initially live, {} actions",
        trace.len(),
        classified.elements.len(),
        classified.initially_live.len(),
        classified.actions.len()
    );

    classified
}

impl Classified {
    fn push_element(&mut self, trace_index: usize, entry: &TraceEntry) -> usize {
        self.elements.push(Element {
            trace_index,
            entry: entry.clone(),
        });
        self.elements.len() - 1
    }
}
