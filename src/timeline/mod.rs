//! Reconstruction of "what memory looked like at each step".
//!
//! This module transforms a decoded device trace into:
//! - Classified elements and actions (allocation/free pairing)
//! - Per-allocation offset/timestep curves with compaction animation
//! - A summarized bucket and peak-memory statistics
//! - The allocation and element views written for the renderer

pub mod classifier;
pub mod model;
pub mod project;
pub mod replay;
pub mod stats;

// Re-export main types and functions
pub use classifier::{classify_trace, Classified, EventClass, Granularity};
pub use model::{AllocationRecord, Element, SummarizedBucket, Timeline};
pub use project::{allocations_view, elements_view, summary_view, ProjectionContext, TimelineSummary};
pub use replay::{reconstruct, replay, ReplayOptions};
pub use stats::generate_text_summary;

use crate::snapshot::{Snapshot, TraceEntry};
use crate::utils::error::TimelineError;

/// Select one device's trace, failing when the device was never recorded
pub fn select_device(snapshot: &Snapshot, device: usize) -> Result<&[TraceEntry], TimelineError> {
    snapshot
        .device_trace(device)
        .ok_or(TimelineError::DeviceIndex {
            device,
            count: snapshot.device_traces.len(),
        })
}
