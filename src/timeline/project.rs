//! Projection of a timeline into the views the renderer consumes.

use serde::Serialize;

use super::classifier::Granularity;
use super::model::{AllocationRecord, SummarizedBucket, Timeline};
use crate::snapshot::TraceEntry;
use crate::utils::config::SUMMARY_SCHEMA_VERSION;

/// Per-allocation records, without the summarized pseudo-record
pub fn allocations_view(timeline: &Timeline) -> &[AllocationRecord] {
    &timeline.allocations
}

/// Raw classified events, index-aligned with each record's `elem`
pub fn elements_view(timeline: &Timeline) -> Vec<&TraceEntry> {
    timeline.elements.iter().map(|element| &element.entry).collect()
}

/// Aggregate statistics written next to the two views
#[derive(Debug, Clone, Serialize)]
pub struct TimelineSummary<'a> {
    pub version: &'static str,
    pub source: String,
    pub device: usize,
    pub granularity: Granularity,
    pub max_visible: usize,
    pub max_size: u64,
    pub final_timestep: u64,
    pub element_count: usize,
    pub allocation_count: usize,
    pub max_at_time: &'a [u64],
    pub summarized: &'a SummarizedBucket,
    pub generated_at: String,
}

/// Context of a replay that the timeline itself does not carry
#[derive(Debug, Clone)]
pub struct ProjectionContext {
    pub source: String,
    pub device: usize,
    pub granularity: Granularity,
    pub max_visible: usize,
}

/// Build the summary view of a timeline
pub fn summary_view<'a>(timeline: &'a Timeline, context: &ProjectionContext) -> TimelineSummary<'a> {
    use chrono::Utc;

    TimelineSummary {
        version: SUMMARY_SCHEMA_VERSION,
        source: context.source.clone(),
        device: context.device,
        granularity: context.granularity,
        max_visible: context.max_visible,
        max_size: timeline.max_size,
        final_timestep: timeline.final_timestep,
        element_count: timeline.elements.len(),
        allocation_count: timeline.allocations.len(),
        max_at_time: &timeline.max_at_time,
        summarized: &timeline.summarized,
        generated_at: Utc::now().to_rfc3339(),
    }
}
