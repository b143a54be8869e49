//! Peak statistics and text report for a reconstructed timeline.

use super::model::{AllocationRecord, Timeline};
use crate::utils::format_bytes;

/// A record ranked by size or peak
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedAllocation {
    pub elem: usize,
    pub size: u64,
    pub peak_mem: u64,
    /// Timesteps at which the record sits at its highest offset
    pub peak_timesteps: Vec<u64>,
    pub start: u64,
    pub stop: u64,
}

impl From<&AllocationRecord> for RankedAllocation {
    fn from(record: &AllocationRecord) -> Self {
        Self {
            elem: record.elem,
            size: record.size,
            peak_mem: record.peak_mem(),
            peak_timesteps: record.peak_timesteps(),
            start: record.first_timestep(),
            stop: record.last_timestep(),
        }
    }
}

/// Largest `k` records, biggest first; ties keep replay order
pub fn top_by_size(timeline: &Timeline, k: usize) -> Vec<RankedAllocation> {
    let mut ranked: Vec<RankedAllocation> = timeline.allocations.iter().map(Into::into).collect();
    ranked.sort_by(|a, b| b.size.cmp(&a.size));
    ranked.truncate(k);
    ranked
}

/// `k` records reaching highest in the stack, highest first
pub fn top_by_peak(timeline: &Timeline, k: usize) -> Vec<RankedAllocation> {
    let mut ranked: Vec<RankedAllocation> = timeline.allocations.iter().map(Into::into).collect();
    ranked.sort_by(|a, b| b.peak_mem.cmp(&a.peak_mem));
    ranked.truncate(k);
    ranked
}

/// Clock values at which `max_at_time` reaches `max_size`
pub fn peak_timesteps(timeline: &Timeline) -> Vec<u64> {
    timeline
        .max_at_time
        .iter()
        .enumerate()
        .filter(|(_, total)| **total == timeline.max_size)
        .map(|(tick, _)| tick as u64)
        .collect()
}

/// Records alive at a given clock value
pub fn live_at(timeline: &Timeline, timestep: u64) -> Vec<&AllocationRecord> {
    timeline
        .allocations
        .iter()
        .filter(|record| record.is_alive_at(timestep))
        .collect()
}

/// Render a plain-text report of the timeline
pub fn generate_text_summary(timeline: &Timeline, top_n: usize) -> String {
    let mut lines = Vec::new();
    let peaks = peak_timesteps(timeline);

    lines.push(format!("Peak memory:        {}", format_bytes(timeline.max_size)));
    if let Some(first) = peaks.first() {
        lines.push(format!("First peak at:      t={} ({} tick(s) at peak)", first, peaks.len()));
    }
    lines.push(format!("Elements:           {}", timeline.elements.len()));
    lines.push(format!("Allocation records: {}", timeline.allocations.len()));
    lines.push(format!("Timesteps:          {}", timeline.final_timestep));

    lines.push(String::new());
    lines.push(format!("Top {} allocations by size:", top_n));
    for (i, ranked) in top_by_size(timeline, top_n).iter().enumerate() {
        lines.push(format!(
            "  {:>3}. elem {:<8} {:>12}  t={}..{}",
            i + 1,
            ranked.elem,
            format_bytes(ranked.size),
            ranked.start,
            ranked.stop
        ));
    }

    lines.push(String::new());
    lines.push(format!("Top {} allocations by peak:", top_n));
    for (i, ranked) in top_by_peak(timeline, top_n).iter().enumerate() {
        lines.push(format!(
            "  {:>3}. elem {:<8} {:>12}  peak at t={}",
            i + 1,
            ranked.elem,
            format_bytes(ranked.peak_mem),
            join_timesteps(&ranked.peak_timesteps)
        ));
    }

    if timeline.allocations.len() > top_n {
        lines.push(String::new());
        lines.push(format!(
            "  (Showing top {} of {} allocation records)",
            top_n,
            timeline.allocations.len()
        ));
    }

    lines.join("\n")
}

/// `1,2,5` style list for the report
fn join_timesteps(timesteps: &[u64]) -> String {
    timesteps
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{TraceAction, TraceEntry};
    use crate::timeline::{reconstruct, ReplayOptions};

    fn timeline() -> Timeline {
        let trace = vec![
            TraceEntry::new(TraceAction::Alloc, 0, 100, 0x10, vec![]),
            TraceEntry::new(TraceAction::Alloc, 0, 50, 0x20, vec![]),
            TraceEntry::new(TraceAction::FreeCompleted, 0, 100, 0x10, vec![]),
            TraceEntry::new(TraceAction::Alloc, 0, 30, 0x30, vec![]),
        ];
        reconstruct(&trace, ReplayOptions::default())
    }

    #[test]
    fn test_top_by_size() {
        let top = top_by_size(&timeline(), 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].elem, 0);
        assert_eq!(top[1].elem, 1);
    }

    #[test]
    fn test_top_by_peak() {
        // elem 1 sits at offset 100 before compaction: peak 150
        let top = top_by_peak(&timeline(), 1);
        assert_eq!(top[0].elem, 1);
        assert_eq!(top[0].peak_mem, 150);
    }

    #[test]
    fn test_peak_timesteps() {
        assert_eq!(peak_timesteps(&timeline()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_live_at() {
        let timeline = timeline();
        let elems: Vec<usize> = live_at(&timeline, 6).iter().map(|r| r.elem).collect();
        assert_eq!(elems, vec![1, 2]);
    }

    #[test]
    fn test_text_summary_mentions_peak() {
        let text = generate_text_summary(&timeline(), 3);
        assert!(text.contains("150.0 B"));
        assert!(text.contains("Top 3 allocations by size"));
    }

    #[test]
    fn test_text_summary_ranks_by_peak() {
        let text = generate_text_summary(&timeline(), 2);
        let section = text
            .split("Top 2 allocations by peak:")
            .nth(1)
            .expect("peak section present");
        let rows: Vec<&str> = section.lines().filter(|l| l.contains("elem")).collect();

        // elem 1 reaches 100 + 50 while sitting at offset 100 over t=1..2
        assert!(rows[0].contains("elem 1"), "{}", rows[0]);
        assert!(rows[0].contains("150.0 B"), "{}", rows[0]);
        assert!(rows[0].contains("peak at t=1,2"), "{}", rows[0]);
        assert!(rows[1].contains("elem 0"), "{}", rows[1]);
        assert!(text.contains("(Showing top 2 of 3 allocation records)"));
    }

    #[test]
    fn test_ranked_carries_peak_timesteps() {
        let top = top_by_peak(&timeline(), 3);
        assert_eq!(top[0].peak_timesteps, vec![1, 2]);
        // elem 2 never moves
        assert_eq!(top[2].elem, 2);
        assert_eq!(top[2].peak_timesteps, vec![6, 7]);
    }
}
