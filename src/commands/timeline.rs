//! Timeline command implementation.
//!
//! The timeline command:
//! 1. Reads and decodes the binary snapshot
//! 2. Selects the requested device trace
//! 3. Classifies and replays the trace
//! 4. Writes the allocation, element and summary views

use super::models::TimelineArgs;
use crate::codec::read_snapshot;
use crate::output::{to_json_bytes, write_archive, write_json};
use crate::timeline::{
    allocations_view, elements_view, generate_text_summary, reconstruct, select_device, summary_view,
    ProjectionContext, ReplayOptions, Timeline,
};
use crate::utils::config::{ALLOCATIONS_FILE, DEFAULT_ARCHIVE_NAME, ELEMENTS_FILE, SUMMARY_FILE};
use crate::utils::format_bytes;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Execute the timeline command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// Paths of every file written
///
/// # Errors
/// * Unreadable or malformed snapshot
/// * Device index beyond the recorded devices (nothing is written)
/// * File write errors
pub fn execute_timeline(args: TimelineArgs) -> Result<Vec<PathBuf>> {
    let start_time = Instant::now();

    info!("Starting timeline reconstruction for: {}", args.input.display());

    // Step 1: Decode snapshot
    info!("Step 1/4: Reading snapshot...");
    let snapshot = read_snapshot(&args.input)
        .with_context(|| format!("Failed to read snapshot {}", args.input.display()))?;

    // Step 2: Select device before touching the output directory
    info!("Step 2/4: Selecting device {}...", args.device);
    let trace = select_device(&snapshot, args.device)?;
    debug!("Device {} trace holds {} entries", args.device, trace.len());

    // Step 3: Replay
    info!("Step 3/4: Replaying trace ({:?} granularity, {} visible)...", args.granularity, args.max_entries);
    let options = ReplayOptions {
        max_visible: args.max_entries,
        granularity: args.granularity,
    };
    let timeline = reconstruct(trace, options);

    // Step 4: Write views
    info!("Step 4/4: Writing output files...");
    let written = write_views(&args, &timeline)?;

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("TIMELINE SUMMARY");
        println!("{}", "=".repeat(80));
        println!("Snapshot: {}", args.input.display());
        println!("Device:   {}", args.device);
        println!("\n{}", generate_text_summary(&timeline, 10));
        println!("{}", "=".repeat(80));
    }

    let elapsed = start_time.elapsed();
    info!(
        "Timeline completed in {:.2}s (peak {})",
        elapsed.as_secs_f64(),
        format_bytes(timeline.max_size)
    );

    Ok(written)
}

/// Write the three views, loose or packaged
///
/// **Private** - internal helper for execute_timeline
fn write_views(args: &TimelineArgs, timeline: &Timeline) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory {}", args.output_dir.display()))?;

    let context = ProjectionContext {
        source: args.input.display().to_string(),
        device: args.device,
        granularity: args.granularity,
        max_visible: args.max_entries,
    };
    let allocations = allocations_view(timeline);
    let elements = elements_view(timeline);
    let summary = summary_view(timeline, &context);

    if args.archive {
        let archive_path = args.output_dir.join(archive_name(args));
        let members = [
            (ALLOCATIONS_FILE, to_json_bytes(allocations, false)?),
            (ELEMENTS_FILE, to_json_bytes(&elements, false)?),
            (SUMMARY_FILE, to_json_bytes(&summary, true)?),
        ];
        write_archive(&archive_path, &members)
            .with_context(|| format!("Failed to write archive {}", archive_path.display()))?;
        info!("✓ Archive written to: {}", archive_path.display());
        return Ok(vec![archive_path]);
    }

    let allocations_path = args.output_dir.join(ALLOCATIONS_FILE);
    write_json(allocations, &allocations_path, false).context("Failed to write allocations JSON")?;

    let elements_path = args.output_dir.join(ELEMENTS_FILE);
    write_json(&elements, &elements_path, false).context("Failed to write elements JSON")?;

    let summary_path = args.output_dir.join(SUMMARY_FILE);
    write_json(&summary, &summary_path, true).context("Failed to write summary JSON")?;

    Ok(vec![allocations_path, elements_path, summary_path])
}

/// `<input stem>.zip`, or the default name when the input has no stem
fn archive_name(args: &TimelineArgs) -> String {
    args.input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(|stem| format!("{}.zip", stem))
        .unwrap_or_else(|| DEFAULT_ARCHIVE_NAME.to_string())
}

/// Validate timeline arguments
///
/// **Public** - can be called before execute_timeline for early validation
pub fn validate_args(args: &TimelineArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Snapshot path cannot be empty");
    }

    if args.output_dir.as_os_str().is_empty() {
        anyhow::bail!("Output directory cannot be empty");
    }

    if args.output_dir.is_file() {
        anyhow::bail!("Output directory {} is a file", args.output_dir.display());
    }

    Ok(())
}
