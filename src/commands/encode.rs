//! Encode command implementation.
//!
//! Converts the JSON rendition of a snapshot into the binary format.

use super::models::EncodeArgs;
use crate::codec::write_snapshot;
use crate::snapshot::Snapshot;
use crate::utils::format_bytes;
use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::BufReader;

/// Execute the encode command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// Number of bytes written
pub fn execute_encode(args: EncodeArgs) -> Result<usize> {
    info!("Reading JSON snapshot: {}", args.input.display());

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse snapshot JSON {}", args.input.display()))?;

    let entries: usize = snapshot.device_traces.iter().map(Vec::len).sum();
    info!(
        "Loaded {} segment(s), {} device(s), {} trace entries",
        snapshot.segments.len(),
        snapshot.device_traces.len(),
        entries
    );

    let written = write_snapshot(&snapshot, &args.output)
        .with_context(|| format!("Failed to write snapshot {}", args.output.display()))?;

    info!("✓ Encoded snapshot: {}", format_bytes(written as u64));
    Ok(written)
}
