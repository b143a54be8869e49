use std::path::PathBuf;

use crate::timeline::Granularity;
use crate::utils::config::{DEFAULT_MAX_ENTRIES, DEFAULT_OUTPUT_DIR};

/// Arguments for the timeline command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct TimelineArgs {
    /// Binary snapshot to read
    pub input: PathBuf,

    /// Directory receiving the views (created if absent)
    pub output_dir: PathBuf,

    /// Device whose trace is replayed
    pub device: usize,

    /// Elements below this index get their own allocation record
    pub max_entries: usize,

    /// Block-level or segment-level tracking
    pub granularity: Granularity,

    /// Package the views into a single zip archive
    pub archive: bool,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for TimelineArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("snapshot.snap"),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            device: 0,
            max_entries: DEFAULT_MAX_ENTRIES,
            granularity: Granularity::Block,
            archive: false,
            print_summary: false,
        }
    }
}

/// Arguments for the encode command
#[derive(Debug, Clone)]
pub struct EncodeArgs {
    /// JSON rendition of a snapshot
    pub input: PathBuf,

    /// Binary snapshot to write
    pub output: PathBuf,
}
