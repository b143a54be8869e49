//! Configuration and constants for the CLI.

/// Default number of elements that get their own allocation record
pub const DEFAULT_MAX_ENTRIES: usize = 15_000;

/// Default directory for timeline outputs
pub const DEFAULT_OUTPUT_DIR: &str = "alloc_data";

/// Current summary.json schema version
pub const SUMMARY_SCHEMA_VERSION: &str = "1.0.0";

// Output file names consumed by the renderer
pub const ALLOCATIONS_FILE: &str = "allocations.json";
pub const ELEMENTS_FILE: &str = "elements.json";
pub const SUMMARY_FILE: &str = "summary.json";

/// Archive name used when the input path has no usable file stem
pub const DEFAULT_ARCHIVE_NAME: &str = "timeline.zip";

/// Environment variable that overrides `--max-entries`
pub const MAX_ENTRIES_ENV: &str = "SNAPVIZ_MAX_ENTRIES";
