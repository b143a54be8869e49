//! Output writers for timeline views.
//!
//! This module handles writing data to disk in various formats:
//! - JSON views (compact for the renderer, pretty for summaries)
//! - Zip archives bundling the views

pub mod archive;
pub mod json;

// Re-export main functions
pub use archive::{read_archive_member, write_archive};
pub use json::{parse_allocations, read_allocations, to_json_bytes, validate_output_path, write_json};
