//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod encode;
pub mod models;
pub mod timeline;
pub mod utils;

// Re-export main command functions
pub use encode::execute_encode;
pub use models::{EncodeArgs, TimelineArgs};
pub use timeline::{execute_timeline, validate_args};
pub use utils::{display_version, find_mismatches, verify_allocations_file, LengthMismatch};
