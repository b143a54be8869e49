//! snapviz
//!
//! Device memory snapshot encoding and allocation timeline
//! reconstruction.
//!
//! This crate provides the core implementation for the
//! `snapviz` CLI tool:
//!
//! - [`codec`] reads and writes the compact `SNAP` binary format
//! - [`timeline`] replays a device trace into per-allocation curves
//! - [`output`] writes the JSON views, optionally as a zip archive
//!
//! ## Getting Started
//!
//! ```bash
//! snapviz timeline -p run.snap -o alloc_data
//! snapviz verify -f alloc_data/allocations.json
//! ```

pub mod codec;
pub mod commands;
pub mod output;
pub mod snapshot;
pub mod timeline;
pub mod utils;
