//! snapviz CLI
//!
//! Encodes device memory snapshots and turns them into
//! allocation timelines for visualization.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use snapviz::commands::{
    display_version, execute_encode, execute_timeline, validate_args, verify_allocations_file, EncodeArgs,
    TimelineArgs,
};
use snapviz::timeline::Granularity;
use snapviz::utils::config::{DEFAULT_MAX_ENTRIES, DEFAULT_OUTPUT_DIR, MAX_ENTRIES_ENV};

/// snapviz - device memory snapshot timelines
#[derive(Parser, Debug)]
#[command(name = "snapviz")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconstruct the allocation timeline of one device
    Timeline {
        /// Path to the binary snapshot
        #[arg(short = 'p', long = "path")]
        path: PathBuf,

        /// Output directory for the JSON views
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Device index to replay
        #[arg(short, long, default_value_t = 0)]
        device: usize,

        /// Elements below this index are drawn individually
        #[arg(long, env = MAX_ENTRIES_ENV, default_value_t = DEFAULT_MAX_ENTRIES)]
        max_entries: usize,

        /// Track whole segments instead of blocks
        #[arg(long)]
        segments: bool,

        /// Write a single zip archive instead of loose files
        #[arg(long)]
        zip: bool,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Encode a JSON snapshot into the binary format
    Encode {
        /// Path to the JSON snapshot
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the binary snapshot
        #[arg(short, long, default_value = "snapshot.snap")]
        output: PathBuf,
    },

    /// Check that every allocation record has matching timesteps and offsets
    Verify {
        /// allocations.json or a zip archive containing it
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Timeline {
            path,
            output_dir,
            device,
            max_entries,
            segments,
            zip,
            summary,
        } => {
            let granularity = if segments {
                Granularity::Segment
            } else {
                Granularity::Block
            };

            let args = TimelineArgs {
                input: path,
                output_dir,
                device,
                max_entries,
                granularity,
                archive: zip,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_timeline(args)?;
        }

        Commands::Encode { input, output } => {
            execute_encode(EncodeArgs { input, output })?;
        }

        Commands::Verify { file } => {
            verify_allocations_file(&file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
