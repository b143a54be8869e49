use anyhow::Result;
use std::path::Path;

use crate::codec::FORMAT_VERSION;
use crate::output::{parse_allocations, read_allocations, read_archive_member};
use crate::timeline::AllocationRecord;
use crate::utils::config::SUMMARY_SCHEMA_VERSION;
use crate::utils::error::OutputError;

/// An allocation record whose timestep and offset arrays disagree in length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthMismatch {
    pub index: usize,
    pub elem: usize,
    pub timesteps: usize,
    pub offsets: usize,
}

/// Find every record with unequal timestep and offset arrays
pub fn find_mismatches(records: &[AllocationRecord]) -> Vec<LengthMismatch> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.timesteps.len() != record.offsets.len())
        .map(|(index, record)| LengthMismatch {
            index,
            elem: record.elem,
            timesteps: record.timesteps.len(),
            offsets: record.offsets.len(),
        })
        .collect()
}

/// Verify an allocation view, either loose JSON or inside a zip archive
///
/// **Public** - backs the `verify` subcommand
///
/// # Returns
/// Number of records checked
///
/// # Errors
/// * Unreadable file or archive without an allocations member
/// * `OutputError::MismatchedLengths` when any record is inconsistent
pub fn verify_allocations_file(file_path: &Path) -> Result<usize> {
    println!("Verifying allocations: {}", file_path.display());

    let is_archive = file_path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);

    let records = if is_archive {
        let content = read_archive_member(file_path, "allocations")?;
        parse_allocations(&content)?
    } else {
        read_allocations(file_path)?
    };

    let mismatches = find_mismatches(&records);
    if !mismatches.is_empty() {
        for m in &mismatches {
            println!(
                "✗ record {} (elem {}): {} timesteps vs {} offsets",
                m.index, m.elem, m.timesteps, m.offsets
            );
        }
        return Err(OutputError::MismatchedLengths {
            count: mismatches.len(),
        }
        .into());
    }

    println!("✓ All timesteps and offsets match");
    println!("  Records: {}", records.len());
    Ok(records.len())
}

/// Display version information
pub fn display_version() {
    println!("snapviz v{}", env!("CARGO_PKG_VERSION"));
    println!("Snapshot Format: v{}", FORMAT_VERSION);
    println!("Summary Schema: v{}", SUMMARY_SCHEMA_VERSION);
    println!();
    println!("Device memory snapshot encoder and allocation timeline builder.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(elem: usize, timesteps: Vec<u64>, offsets: Vec<u64>) -> AllocationRecord {
        AllocationRecord {
            elem,
            timesteps,
            offsets,
            size: 8,
            color: elem,
        }
    }

    #[test]
    fn test_find_mismatches() {
        let records = vec![
            record(0, vec![0, 1], vec![0, 0]),
            record(1, vec![0, 1, 2], vec![8, 8]),
        ];

        assert_eq!(
            find_mismatches(&records),
            vec![LengthMismatch {
                index: 1,
                elem: 1,
                timesteps: 3,
                offsets: 2,
            }]
        );
    }

    #[test]
    fn test_verify_rejects_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allocations.json");
        std::fs::write(
            &path,
            r#"[{"elem":0,"timesteps":[0,1],"offsets":[0],"size":8,"color":0}]"#,
        )
        .unwrap();

        let err = verify_allocations_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OutputError>(),
            Some(OutputError::MismatchedLengths { count: 1 })
        ));
    }
}
