//! JSON output writer.
//!
//! Writes timeline views to JSON files and reads allocation views back.

use crate::timeline::AllocationRecord;
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write any serializable view to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `value` - View to write
/// * `output_path` - Path to output JSON file
/// * `pretty` - Indent the output (summaries); renderer views stay compact
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_json<T: Serialize + ?Sized>(
    value: &T,
    output_path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    debug!("Writing JSON to: {}", output_path.display());

    validate_output_path(output_path)?;

    // Create parent directories if needed
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!("Cannot create directory {}: {}", parent.display(), e))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    if pretty {
        serde_json::to_writer_pretty(writer, value)?;
    } else {
        serde_json::to_writer(writer, value)?;
    }

    info!(
        "✓ {} written ({} bytes)",
        output_path.display(),
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Serialize a view into memory (for archive members)
pub fn to_json_bytes<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<Vec<u8>, OutputError> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    Ok(bytes)
}

/// Validate that output path is writable
///
/// **Public** - also used before packaging archives
pub fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    // Check if we're trying to overwrite a directory
    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Parse an allocations view
pub fn parse_allocations(content: &str) -> Result<Vec<AllocationRecord>, OutputError> {
    Ok(serde_json::from_str(content)?)
}

/// Read an allocations view from a JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_allocations(input_path: impl AsRef<Path>) -> Result<Vec<AllocationRecord>, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading allocations from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let records: Vec<AllocationRecord> = serde_json::from_reader(std::io::BufReader::new(file))?;

    debug!("Loaded {} allocation records", records.len());

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(elem: usize) -> AllocationRecord {
        AllocationRecord {
            elem,
            timesteps: vec![0, 4],
            offsets: vec![16, 16],
            size: 32,
            color: elem,
        }
    }

    #[test]
    fn test_write_and_read_allocations() {
        let records = vec![record(0), record(1)];
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("allocations.json");

        write_json(&records, &path, false).unwrap();
        let loaded = read_allocations(&path).unwrap();

        assert_eq!(loaded, records);
    }

    #[test]
    fn test_validate_output_path_empty() {
        let result = validate_output_path(Path::new(""));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = validate_output_path(temp_dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/allocations.json");

        write_json(&vec![record(0)], &nested_path, true).unwrap();

        assert!(nested_path.exists());
    }

    #[test]
    fn test_parse_allocations_rejects_garbage() {
        let err = parse_allocations("{not json").unwrap_err();
        assert!(matches!(err, OutputError::SerializationFailed(_)));
    }
}
