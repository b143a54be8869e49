//! Zip packaging of timeline outputs.

use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Write named in-memory members into a new zip archive
pub fn write_archive(output_path: impl AsRef<Path>, members: &[(&str, Vec<u8>)]) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    super::json::validate_output_path(output_path)?;
    info!("Packaging {} file(s) into: {}", members.len(), output_path.display());

    let file = File::create(output_path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in members {
        debug!("Adding {} ({} bytes)", name, bytes.len());
        zip.start_file(*name, options)?;
        zip.write_all(bytes)?;
    }

    zip.finish()?;
    Ok(())
}

/// Read the first `.json` member whose file name contains `needle`
pub fn read_archive_member(archive_path: impl AsRef<Path>, needle: &str) -> Result<String, OutputError> {
    let archive_path = archive_path.as_ref();
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let Some(path) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            continue;
        };
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if file_name.contains(needle) {
            debug!("Reading archive member {}", path.display());
            let mut content = String::new();
            entry.read_to_string(&mut content)?;
            return Ok(content);
        }
    }

    Err(OutputError::MissingMember(archive_path.display().to_string()))
}
