use std::io::{Cursor, Write};

use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::{entities::export::ArchiveJob, errors::ExportError};

/// Serializes an archive job into a deflate-compressed zip held in memory.
pub fn write_zip(job: ArchiveJob) -> Result<Vec<u8>, ExportError> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for entry in job.into_entries() {
        writer
            .start_file(entry.file_name.as_str(), options)
            .map_err(|e| ExportError::ArchiveCreationFailed(format!("{}: {}", entry.file_name, e)))?;
        writer
            .write_all(&entry.bytes)
            .map_err(|e| ExportError::ArchiveCreationFailed(format!("{}: {}", entry.file_name, e)))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| ExportError::ArchiveCreationFailed(e.to_string()))?;

    Ok(cursor.into_inner())
}
