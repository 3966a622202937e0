//! Destination path computation.

use std::path::{Path, PathBuf};

use super::error::UploadError;
use super::operation::Operation;

/// Reduce a client filename to its final component.
///
/// Both separators are honoured since browsers on Windows may send the
/// full local path.
pub fn sanitize_filename(raw: &str) -> Result<String, UploadError> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        return Err(UploadError::InvalidFilename(raw.to_string()));
    }
    Ok(name.to_string())
}

/// `<image_dir>/<prefix>-<primary><filename>`
pub fn destination_path(image_dir: &Path, operation: &Operation, file_name: &str) -> PathBuf {
    image_dir.join(format!(
        "{}-{}{}",
        operation.prefix(),
        operation.primary_param(),
        file_name
    ))
}
