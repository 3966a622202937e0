//! Storage configuration: where transformed images are written.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_IMAGE_DIR;
use crate::error::ServiceError;

fn default_image_dir() -> PathBuf {
    PathBuf::from(DEFAULT_IMAGE_DIR)
}

fn default_serialize_same_path() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for output files
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,

    /// Run requests targeting the same destination path one at a time
    #[serde(default = "default_serialize_same_path")]
    pub serialize_same_path: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            serialize_same_path: default_serialize_same_path(),
        }
    }
}

impl StorageConfig {
    /// Create the image directory if needed and check it can be written to.
    ///
    /// Called once at startup so that a misconfigured directory fails the
    /// process instead of every upload.
    pub fn ensure_image_dir(&self) -> Result<&Path, ServiceError> {
        let dir = self.image_dir.as_path();

        fs::create_dir_all(dir).map_err(|e| {
            ServiceError::Storage(format!(
                "Failed to create image directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let metadata = fs::metadata(dir).map_err(|e| {
            ServiceError::Storage(format!("Cannot stat '{}': {}", dir.display(), e))
        })?;
        if !metadata.is_dir() {
            return Err(ServiceError::Storage(format!(
                "'{}' is not a directory",
                dir.display()
            )));
        }
        if metadata.permissions().readonly() {
            return Err(ServiceError::Storage(format!(
                "'{}' is read-only",
                dir.display()
            )));
        }

        Ok(dir)
    }
}
