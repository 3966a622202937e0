//! Upload contract errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::transform::ImageError;

/// Everything that can end an upload request early
#[derive(Error, Debug)]
pub enum UploadError {
    /// Content type outside the accepted set; nothing is written
    #[error("Unsupported image type")]
    UnsupportedMediaType { content_type: String },

    #[error("Missing file in multipart field '{0}'")]
    MissingFile(&'static str),

    #[error("Malformed multipart body: {0}")]
    MalformedMultipart(String),

    #[error("Invalid filename '{0}'")]
    InvalidFilename(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidParameter { field: &'static str, message: String },

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("Failed to write '{}': {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UploadError {
    pub fn invalid_param(field: &'static str, message: impl Into<String>) -> Self {
        UploadError::InvalidParameter {
            field,
            message: message.into(),
        }
    }

    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        UploadError::Storage {
            path: path.into(),
            source,
        }
    }

    /// HTTP status for the response
    pub fn to_http_status(&self) -> u16 {
        match self {
            UploadError::UnsupportedMediaType { .. } => 415,
            UploadError::MissingFile(_)
            | UploadError::MalformedMultipart(_)
            | UploadError::InvalidFilename(_)
            | UploadError::InvalidParameter { .. } => 400,
            UploadError::PayloadTooLarge { .. } => 413,
            UploadError::Image(err) => err.to_http_status(),
            UploadError::Storage { .. } | UploadError::Internal(_) => 500,
        }
    }

    /// Label used for log fields and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::UnsupportedMediaType { .. } => "unsupported_media",
            UploadError::MissingFile(_) => "missing_file",
            UploadError::MalformedMultipart(_) => "malformed_multipart",
            UploadError::InvalidFilename(_) => "invalid_filename",
            UploadError::InvalidParameter { .. } => "invalid_parameter",
            UploadError::PayloadTooLarge { .. } => "payload_too_large",
            UploadError::Image(ImageError::UnsupportedFormat { .. }) => "unsupported_media",
            UploadError::Image(ImageError::DecodeFailed { .. })
            | UploadError::Image(ImageError::ImageBombDetected { .. }) => "decode_failure",
            UploadError::Image(ImageError::InvalidDimensions { .. }) => "invalid_dimensions",
            UploadError::Image(_) => "transform_failure",
            UploadError::Storage { .. } => "storage_failure",
            UploadError::Internal(_) => "internal",
        }
    }
}

impl From<multer::Error> for UploadError {
    fn from(err: multer::Error) -> Self {
        UploadError::MalformedMultipart(err.to_string())
    }
}
