//! Image transform error types
//!
//! Structured errors with an HTTP status mapping, so the upload layer can
//! turn any codec failure into a response without inspecting messages.

use std::fmt;

/// Errors that can occur while decoding, transforming or encoding an image
#[derive(Debug, Clone)]
pub enum ImageError {
    // === Decoding Errors ===
    /// Content type is not one of the accepted image types
    UnsupportedFormat { format: String },
    /// Bytes are not a valid image of the declared type
    DecodeFailed { message: String },
    /// Decoded dimensions exceed the pixel budget
    ImageBombDetected {
        width: u32,
        height: u32,
        pixels: u64,
        max_pixels: u64,
    },

    // === Processing Errors ===
    /// Resize operation failed
    ResizeFailed { message: String },
    /// Encoding to output format failed
    EncodeFailed { format: String, message: String },

    // === Parameter Errors ===
    /// Requested dimensions are invalid
    InvalidDimensions {
        width: i64,
        height: i64,
        reason: String,
    },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::UnsupportedFormat { format } => {
                write!(f, "Unsupported image format: {}", format)
            }
            ImageError::DecodeFailed { message } => {
                write!(f, "Failed to decode image: {}", message)
            }
            ImageError::ImageBombDetected {
                width,
                height,
                pixels,
                max_pixels,
            } => {
                write!(
                    f,
                    "Image dimensions {}x{} ({} pixels) exceed limit of {} pixels",
                    width, height, pixels, max_pixels
                )
            }
            ImageError::ResizeFailed { message } => {
                write!(f, "Resize failed: {}", message)
            }
            ImageError::EncodeFailed { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
            ImageError::InvalidDimensions {
                width,
                height,
                reason,
            } => {
                write!(f, "Invalid dimensions {}x{}: {}", width, height, reason)
            }
        }
    }
}

impl std::error::Error for ImageError {}

impl ImageError {
    /// Maps image errors to HTTP status codes
    ///
    /// - UnsupportedFormat → 415
    /// - DecodeFailed, ImageBombDetected, InvalidDimensions → 400
    /// - ResizeFailed, EncodeFailed → 500
    pub fn to_http_status(&self) -> u16 {
        match self {
            ImageError::UnsupportedFormat { .. } => 415,

            ImageError::DecodeFailed { .. }
            | ImageError::ImageBombDetected { .. }
            | ImageError::InvalidDimensions { .. } => 400,

            ImageError::ResizeFailed { .. } | ImageError::EncodeFailed { .. } => 500,
        }
    }

    pub fn unsupported_format(format: impl Into<String>) -> Self {
        ImageError::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        ImageError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn resize_failed(message: impl Into<String>) -> Self {
        ImageError::ResizeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        ImageError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn invalid_dimensions(width: i64, height: i64, reason: impl Into<String>) -> Self {
        ImageError::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    pub fn image_bomb(width: u32, height: u32, max_pixels: u64) -> Self {
        ImageError::ImageBombDetected {
            width,
            height,
            pixels: width as u64 * height as u64,
            max_pixels,
        }
    }
}
