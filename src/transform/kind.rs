//! Accepted image kinds.

use image::ImageFormat;
use std::str::FromStr;

use super::error::ImageError;

/// Image formats the service accepts and writes back unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    /// Parse a client supplied content type.
    ///
    /// Matching is exact and case-sensitive: `image/JPEG` or
    /// `image/jpeg; q=1` are rejected like any other type.
    pub fn from_content_type(content_type: &str) -> Result<Self, ImageError> {
        match content_type {
            "image/jpeg" => Ok(ImageKind::Jpeg),
            "image/png" => Ok(ImageKind::Png),
            other => Err(ImageError::unsupported_format(other)),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    pub(crate) fn image_format(&self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }
}

impl FromStr for ImageKind {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_content_type(s)
    }
}
