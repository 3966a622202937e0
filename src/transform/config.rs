use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_JPEG_QUALITY, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_SOURCE_PIXELS, DEFAULT_MAX_WIDTH,
    DEFAULT_PNG_COMPRESSION_LEVEL,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Quality for re-encoded JPEG output (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Compression level for re-encoded PNG output (0-9, 0 = fastest)
    #[serde(default = "default_png_compression_level")]
    pub png_compression_level: u8,

    /// Maximum allowed requested width (to prevent abuse)
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Maximum allowed requested height
    #[serde(default = "default_max_height")]
    pub max_height: u32,

    /// Maximum decoded source size in pixels (image bomb guard)
    #[serde(default = "default_max_source_pixels")]
    pub max_source_pixels: u64,

    /// When set, every contrast request applies this value instead of the
    /// client's `percentage`. The output path still carries the client value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_contrast: Option<f64>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            png_compression_level: DEFAULT_PNG_COMPRESSION_LEVEL,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            max_source_pixels: DEFAULT_MAX_SOURCE_PIXELS,
            fixed_contrast: None,
        }
    }
}

impl ImageConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!(
                "image.jpeg_quality must be 1-100, got {}",
                self.jpeg_quality
            ));
        }
        if self.png_compression_level > 9 {
            return Err(format!(
                "image.png_compression_level must be 0-9, got {}",
                self.png_compression_level
            ));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err("image.max_width and image.max_height must be > 0".to_string());
        }
        if self.max_source_pixels == 0 {
            return Err("image.max_source_pixels must be > 0".to_string());
        }
        if let Some(value) = self.fixed_contrast {
            if !value.is_finite() || !(-100.0..=100.0).contains(&value) {
                return Err(format!(
                    "image.fixed_contrast must be within -100..=100, got {}",
                    value
                ));
            }
        }
        Ok(())
    }
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_png_compression_level() -> u8 {
    DEFAULT_PNG_COMPRESSION_LEVEL
}

fn default_max_width() -> u32 {
    DEFAULT_MAX_WIDTH
}

fn default_max_height() -> u32 {
    DEFAULT_MAX_HEIGHT
}

fn default_max_source_pixels() -> u64 {
    DEFAULT_MAX_SOURCE_PIXELS
}
