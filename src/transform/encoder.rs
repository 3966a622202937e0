//! Image encoder abstraction
//!
//! One encoder per accepted kind. Output always has the same format as the
//! upload; only the encoder knobs (JPEG quality, PNG compression level) vary.

use image::codecs::png::{CompressionType, FilterType};
use image::{ColorType, DynamicImage};
use std::io::Cursor;

use super::config::ImageConfig;
use super::error::ImageError;
use super::kind::ImageKind;

/// Encoder settings applied when overwriting the upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    /// JPEG quality (1-100, where 100 is best quality)
    pub jpeg_quality: u8,
    /// PNG compression level (0-9, where 0 is fastest/largest)
    pub png_compression_level: u8,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            jpeg_quality: crate::constants::DEFAULT_JPEG_QUALITY,
            png_compression_level: crate::constants::DEFAULT_PNG_COMPRESSION_LEVEL,
        }
    }
}

impl EncodeSettings {
    pub fn from_config(config: &ImageConfig) -> Self {
        Self {
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
            png_compression_level: config.png_compression_level.min(9),
        }
    }

    /// Map the 0-9 level onto the PNG encoder presets
    pub fn png_compression(&self) -> (CompressionType, FilterType) {
        match self.png_compression_level {
            0..=3 => (CompressionType::Fast, FilterType::NoFilter),
            4..=6 => (CompressionType::Default, FilterType::Adaptive),
            _ => (CompressionType::Best, FilterType::Adaptive),
        }
    }
}

/// Trait for image encoders
pub trait ImageEncoder: Send + Sync {
    /// The kind this encoder produces
    fn kind(&self) -> ImageKind;

    /// Encode a decoded raster
    fn encode(&self, img: &DynamicImage, settings: EncodeSettings) -> Result<Vec<u8>, ImageError>;
}

/// JPEG encoder using the image crate
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn kind(&self) -> ImageKind {
        ImageKind::Jpeg
    }

    fn encode(&self, img: &DynamicImage, settings: EncodeSettings) -> Result<Vec<u8>, ImageError> {
        use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
        use image::ImageEncoder as _;

        // JPEG has no alpha channel
        let rgb = img.to_rgb8();

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageJpegEncoder::new_with_quality(&mut output, settings.jpeg_quality);

        encoder
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            .map_err(|e| ImageError::encode_failed("jpeg", e.to_string()))?;

        Ok(output.into_inner())
    }
}

/// PNG encoder using the image crate
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn kind(&self) -> ImageKind {
        ImageKind::Png
    }

    fn encode(&self, img: &DynamicImage, settings: EncodeSettings) -> Result<Vec<u8>, ImageError> {
        use image::codecs::png::PngEncoder as ImagePngEncoder;
        use image::ImageEncoder as _;

        let (compression, filter) = settings.png_compression();
        let mut output = Cursor::new(Vec::new());
        let encoder = ImagePngEncoder::new_with_quality(&mut output, compression, filter);

        // Keep the alpha channel only when the source had one
        let result = if img.color().has_alpha() {
            let rgba = img.to_rgba8();
            encoder.write_image(rgba.as_raw(), rgba.width(), rgba.height(), ColorType::Rgba8)
        } else {
            let rgb = img.to_rgb8();
            encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        };
        result.map_err(|e| ImageError::encode_failed("png", e.to_string()))?;

        Ok(output.into_inner())
    }
}

/// Factory for creating encoders based on the upload kind
pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(kind: ImageKind) -> Box<dyn ImageEncoder> {
        match kind {
            ImageKind::Jpeg => Box::new(JpegEncoder),
            ImageKind::Png => Box::new(PngEncoder),
        }
    }
}
