//! Image processing implementation
//!
//! Handles the actual image transformation: decode → transform → encode

use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::DynamicImage;
use std::io::Cursor;
use std::num::NonZeroU32;

use super::config::ImageConfig;
use super::encoder::{EncodeSettings, EncoderFactory};
use super::error::ImageError;
use super::kind::ImageKind;
use super::orientation::Orientation;

/// fast_image_resize sizes its buffers with u32 arithmetic
const MAX_RESIZE_BYTES: u64 = u32::MAX as u64;

/// One pixel operation applied to a decoded upload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// Scale to `width`, height follows the source aspect ratio
    Resize { width: u32 },
    /// Cover `width`x`height` and crop around the center
    Fill { width: u32, height: u32 },
    /// Signed contrast change in percent, -100..=100
    Contrast { percentage: f64 },
}

impl Transform {
    pub fn apply(&self, img: &DynamicImage) -> Result<DynamicImage, ImageError> {
        match *self {
            Transform::Resize { width } => resize_to_width(img, width),
            Transform::Fill { width, height } => fill(img, width, height),
            Transform::Contrast { percentage } => Ok(adjust_contrast(img, percentage)),
        }
    }

    /// Size of the image `apply` produces from a `src_w`x`src_h` source
    pub fn output_dimensions(&self, src_w: u32, src_h: u32) -> (u32, u32) {
        match *self {
            Transform::Resize { width } => (width, proportional_side(width, src_h, src_w)),
            Transform::Fill { width, height } => (width, height),
            Transform::Contrast { .. } => (src_w, src_h),
        }
    }

    /// Reject a transform whose output would exceed the configured limits.
    ///
    /// The resize height follows the source, so it can only be checked once
    /// the source dimensions are known. Contrast keeps the source size, which
    /// `decode` has already bounded.
    pub fn check_output(
        &self,
        src_w: u32,
        src_h: u32,
        limits: &ImageConfig,
    ) -> Result<(), ImageError> {
        if let Transform::Contrast { .. } = self {
            return Ok(());
        }
        let (width, height) = self.output_dimensions(src_w, src_h);
        if width > limits.max_width || height > limits.max_height {
            return Err(ImageError::invalid_dimensions(
                width as i64,
                height as i64,
                format!(
                    "output exceeds maximum of {}x{}",
                    limits.max_width, limits.max_height
                ),
            ));
        }
        if width as u64 * height as u64 > limits.max_source_pixels {
            return Err(ImageError::invalid_dimensions(
                width as i64,
                height as i64,
                format!("output exceeds {} pixels", limits.max_source_pixels),
            ));
        }
        Ok(())
    }
}

/// Decode `data` as `kind` and bake the EXIF orientation into the raster.
///
/// The header is read first so oversized images are rejected before any
/// pixel buffer is allocated.
pub fn decode(data: &[u8], kind: ImageKind, max_pixels: u64) -> Result<DynamicImage, ImageError> {
    let (width, height) = ImageReader::with_format(Cursor::new(data), kind.image_format())
        .into_dimensions()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?;
    validate_source_dimensions(width, height, max_pixels)?;

    let img = ImageReader::with_format(Cursor::new(data), kind.image_format())
        .decode()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?;

    Ok(Orientation::read(data).apply(img))
}

/// Encode with the encoder matching the upload kind
pub fn encode(
    img: &DynamicImage,
    kind: ImageKind,
    settings: EncodeSettings,
) -> Result<Vec<u8>, ImageError> {
    EncoderFactory::create(kind).encode(img, settings)
}

/// Reject sources whose pixel count exceeds the budget
pub fn validate_source_dimensions(width: u32, height: u32, max_pixels: u64) -> Result<(), ImageError> {
    if width as u64 * height as u64 > max_pixels {
        return Err(ImageError::image_bomb(width, height, max_pixels));
    }
    Ok(())
}

/// Resize to `width` pixels wide, preserving the aspect ratio.
pub fn resize_to_width(img: &DynamicImage, width: u32) -> Result<DynamicImage, ImageError> {
    if width == 0 {
        return Err(ImageError::invalid_dimensions(
            0,
            0,
            "width must be greater than 0",
        ));
    }
    let height = proportional_side(width, img.height(), img.width());
    resize_exact(img, width, height)
}

/// `target * numerator / denominator`, rounded, never below one pixel
fn proportional_side(target: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 1;
    }
    let side = (target as f64 * numerator as f64 / denominator as f64).round();
    (side as u32).max(1)
}

/// Produce exactly `width`x`height`, cropping the minimum around the center.
///
/// The source is cropped to the target aspect first and then scaled. This
/// keeps the same region as scaling to cover and cropping afterwards, and
/// never allocates an intermediate larger than the source.
pub fn fill(img: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage, ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::invalid_dimensions(
            width as i64,
            height as i64,
            "width and height must be greater than 0",
        ));
    }

    let (src_w, src_h) = (img.width(), img.height());
    if src_w == width && src_h == height {
        return Ok(img.clone());
    }

    let src_aspect = src_w as f64 / src_h as f64;
    let dst_aspect = width as f64 / height as f64;

    let cropped = if src_aspect < dst_aspect {
        let crop_h = (src_w as f64 * height as f64 / width as f64).max(1.0).round() as u32;
        crop_center(img, src_w, crop_h)
    } else {
        let crop_w = (src_h as f64 * width as f64 / height as f64).max(1.0).round() as u32;
        crop_center(img, crop_w, src_h)
    };
    resize_exact(&cropped, width, height)
}

/// Crop a `width`x`height` box anchored at the image center
fn crop_center(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let width = width.min(img.width());
    let height = height.min(img.height());
    let x = (img.width() - width) / 2;
    let y = (img.height() - height) / 2;
    img.crop_imm(x, y, width, height)
}

/// Adjust contrast by `percentage` in -100..=100.
///
/// Negative values pull channels towards mid-grey, positive values push them
/// away; 0 leaves the image untouched and 100 thresholds it. Alpha is kept.
pub fn adjust_contrast(img: &DynamicImage, percentage: f64) -> DynamicImage {
    let lut = contrast_lut(percentage);

    if img.color().has_alpha() {
        let mut rgba = img.to_rgba8();
        for pixel in rgba.pixels_mut() {
            for channel in pixel.0.iter_mut().take(3) {
                *channel = lut[*channel as usize];
            }
        }
        DynamicImage::ImageRgba8(rgba)
    } else {
        let mut rgb = img.to_rgb8();
        for pixel in rgb.pixels_mut() {
            for channel in pixel.0.iter_mut() {
                *channel = lut[*channel as usize];
            }
        }
        DynamicImage::ImageRgb8(rgb)
    }
}

fn contrast_lut(percentage: f64) -> [u8; 256] {
    let percentage = if percentage.is_finite() {
        percentage.clamp(-100.0, 100.0)
    } else {
        0.0
    };
    let v = (100.0 + percentage) / 100.0;

    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let x = i as f64 / 255.0;
        *entry = if (0.0..=1.0).contains(&v) {
            clamp_channel((0.5 + (x - 0.5) * v) * 255.0)
        } else if v < 2.0 {
            clamp_channel((0.5 + (x - 0.5) * (1.0 / (2.0 - v))) * 255.0)
        } else if x + 0.5 >= 1.0 {
            255
        } else {
            0
        };
    }
    lut
}

fn clamp_channel(value: f64) -> u8 {
    let v = (value + 0.5) as i64;
    v.clamp(0, 255) as u8
}

/// Resize image using fast-image-resize with Lanczos3 filter
fn resize_exact(
    img: &DynamicImage,
    target_w: u32,
    target_h: u32,
) -> Result<DynamicImage, ImageError> {
    let src_width =
        NonZeroU32::new(img.width()).ok_or_else(|| ImageError::resize_failed("Source width is 0"))?;
    let src_height = NonZeroU32::new(img.height())
        .ok_or_else(|| ImageError::resize_failed("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| ImageError::resize_failed("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| ImageError::resize_failed("Target height is 0"))?;
    if target_w as u64 * target_h as u64 * 4 > MAX_RESIZE_BYTES {
        return Err(ImageError::invalid_dimensions(
            target_w as i64,
            target_h as i64,
            "target image is too large",
        ));
    }

    // Resize in RGB when there is no alpha so the output keeps the source layout
    let has_alpha = img.color().has_alpha();
    let (buffer, pixel_type) = if has_alpha {
        (img.to_rgba8().into_raw(), PixelType::U8x4)
    } else {
        (img.to_rgb8().into_raw(), PixelType::U8x3)
    };

    let src_image = Image::from_vec_u8(src_width, src_height, buffer, pixel_type)
        .map_err(|e| ImageError::resize_failed(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, pixel_type);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));

    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| ImageError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    let result_buf = dst_image.into_vec();
    let resized = if has_alpha {
        image::RgbaImage::from_raw(target_w, target_h, result_buf).map(DynamicImage::ImageRgba8)
    } else {
        image::RgbImage::from_raw(target_w, target_h, result_buf).map(DynamicImage::ImageRgb8)
    };

    resized.ok_or_else(|| ImageError::resize_failed("Failed to create output image buffer"))
}
