//! Image transform module
//!
//! The codec and pixel operations behind the upload endpoints:
//! - Decode JPEG/PNG with EXIF orientation baked into the raster
//! - Resize to a width with proportional height (Lanczos3)
//! - Fill: crop to the target aspect around the center, then scale
//! - Contrast adjustment by a signed percentage
//! - Re-encode to the source format (JPEG quality, PNG compression level)
//!
//! Everything here is synchronous and CPU bound. Callers on the async
//! runtime are expected to run it on the blocking pool.

pub mod config;
pub mod encoder;
pub mod error;
pub mod kind;
pub mod orientation;
pub mod processor;

pub use config::ImageConfig;
pub use encoder::{EncodeSettings, EncoderFactory, ImageEncoder};
pub use error::ImageError;
pub use kind::ImageKind;
pub use orientation::Orientation;
pub use processor::{adjust_contrast, decode, encode, fill, resize_to_width, Transform};
