//! EXIF orientation handling
//!
//! Cameras store the sensor image as-is and record how it should be
//! displayed in the EXIF `Orientation` tag. Decoding bakes that tag into the
//! raster so every later operation works on the upright image.

use image::DynamicImage;
use std::io::Cursor;

/// The eight EXIF orientations (tag 0x0112)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// 1: already upright
    #[default]
    Normal,
    /// 2: mirrored horizontally
    FlipHorizontal,
    /// 3: upside down
    Rotate180,
    /// 4: mirrored vertically
    FlipVertical,
    /// 5: mirrored across the main diagonal
    Transpose,
    /// 6: needs a 90° clockwise turn
    Rotate90,
    /// 7: mirrored across the anti-diagonal
    Transverse,
    /// 8: needs a 90° counter-clockwise turn
    Rotate270,
}

impl Orientation {
    /// Map a raw tag value; unknown values are treated as upright.
    pub fn from_tag(value: u32) -> Self {
        match value {
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90,
            7 => Self::Transverse,
            8 => Self::Rotate270,
            _ => Self::Normal,
        }
    }

    /// Read the orientation from the container's EXIF block.
    ///
    /// Missing or unreadable metadata is not an error: most uploads carry no
    /// EXIF at all and are displayed as stored.
    pub fn read(data: &[u8]) -> Self {
        let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
            Ok(exif) => exif,
            Err(_) => return Self::Normal,
        };

        exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Self::from_tag)
            .unwrap_or_default()
    }

    /// Produce the upright image.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Self::Normal => img,
            Self::FlipHorizontal => img.fliph(),
            Self::Rotate180 => img.rotate180(),
            Self::FlipVertical => img.flipv(),
            Self::Transpose => img.rotate90().fliph(),
            Self::Rotate90 => img.rotate90(),
            Self::Transverse => img.rotate270().fliph(),
            Self::Rotate270 => img.rotate270(),
        }
    }
}
