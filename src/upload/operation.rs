//! Per-endpoint request binding
//!
//! Each endpoint binds its own request struct from the form's text fields.
//! Absent fields take the zero value; present values must parse.

use super::error::UploadError;
use super::form::UploadForm;
use crate::transform::{ImageConfig, ImageError, Transform};

/// Form fields for `/resize_image`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResizeRequest {
    pub width: i64,
}

/// Form fields for `/crop_image`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRequest {
    pub width: i64,
    pub height: i64,
}

/// Form fields for `/adjust_contrast`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContrastRequest {
    pub percentage: f64,
}

/// Which endpoint a request came in on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Resize,
    Crop,
    Contrast,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::Crop => "crop",
            Self::Contrast => "contrast",
        }
    }

    /// Bind this endpoint's fields from the form
    pub fn bind(&self, form: &UploadForm) -> Result<Operation, UploadError> {
        match self {
            Self::Resize => Ok(Operation::Resize(ResizeRequest {
                width: parse_int(form, "width")?,
            })),
            Self::Crop => Ok(Operation::Crop(CropRequest {
                width: parse_int(form, "width")?,
                height: parse_int(form, "height")?,
            })),
            Self::Contrast => Ok(Operation::Contrast(ContrastRequest {
                percentage: parse_float(form, "percentage")?,
            })),
        }
    }
}

/// A bound request, ready to be validated into a [`Transform`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Resize(ResizeRequest),
    Crop(CropRequest),
    Contrast(ContrastRequest),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Resize(_) => OperationKind::Resize,
            Self::Crop(_) => OperationKind::Crop,
            Self::Contrast(_) => OperationKind::Contrast,
        }
    }

    /// Path prefix of the output file
    pub fn prefix(&self) -> &'static str {
        self.kind().as_str()
    }

    /// The parameter rendered into the output filename.
    ///
    /// Crop only records its width, so crops differing in height alone share
    /// a path.
    pub fn primary_param(&self) -> String {
        match self {
            Self::Resize(req) => req.width.to_string(),
            Self::Crop(req) => req.width.to_string(),
            Self::Contrast(req) => format!("{:.0}", req.percentage),
        }
    }

    /// Check the bound values and build the pixel operation.
    ///
    /// `fixed_contrast` replaces the client percentage when configured.
    pub fn to_transform(&self, config: &ImageConfig) -> Result<Transform, UploadError> {
        match *self {
            Self::Resize(req) => Ok(Transform::Resize {
                width: check_side(req.width, req.width, 0, config.max_width, "width")?,
            }),
            Self::Crop(req) => Ok(Transform::Fill {
                width: check_side(req.width, req.width, req.height, config.max_width, "width")?,
                height: check_side(req.height, req.width, req.height, config.max_height, "height")?,
            }),
            Self::Contrast(req) => Ok(Transform::Contrast {
                percentage: config.fixed_contrast.unwrap_or(req.percentage),
            }),
        }
    }
}

fn check_side(value: i64, width: i64, height: i64, max: u32, name: &str) -> Result<u32, UploadError> {
    if value <= 0 {
        return Err(ImageError::invalid_dimensions(
            width,
            height,
            format!("{} must be greater than 0", name),
        )
        .into());
    }
    if value > max as i64 {
        return Err(ImageError::invalid_dimensions(
            width,
            height,
            format!("{} exceeds maximum of {}", name, max),
        )
        .into());
    }
    Ok(value as u32)
}

fn parse_int(form: &UploadForm, name: &'static str) -> Result<i64, UploadError> {
    match form.field(name) {
        None | Some("") => Ok(0),
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| UploadError::invalid_param(name, format!("'{}' is not an integer", raw))),
    }
}

fn parse_float(form: &UploadForm, name: &'static str) -> Result<f64, UploadError> {
    match form.field(name) {
        None | Some("") => Ok(0.0),
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(UploadError::invalid_param(
                name,
                format!("'{}' is not a finite number", raw),
            )),
        },
    }
}
