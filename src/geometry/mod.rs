//! Pure geometry for image operations.
//!
//! Nothing in here touches pixels or the filesystem; every function takes all
//! of its inputs as parameters.
//!
//! - [`size`]: resize intent → output [`Dimensions`]
//! - [`crop`]: [`CropIntent`] → validated [`CropRectangle`]
//! - [`anchor`]: [`AnchorPosition`] → top-left placement of overlay content

pub mod anchor;
pub mod crop;
pub mod size;

pub use anchor::{place, AnchorPosition, DEFAULT_MARGIN};
pub use crop::{resolve_crop, CropIntent, CropRectangle};
pub use size::{resolve_size, ResizeMode};

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("dimensions must be positive, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("{0} resize requires both width and height")]
    MissingTarget(ResizeMode),

    #[error("crop origin ({x}, {y}) must not be negative")]
    NegativeOrigin { x: i64, y: i64 },

    #[error("crop size {width}x{height} must be positive")]
    NonPositiveSize { width: i64, height: i64 },

    #[error("crop origin ({x}, {y}) lies outside the {source_width}x{source_height} image")]
    StartOutside {
        x: i64,
        y: i64,
        source_width: u32,
        source_height: u32,
    },

    #[error("crop region {width}x{height} at ({x}, {y}) exceeds the {source_width}x{source_height} image")]
    ExceedsBounds {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        source_width: u32,
        source_height: u32,
    },

    #[error("crop percentage {name}={value} must be within 0..=100")]
    PercentOutOfRange { name: &'static str, value: f64 },

    #[error("crop percentages overflow the image: {axis} offset + size = {total} > 100")]
    PercentOverflow { axis: &'static str, total: f64 },
}

/// Resolved pixel dimensions. Both sides are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::ZeroDimension { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl From<Dimensions> for (u32, u32) {
    fn from(d: Dimensions) -> Self {
        (d.width, d.height)
    }
}
