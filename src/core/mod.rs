// imgbatch/src/core/mod.rs
mod operation;

pub use operation::{EmptyBatchPolicy, ImageOperation};

use crate::geometry::GeometryError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeAlgorithm {
    Nearest,
    Bilinear,
    Bicubic,
    #[default]
    Lanczos3,
}

impl ResizeAlgorithm {
    pub fn filter_type(self) -> image::imageops::FilterType {
        use image::imageops::FilterType;
        match self {
            ResizeAlgorithm::Nearest => FilterType::Nearest,
            ResizeAlgorithm::Bilinear => FilterType::Triangle,
            ResizeAlgorithm::Bicubic => FilterType::CatmullRom,
            ResizeAlgorithm::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl FromStr for ResizeAlgorithm {
    type Err = ImageToolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "bilinear" | "triangle" => Ok(Self::Bilinear),
            "bicubic" | "catmullrom" => Ok(Self::Bicubic),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            other => Err(ImageToolError::InvalidParameter(format!(
                "Unknown resize algorithm: {}",
                other
            ))),
        }
    }
}

/// Encodings the toolkit can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Bmp,
    Gif,
    Tiff,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                ImageToolError::UnsupportedFormat(format!(
                    "No file extension: {}",
                    path.display()
                ))
            })?;
        ext.parse()
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Gif => "gif",
            OutputFormat::Tiff => "tiff",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            OutputFormat::Jpeg => image::ImageFormat::Jpeg,
            OutputFormat::Png => image::ImageFormat::Png,
            OutputFormat::WebP => image::ImageFormat::WebP,
            OutputFormat::Bmp => image::ImageFormat::Bmp,
            OutputFormat::Gif => image::ImageFormat::Gif,
            OutputFormat::Tiff => image::ImageFormat::Tiff,
        }
    }

    pub fn supports_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpeg | OutputFormat::Bmp)
    }
}

impl FromStr for OutputFormat {
    type Err = ImageToolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            "bmp" => Ok(Self::Bmp),
            "gif" => Ok(Self::Gif),
            "tif" | "tiff" => Ok(Self::Tiff),
            other => Err(ImageToolError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Lossy encoding quality, clamped to 1..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32")]
pub struct Quality(u8);

impl Quality {
    pub const DEFAULT: Quality = Quality(85);

    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub has_exif: bool,
    pub file_size: u64,
}

#[derive(Error, Debug)]
pub enum ImageToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),

    #[error("Security error: {0}")]
    SecurityError(String),

    #[error("Memory limit exceeded: {0}")]
    MemoryLimitExceeded(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ImageToolError {
    /// Errors raised before any file was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ImageToolError::InvalidParameter(_)
                | ImageToolError::Geometry(_)
                | ImageToolError::UnsupportedFormat(_)
                | ImageToolError::SecurityError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ImageToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(250).value(), 100);
        assert_eq!(Quality::default().value(), 85);
    }

    #[test]
    fn output_format_parses_extensions() {
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!(".tif".parse::<OutputFormat>().unwrap(), OutputFormat::Tiff);
        assert!("psd".parse::<OutputFormat>().is_err());
        assert_eq!(
            OutputFormat::from_path(Path::new("a/b/photo.webp")).unwrap(),
            OutputFormat::WebP
        );
    }

    #[test]
    fn algorithm_parses_aliases() {
        assert_eq!(
            "lanczos".parse::<ResizeAlgorithm>().unwrap(),
            ResizeAlgorithm::Lanczos3
        );
        assert!("sinc".parse::<ResizeAlgorithm>().is_err());
    }
}
