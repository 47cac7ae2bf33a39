// imgbatch/src/processors/loader.rs
use crate::core::{ImageToolError, OutputFormat, Result};
use crate::utils::image_format_to_string;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader};
use std::path::Path;

/// A decoded image plus the colour profile its container carried.
pub struct LoadedImage {
    pub image: DynamicImage,
    pub icc_profile: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct Loader {
    max_dimensions: Option<(u32, u32)>,
    max_file_size: Option<u64>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimensions: Some((100_000, 100_000)),
            max_file_size: None,
        }
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_dimensions = Some((width, height));
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    pub fn load(&self, path: &Path) -> Result<DynamicImage> {
        Ok(self.load_with_profile(path)?.image)
    }

    pub fn load_with_profile(&self, path: &Path) -> Result<LoadedImage> {
        log::debug!("Loading image from: {}", path.display());

        self.validate_path(path)?;

        let mut decoder = ImageReader::open(path)?
            .with_guessed_format()?
            .into_decoder()
            .map_err(|e| {
                ImageToolError::ProcessingError(format!(
                    "Failed to decode {}: {}",
                    path.display(),
                    e
                ))
            })?;
        let icc_profile = decoder.icc_profile().unwrap_or_else(|e| {
            log::debug!("Ignoring unreadable ICC profile in {}: {}", path.display(), e);
            None
        });
        let image = DynamicImage::from_decoder(decoder).map_err(|e| {
            ImageToolError::ProcessingError(format!("Failed to decode {}: {}", path.display(), e))
        })?;

        if let Some((max_w, max_h)) = self.max_dimensions {
            let (width, height) = image.dimensions();
            if width > max_w || height > max_h {
                return Err(ImageToolError::MemoryLimitExceeded(format!(
                    "Image dimensions {}x{} exceed maximum {}x{}",
                    width, height, max_w, max_h
                )));
            }
        }

        log::debug!(
            "Loaded image: {}x{} pixels, color: {:?}",
            image.width(),
            image.height(),
            image.color()
        );

        Ok(LoadedImage { image, icc_profile })
    }

    pub fn get_dimensions_and_format(&self, path: &Path) -> Result<(u32, u32, String)> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;

        let format = reader
            .format()
            .map(image_format_to_string)
            .unwrap_or_else(|| "Unknown".to_string());

        let (width, height) = reader.into_dimensions()?;

        Ok((width, height, format))
    }

    /// Format implied by the file extension.
    pub fn detect_format(&self, path: &Path) -> Result<OutputFormat> {
        OutputFormat::from_path(path)
    }

    fn validate_path(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(ImageToolError::InvalidParameter(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let size = path.metadata()?.len();
        if size == 0 {
            return Err(ImageToolError::InvalidParameter(format!(
                "File is empty: {}",
                path.display()
            )));
        }
        if let Some(max_size) = self.max_file_size {
            if size > max_size {
                return Err(ImageToolError::MemoryLimitExceeded(format!(
                    "File size {} exceeds limit {}",
                    size, max_size
                )));
            }
        }

        Ok(())
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_generated_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.png");
        image::RgbImage::new(12, 7).save(&path).unwrap();

        let img = Loader::new().load(&path).unwrap();
        assert_eq!(img.dimensions(), (12, 7));
    }

    #[test]
    fn rejects_missing_and_empty_files() {
        let dir = TempDir::new().unwrap();
        let loader = Loader::new();
        assert!(loader.load(&dir.path().join("nope.png")).is_err());

        let empty = dir.path().join("empty.png");
        std::fs::write(&empty, b"").unwrap();
        assert!(matches!(
            loader.load(&empty),
            Err(ImageToolError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(Loader::new().load(&path).is_err());
    }

    #[test]
    fn enforces_dimension_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.png");
        image::RgbImage::new(64, 64).save(&path).unwrap();

        let loader = Loader::new().with_max_dimensions(32, 32);
        assert!(matches!(
            loader.load(&path),
            Err(ImageToolError::MemoryLimitExceeded(_))
        ));
    }

    #[test]
    fn reports_dimensions_and_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("b.png");
        image::RgbImage::new(3, 5).save(&path).unwrap();
        assert_eq!(
            Loader::new().get_dimensions_and_format(&path).unwrap(),
            (3, 5, "PNG".to_string())
        );
    }
}
