// imgbatch/src/processors/thumbnail.rs
use crate::core::{EmptyBatchPolicy, ImageOperation, ImageToolError, Quality, ResizeAlgorithm, Result};
use crate::geometry::{Dimensions, ResizeMode};
use crate::processors::{Compressor, Loader, Resizer};
use crate::utils::suffixed_path;
use image::DynamicImage;
use std::path::{Path, PathBuf};

pub const DEFAULT_THUMBNAIL_SIZE: u32 = 150;

/// Small previews: fit inside `size`x`size`, or fill and center-crop to it.
#[derive(Debug, Clone)]
pub struct Thumbnailer {
    size: u32,
    square: bool,
    algorithm: ResizeAlgorithm,
    loader: Loader,
}

impl Thumbnailer {
    pub fn new(size: u32, square: bool) -> Self {
        Self {
            size,
            square,
            algorithm: ResizeAlgorithm::Bilinear,
            loader: Loader::new(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: ResizeAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    fn resizer(&self) -> Result<Resizer> {
        if self.size == 0 {
            return Err(ImageToolError::InvalidParameter(
                "Thumbnail size must be positive".to_string(),
            ));
        }
        let mode = if self.square {
            ResizeMode::Crop
        } else {
            ResizeMode::KeepAspectRatio
        };
        Ok(Resizer::new(Some(self.size), Some(self.size), mode).with_algorithm(self.algorithm))
    }

    pub fn thumbnail(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let resizer = self.resizer()?;
        // Never upscale a source that already fits.
        if !self.square && image.width() <= self.size && image.height() <= self.size {
            return Ok(image.clone());
        }
        resizer.resize(image)
    }

    pub fn thumbnail_file(&self, source: &Path, target: &Path, quality: Quality) -> Result<Dimensions> {
        self.resizer()?;
        let image = self.loader.load(source)?;
        let thumb = self.thumbnail(&image)?;
        Compressor::new(quality).save(&thumb, target)?;
        Ok(Dimensions::new(thumb.width(), thumb.height())?)
    }
}

impl Default for Thumbnailer {
    fn default() -> Self {
        Self::new(DEFAULT_THUMBNAIL_SIZE, false)
    }
}

impl ImageOperation for Thumbnailer {
    fn name(&self) -> &'static str {
        "thumbnail"
    }

    fn process_one(&self, source: &Path, target: &Path, quality: Quality) -> Result<()> {
        self.thumbnail_file(source, target, quality).map(|_| ())
    }

    fn target_path(&self, source: &Path, output_dir: &Path) -> PathBuf {
        suffixed_path(source, output_dir, Some("thumb"), None)
    }

    fn empty_batch_policy(&self) -> EmptyBatchPolicy {
        EmptyBatchPolicy::Error
    }
}
