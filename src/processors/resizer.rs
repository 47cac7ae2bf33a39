// imgbatch/src/processors/resizer.rs
use crate::core::{EmptyBatchPolicy, ImageOperation, Quality, ResizeAlgorithm, Result};
use crate::geometry::{resolve_crop, resolve_size, CropIntent, Dimensions, GeometryError, ResizeMode};
use crate::processors::{Compressor, Loader};
use crate::utils::suffixed_path;
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Resize to a target box under a [`ResizeMode`].
#[derive(Debug, Clone)]
pub struct Resizer {
    width: Option<u32>,
    height: Option<u32>,
    mode: ResizeMode,
    algorithm: ResizeAlgorithm,
    loader: Loader,
}

impl Resizer {
    pub fn new(width: Option<u32>, height: Option<u32>, mode: ResizeMode) -> Self {
        Self {
            width,
            height,
            mode,
            algorithm: ResizeAlgorithm::default(),
            loader: Loader::new(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: ResizeAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Reject requests that cannot succeed for any source image.
    pub fn validate(&self) -> Result<()> {
        if self.width == Some(0) || self.height == Some(0) {
            return Err(GeometryError::ZeroDimension {
                width: self.width.unwrap_or(0),
                height: self.height.unwrap_or(0),
            }
            .into());
        }
        if self.mode == ResizeMode::Crop && (self.width.is_none() || self.height.is_none()) {
            return Err(GeometryError::MissingTarget(self.mode).into());
        }
        Ok(())
    }

    /// Output size for a source of `width`x`height`, without touching pixels.
    pub fn output_dimensions(&self, width: u32, height: u32) -> Result<Dimensions> {
        if self.mode == ResizeMode::Crop {
            // Crop mode ends at exactly the requested box.
            resolve_size(width, height, self.width, self.height, self.mode)?;
            return Ok(Dimensions::new(
                self.width.unwrap_or(width),
                self.height.unwrap_or(height),
            )?);
        }
        Ok(resolve_size(width, height, self.width, self.height, self.mode)?)
    }

    pub fn resize(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let scaled = resolve_size(image.width(), image.height(), self.width, self.height, self.mode)?;
        let mut output = resize_exact(image, scaled, self.algorithm);

        if let (ResizeMode::Crop, Some(w), Some(h)) = (self.mode, self.width, self.height) {
            let rect = resolve_crop(
                output.width(),
                output.height(),
                CropIntent::Centered { width: w, height: h },
            )?;
            output = output.crop_imm(rect.x, rect.y, rect.width, rect.height);
        }

        Ok(output)
    }

    pub fn resize_file(&self, source: &Path, target: &Path, quality: Quality) -> Result<Dimensions> {
        self.validate()?;
        let loaded = self.loader.load_with_profile(source)?;
        let resized = self.resize(&loaded.image)?;
        let dims = Dimensions::new(resized.width(), resized.height())?;

        Compressor::new(quality)
            .with_icc_profile(loaded.icc_profile)
            .save(&resized, target)?;
        Ok(dims)
    }
}

pub(crate) fn resize_exact(image: &DynamicImage, dims: Dimensions, algorithm: ResizeAlgorithm) -> DynamicImage {
    if dims.width == image.width() && dims.height == image.height() {
        log::debug!("Image dimensions unchanged, skipping resize");
        return image.clone();
    }

    log::debug!(
        "Resizing image from {}x{} to {}x{}",
        image.width(),
        image.height(),
        dims.width,
        dims.height
    );
    image.resize_exact(dims.width, dims.height, algorithm.filter_type())
}

impl ImageOperation for Resizer {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn process_one(&self, source: &Path, target: &Path, quality: Quality) -> Result<()> {
        self.resize_file(source, target, quality).map(|_| ())
    }

    fn target_path(&self, source: &Path, output_dir: &Path) -> PathBuf {
        suffixed_path(source, output_dir, Some("resized"), None)
    }

    fn empty_batch_policy(&self) -> EmptyBatchPolicy {
        EmptyBatchPolicy::Error
    }
}
