// imgbatch/src/processors/cropper.rs
use crate::core::{ImageOperation, Quality, Result};
use crate::geometry::{resolve_crop, CropIntent, CropRectangle};
use crate::processors::{Compressor, Loader};
use image::DynamicImage;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Cropper {
    intent: CropIntent,
    loader: Loader,
}

impl Cropper {
    pub fn new(intent: CropIntent) -> Self {
        Self {
            intent,
            loader: Loader::new(),
        }
    }

    pub fn intent(&self) -> CropIntent {
        self.intent
    }

    pub fn crop(&self, image: &DynamicImage) -> Result<(DynamicImage, CropRectangle)> {
        let rect = resolve_crop(image.width(), image.height(), self.intent)?;
        log::debug!(
            "Cropping {}x{} to {}x{} at ({}, {})",
            image.width(),
            image.height(),
            rect.width,
            rect.height,
            rect.x,
            rect.y
        );
        Ok((image.crop_imm(rect.x, rect.y, rect.width, rect.height), rect))
    }

    pub fn crop_file(&self, source: &Path, target: &Path, quality: Quality) -> Result<CropRectangle> {
        let loaded = self.loader.load_with_profile(source)?;
        let (cropped, rect) = self.crop(&loaded.image)?;
        Compressor::new(quality)
            .with_icc_profile(loaded.icc_profile)
            .save(&cropped, target)?;
        Ok(rect)
    }
}

impl ImageOperation for Cropper {
    fn name(&self) -> &'static str {
        "crop"
    }

    fn process_one(&self, source: &Path, target: &Path, quality: Quality) -> Result<()> {
        self.crop_file(source, target, quality).map(|_| ())
    }
}
