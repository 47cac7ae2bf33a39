// imgbatch/src/processors/color.rs
use crate::core::{EmptyBatchPolicy, ImageOperation, Quality, Result};
use crate::processors::tone::{apply_tone, ToneAdjustment};
use crate::processors::{Compressor, Loader};
use crate::utils::suffixed_path;
use std::path::{Path, PathBuf};

/// Applies a [`ToneAdjustment`] to whole files.
#[derive(Debug, Clone)]
pub struct ColorAdjuster {
    adjustment: ToneAdjustment,
    loader: Loader,
}

impl ColorAdjuster {
    pub fn new(adjustment: ToneAdjustment) -> Self {
        Self {
            adjustment: adjustment.clamped(),
            loader: Loader::new(),
        }
    }

    pub fn adjustment(&self) -> &ToneAdjustment {
        &self.adjustment
    }

    pub fn adjust_file(&self, source: &Path, target: &Path, quality: Quality) -> Result<()> {
        let loaded = self.loader.load_with_profile(source)?;
        if self.adjustment.is_neutral() {
            log::info!("Neutral adjustment for {}, re-encoding only", source.display());
        }
        let adjusted = apply_tone(loaded.image, &self.adjustment);
        Compressor::new(quality)
            .with_icc_profile(loaded.icc_profile)
            .save(&adjusted, target)
    }
}

impl ImageOperation for ColorAdjuster {
    fn name(&self) -> &'static str {
        "adjust"
    }

    fn process_one(&self, source: &Path, target: &Path, quality: Quality) -> Result<()> {
        self.adjust_file(source, target, quality)
    }

    fn target_path(&self, source: &Path, output_dir: &Path) -> PathBuf {
        suffixed_path(source, output_dir, Some("adjusted"), None)
    }

    fn empty_batch_policy(&self) -> EmptyBatchPolicy {
        EmptyBatchPolicy::Error
    }
}
