// imgbatch/src/processors/converter.rs
use crate::core::{ImageOperation, OutputFormat, Quality, Result};
use crate::processors::{Compressor, Loader};
use crate::utils::suffixed_path;
use std::path::{Path, PathBuf};

/// Re-encode into another format, keeping the file stem.
#[derive(Debug, Clone)]
pub struct Converter {
    format: OutputFormat,
    loader: Loader,
}

impl Converter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            loader: Loader::new(),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn convert(&self, source: &Path, target: &Path, quality: Quality) -> Result<()> {
        let loaded = self.loader.load_with_profile(source)?;
        if loaded.image.color().has_alpha() && !self.format.supports_alpha() {
            log::debug!(
                "{} has alpha; flattening for {:?}",
                source.display(),
                self.format
            );
        }
        Compressor::new(quality)
            .with_icc_profile(loaded.icc_profile)
            .save_with_format(&loaded.image, target, self.format)
    }
}

impl ImageOperation for Converter {
    fn name(&self) -> &'static str {
        "convert"
    }

    fn process_one(&self, source: &Path, target: &Path, quality: Quality) -> Result<()> {
        self.convert(source, target, quality)
    }

    fn target_path(&self, source: &Path, output_dir: &Path) -> PathBuf {
        suffixed_path(source, output_dir, None, Some(self.format.extension()))
    }
}
