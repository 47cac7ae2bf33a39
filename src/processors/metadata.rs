// imgbatch/src/processors/metadata.rs
use crate::core::{ImageMetadata, ImageOperation, ImageToolError, Quality, Result};
use crate::processors::{Compressor, Loader};
use exif::{Exif, In, Reader, Tag};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// What a strip found and what survived it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StripReport {
    pub had_exif: bool,
    pub had_icc: bool,
    pub kept_icc: bool,
}

/// Removes embedded profiles by re-encoding pixels only.
///
/// EXIF, XMP and IPTC never survive a re-encode. The ICC colour profile is
/// dropped too unless `keep_icc` is set, in which case it is handed back to
/// the encoder.
#[derive(Debug, Clone)]
pub struct MetadataProcessor {
    keep_icc: bool,
    loader: Loader,
}

impl MetadataProcessor {
    pub fn new() -> Self {
        Self {
            keep_icc: false,
            loader: Loader::new(),
        }
    }

    pub fn keep_icc_profile(mut self, keep: bool) -> Self {
        self.keep_icc = keep;
        self
    }

    pub fn strip_file(&self, source: &Path, target: &Path, quality: Quality) -> Result<StripReport> {
        let had_exif = self.has_metadata(source).unwrap_or(false);
        let loaded = self.loader.load_with_profile(source)?;
        let format = self.loader.detect_format(source)?;

        let had_icc = loaded.icc_profile.is_some();
        let icc = if self.keep_icc { loaded.icc_profile } else { None };
        let kept_icc = icc.is_some();

        Compressor::new(quality)
            .with_icc_profile(icc)
            .save_with_format(&loaded.image, target, format)?;

        log::info!(
            "Stripped metadata from {} (exif: {}, icc: {}, icc kept: {})",
            source.display(),
            had_exif,
            had_icc,
            kept_icc
        );
        Ok(StripReport {
            had_exif,
            had_icc,
            kept_icc,
        })
    }

    pub fn read_metadata(&self, path: &Path) -> Result<Option<Exif>> {
        let file = File::open(path)?;
        let mut bufreader = BufReader::new(&file);

        match Reader::new().read_from_container(&mut bufreader) {
            Ok(exif) => {
                log::debug!("Found EXIF data in {}", path.display());
                Ok(Some(exif))
            }
            Err(exif::Error::NotFound(_)) => {
                log::debug!("No EXIF data found in {}", path.display());
                Ok(None)
            }
            Err(e) => {
                log::warn!("Failed to read EXIF from {}: {}", path.display(), e);
                Err(ImageToolError::ProcessingError(format!("EXIF read error: {}", e)))
            }
        }
    }

    pub fn has_metadata(&self, path: &Path) -> Result<bool> {
        Ok(self.read_metadata(path)?.is_some())
    }

    /// Size, format and EXIF presence of an image file.
    pub fn describe(&self, path: &Path) -> Result<ImageMetadata> {
        if !path.is_file() {
            return Err(ImageToolError::InvalidParameter(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let file_size = std::fs::metadata(path)?.len();
        let (width, height, format) = self.loader.get_dimensions_and_format(path)?;
        // Unparseable EXIF should not hide the rest of the report.
        let has_exif = self.has_metadata(path).unwrap_or(false);

        Ok(ImageMetadata {
            width,
            height,
            format,
            has_exif,
            file_size,
        })
    }

    /// Human-readable EXIF fields from the primary image.
    pub fn extract_common_metadata(&self, exif: &Exif) -> Vec<(String, String)> {
        const COMMON: [Tag; 16] = [
            Tag::ImageDescription,
            Tag::Make,
            Tag::Model,
            Tag::DateTime,
            Tag::DateTimeOriginal,
            Tag::ExposureTime,
            Tag::FNumber,
            Tag::FocalLength,
            Tag::PhotographicSensitivity,
            Tag::Flash,
            Tag::WhiteBalance,
            Tag::Orientation,
            Tag::Software,
            Tag::Artist,
            Tag::Copyright,
            Tag::GPSLatitude,
        ];

        COMMON
            .iter()
            .filter_map(|tag| exif.get_field(*tag, In::PRIMARY))
            .map(|field| {
                (
                    field.tag.to_string(),
                    field.display_value().with_unit(exif).to_string(),
                )
            })
            .collect()
    }
}

impl Default for MetadataProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageOperation for MetadataProcessor {
    fn name(&self) -> &'static str {
        "strip"
    }

    fn process_one(&self, source: &Path, target: &Path, quality: Quality) -> Result<()> {
        self.strip_file(source, target, quality).map(|_| ())
    }
}
