// imgbatch/src/processors/compressor.rs
use crate::core::{ImageOperation, ImageToolError, OutputFormat, Quality, Result};
use crate::processors::Loader;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageEncoder, Rgb, RgbImage};
use oxipng::{optimize_from_memory, Options};
use std::io::Cursor;
use std::path::Path;

/// Highest oxipng preset.
pub const MAX_PNG_LEVEL: u8 = 6;

#[derive(Debug, Clone)]
pub struct Compressor {
    quality: Quality,
    png_level: Option<u8>,
    icc_profile: Option<Vec<u8>>,
}

impl Compressor {
    pub fn new(quality: Quality) -> Self {
        Self {
            quality,
            png_level: None,
            icc_profile: None,
        }
    }

    /// Run PNG output through oxipng at `level` (clamped to 0..=6).
    pub fn with_png_optimization(mut self, level: Option<u8>) -> Self {
        self.png_level = level.map(|l| l.min(MAX_PNG_LEVEL));
        self
    }

    /// Embed `profile` where the encoder supports it.
    pub fn with_icc_profile(mut self, profile: Option<Vec<u8>>) -> Self {
        self.icc_profile = profile;
        self
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Save using the format implied by the extension of `path`.
    pub fn save(&self, image: &DynamicImage, path: &Path) -> Result<()> {
        let format = OutputFormat::from_path(path)?;
        self.save_with_format(image, path, format)
    }

    pub fn save_with_format(
        &self,
        image: &DynamicImage,
        path: &Path,
        format: OutputFormat,
    ) -> Result<()> {
        log::debug!(
            "Saving image to {} as {:?}, quality: {}",
            path.display(),
            format,
            self.quality.value()
        );

        // Encode fully before touching the target so a failed encode leaves no partial file.
        let data = self.compress_to_bytes(image, format)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &data)?;

        log::info!("Saved image: {} ({} bytes)", path.display(), data.len());
        Ok(())
    }

    pub fn compress_to_bytes(&self, image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());

        match format {
            OutputFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgb8(flatten_alpha(image));
                let mut encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality.value());
                self.attach_icc(&mut encoder);
                rgb.write_with_encoder(encoder)?;
            }
            OutputFormat::Png => {
                let mut encoder = PngEncoder::new_with_quality(
                    &mut buffer,
                    CompressionType::Best,
                    FilterType::Adaptive,
                );
                self.attach_icc(&mut encoder);
                image.write_with_encoder(encoder)?;
                if let Some(level) = self.png_level {
                    return self.optimize_png_bytes(&buffer.into_inner(), level);
                }
            }
            OutputFormat::WebP => {
                // The pure-Rust WebP encoder is lossless only.
                let encoder = WebPEncoder::new_lossless(&mut buffer);
                to_eight_bit(image).write_with_encoder(encoder)?;
            }
            OutputFormat::Gif => {
                DynamicImage::ImageRgba8(image.to_rgba8())
                    .write_to(&mut buffer, format.image_format())?;
            }
            OutputFormat::Bmp => {
                to_eight_bit(image).write_to(&mut buffer, format.image_format())?;
            }
            OutputFormat::Tiff => {
                image.write_to(&mut buffer, format.image_format())?;
            }
        }

        Ok(buffer.into_inner())
    }

    fn attach_icc<E: ImageEncoder>(&self, encoder: &mut E) {
        if let Some(profile) = &self.icc_profile {
            if let Err(e) = encoder.set_icc_profile(profile.clone()) {
                log::warn!("Encoder dropped ICC profile: {}", e);
            }
        }
    }

    fn optimize_png_bytes(&self, data: &[u8], level: u8) -> Result<Vec<u8>> {
        optimize_from_memory(data, &Options::from_preset(level))
            .map_err(|e| ImageToolError::ProcessingError(format!("PNG optimization failed: {}", e)))
    }

    pub fn calculate_savings(original_size: u64, compressed_size: u64) -> f64 {
        if original_size == 0 {
            return 0.0;
        }

        let savings =
            (original_size as f64 - compressed_size as f64) / original_size as f64 * 100.0;
        savings.max(0.0)
    }
}

/// Composite onto white; JPEG has no alpha channel.
fn flatten_alpha(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let a = p[3] as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    })
}

fn to_eight_bit(image: &DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image.clone(),
        _ if image.color().has_alpha() => DynamicImage::ImageRgba8(image.to_rgba8()),
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

/// Re-encode in place of the source format: JPEG by quality, PNG through oxipng.
#[derive(Debug, Clone)]
pub struct CompressOperation {
    png_level: u8,
    loader: Loader,
}

impl CompressOperation {
    pub fn new(png_level: u8) -> Self {
        Self {
            png_level: png_level.min(MAX_PNG_LEVEL),
            loader: Loader::new(),
        }
    }

    /// Compress `source` into `target`, returning the size change in percent.
    pub fn compress(&self, source: &Path, target: &Path, quality: Quality) -> Result<f64> {
        let loaded = self.loader.load_with_profile(source)?;
        let format = self.loader.detect_format(source)?;
        let before = std::fs::metadata(source)?.len();

        Compressor::new(quality)
            .with_png_optimization(Some(self.png_level))
            .with_icc_profile(loaded.icc_profile)
            .save_with_format(&loaded.image, target, format)?;

        let after = std::fs::metadata(target)?.len();
        let savings = Compressor::calculate_savings(before, after);
        log::info!(
            "Compressed {} ({} -> {} bytes, {:.1}% smaller)",
            source.display(),
            before,
            after,
            savings
        );
        Ok(savings)
    }
}

impl Default for CompressOperation {
    fn default() -> Self {
        Self::new(2)
    }
}

impl ImageOperation for CompressOperation {
    fn name(&self) -> &'static str {
        "compress"
    }

    fn process_one(&self, source: &Path, target: &Path, quality: Quality) -> Result<()> {
        self.compress(source, target, quality).map(|_| ())
    }
}
