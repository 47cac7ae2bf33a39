// imgbatch/src/processors/watermark.rs
use crate::core::{EmptyBatchPolicy, ImageOperation, ImageToolError, Quality, Result};
use crate::geometry::{place, resolve_size, AnchorPosition, ResizeMode, DEFAULT_MARGIN};
use crate::processors::text::TextRenderer;
use crate::processors::{Compressor, Loader};
use crate::utils::suffixed_path;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum WatermarkContent {
    Text {
        text: String,
        font_size: u32,
        color: Rgba<u8>,
    },
    Image {
        image: RgbaImage,
        /// Width of the mark as a percentage of the container width.
        scale_percent: Option<f32>,
    },
}

/// Stamps text or an image onto a container at an [`AnchorPosition`].
#[derive(Debug, Clone)]
pub struct Watermarker {
    content: WatermarkContent,
    anchor: AnchorPosition,
    margin: u32,
    opacity: f32,
    loader: Loader,
}

impl Watermarker {
    pub fn text(text: impl Into<String>, font_size: u32, color: Rgba<u8>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ImageToolError::InvalidParameter(
                "Watermark text cannot be empty".to_string(),
            ));
        }
        Ok(Self::with_content(WatermarkContent::Text {
            text,
            font_size,
            color,
        }))
    }

    pub fn image_file(path: &Path, scale_percent: Option<f32>) -> Result<Self> {
        let image = Loader::new().load(path)?.to_rgba8();
        Self::image(image, scale_percent)
    }

    pub fn image(image: RgbaImage, scale_percent: Option<f32>) -> Result<Self> {
        if let Some(pct) = scale_percent {
            if !(pct.is_finite() && pct > 0.0) {
                return Err(ImageToolError::InvalidParameter(format!(
                    "Watermark scale must be positive, got {}",
                    pct
                )));
            }
        }
        Ok(Self::with_content(WatermarkContent::Image {
            image,
            scale_percent: scale_percent.map(|p| p.min(100.0)),
        }))
    }

    fn with_content(content: WatermarkContent) -> Self {
        Self {
            content,
            anchor: AnchorPosition::default(),
            margin: DEFAULT_MARGIN,
            opacity: 1.0,
            loader: Loader::new(),
        }
    }

    pub fn with_anchor(mut self, anchor: AnchorPosition) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    /// 0.0..=1.0, clamped.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
        self
    }

    fn render_mark(&self, container_w: u32, container_h: u32) -> Result<RgbaImage> {
        let mut mark = match &self.content {
            WatermarkContent::Text {
                text,
                font_size,
                color,
            } => TextRenderer::new(*font_size).render(text, *color)?,
            WatermarkContent::Image {
                image,
                scale_percent,
            } => match scale_percent {
                Some(pct) => {
                    let target_w = ((container_w as f32 * pct / 100.0).round() as u32).max(1);
                    let dims = resolve_size(
                        image.width(),
                        image.height(),
                        Some(target_w),
                        None,
                        ResizeMode::KeepAspectRatio,
                    )?;
                    imageops::resize(image, dims.width, dims.height, FilterType::Triangle)
                }
                None => image.clone(),
            },
        };

        if self.opacity < 1.0 {
            for pixel in mark.pixels_mut() {
                pixel[3] = (pixel[3] as f32 * self.opacity).round() as u8;
            }
        }

        log::debug!(
            "Watermark {}x{} on {}x{} at {:?}",
            mark.width(),
            mark.height(),
            container_w,
            container_h,
            self.anchor
        );
        Ok(mark)
    }

    pub fn apply(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let (w, h) = (image.width(), image.height());
        let mark = self.render_mark(w, h)?;
        let (x, y) = place(w, h, mark.width(), mark.height(), self.anchor, self.margin);

        let mut base = image.to_rgba8();
        // Negative or overhanging placements are clipped by overlay.
        imageops::overlay(&mut base, &mark, x, y);

        Ok(if image.color().has_alpha() {
            DynamicImage::ImageRgba8(base)
        } else {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(base).to_rgb8())
        })
    }

    pub fn watermark_file(&self, source: &Path, target: &Path, quality: Quality) -> Result<()> {
        let loaded = self.loader.load_with_profile(source)?;
        let marked = self.apply(&loaded.image)?;
        Compressor::new(quality)
            .with_icc_profile(loaded.icc_profile)
            .save(&marked, target)
    }
}

impl ImageOperation for Watermarker {
    fn name(&self) -> &'static str {
        "watermark"
    }

    fn process_one(&self, source: &Path, target: &Path, quality: Quality) -> Result<()> {
        self.watermark_file(source, target, quality)
    }

    fn target_path(&self, source: &Path, output_dir: &Path) -> PathBuf {
        suffixed_path(source, output_dir, Some("watermarked"), None)
    }

    fn empty_batch_policy(&self) -> EmptyBatchPolicy {
        EmptyBatchPolicy::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn white(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([255, 255, 255])))
    }

    fn red_square(size: u32) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba([255, 0, 0, 255]))
    }

    #[test]
    fn empty_text_is_a_validation_error() {
        assert!(matches!(
            Watermarker::text("   ", 16, Rgba([0, 0, 0, 255])),
            Err(ImageToolError::InvalidParameter(_))
        ));
    }

    #[test]
    fn image_mark_lands_at_anchor() {
        let wm = Watermarker::image(red_square(50), None)
            .unwrap()
            .with_anchor(AnchorPosition::BottomRight);
        let out = wm.apply(&white(200, 200)).unwrap().to_rgb8();

        assert_eq!(out.get_pixel(130, 130), &Rgb([255, 0, 0]));
        assert_eq!(out.get_pixel(179, 179), &Rgb([255, 0, 0]));
        assert_eq!(out.get_pixel(129, 129), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(180, 180), &Rgb([255, 255, 255]));
    }

    #[test]
    fn opacity_blends_with_background() {
        let wm = Watermarker::image(red_square(10), None)
            .unwrap()
            .with_anchor(AnchorPosition::TopLeft)
            .with_margin(0)
            .with_opacity(0.5);
        let out = wm.apply(&white(20, 20)).unwrap().to_rgb8();
        let p = out.get_pixel(5, 5);
        assert!(p[0] >= 254, "{p:?}");
        assert!(p[1] > 100 && p[1] < 160, "{p:?}");
    }

    #[test]
    fn scaled_mark_follows_container_width() {
        let wm = Watermarker::image(red_square(10), Some(50.0))
            .unwrap()
            .with_anchor(AnchorPosition::TopLeft)
            .with_margin(0);
        let out = wm.apply(&white(100, 100)).unwrap().to_rgb8();
        assert_eq!(out.get_pixel(49, 49), &Rgb([255, 0, 0]));
        assert_eq!(out.get_pixel(51, 51), &Rgb([255, 255, 255]));
    }

    #[test]
    fn oversized_mark_is_clipped_not_rejected() {
        let wm = Watermarker::image(red_square(300), None)
            .unwrap()
            .with_anchor(AnchorPosition::Center);
        let out = wm.apply(&white(100, 100)).unwrap();
        assert_eq!((out.width(), out.height()), (100, 100));
        assert_eq!(out.to_rgb8().get_pixel(0, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn text_mark_changes_pixels_and_keeps_size() {
        let wm = Watermarker::text("(c)", 16, Rgba([0, 0, 0, 255]))
            .unwrap()
            .with_anchor(AnchorPosition::TopLeft);
        let out = wm.apply(&white(120, 60)).unwrap().to_rgb8();
        assert_eq!(out.dimensions(), (120, 60));
        assert!(out.pixels().any(|p| p == &Rgb([0, 0, 0])));
    }

    #[test]
    fn watermarked_suffix() {
        let wm = Watermarker::text("x", 8, Rgba([0, 0, 0, 255])).unwrap();
        assert_eq!(
            wm.target_path(Path::new("a/b.jpg"), Path::new("o")),
            PathBuf::from("o/b_watermarked.jpg")
        );
    }
}
