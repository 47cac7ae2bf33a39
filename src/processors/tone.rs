//! Tone adjustments: brightness, contrast, saturation, hue and gamma.
//!
//! Brightness, contrast and hue go through the `image` crate's colour
//! operations. Saturation and gamma are computed here on normalized channel
//! values; alpha is never modified.

use image::{DynamicImage, Rgba32FImage};
use serde::{Deserialize, Serialize};

/// Changes smaller than this are treated as "leave alone".
const EPSILON: f32 = 0.01;

pub const GAMMA_RANGE: (f32, f32) = (0.1, 3.0);

/// Requested tone change. Every field is neutral by default and clamped into
/// its range before use.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ToneAdjustment {
    /// -100..=100
    pub brightness: f32,
    /// -100..=100
    pub contrast: f32,
    /// -100..=100; -100 is greyscale.
    pub saturation: f32,
    /// Degrees, -180..=180.
    pub hue: f32,
    /// 0.1..=3.0; above 1 brightens mid-tones.
    pub gamma: f32,
}

impl Default for ToneAdjustment {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 0.0,
            saturation: 0.0,
            hue: 0.0,
            gamma: 1.0,
        }
    }
}

impl ToneAdjustment {
    pub fn clamped(self) -> Self {
        Self {
            brightness: clamp_or(self.brightness, -100.0, 100.0, 0.0),
            contrast: clamp_or(self.contrast, -100.0, 100.0, 0.0),
            saturation: clamp_or(self.saturation, -100.0, 100.0, 0.0),
            hue: clamp_or(self.hue, -180.0, 180.0, 0.0),
            gamma: clamp_or(self.gamma, GAMMA_RANGE.0, GAMMA_RANGE.1, 1.0),
        }
    }

    pub fn is_neutral(&self) -> bool {
        let adj = self.clamped();
        !changed(adj.brightness, 0.0)
            && !changed(adj.contrast, 0.0)
            && !changed(adj.saturation, 0.0)
            && !changed(adj.hue, 0.0)
            && !changed(adj.gamma, 1.0)
    }
}

fn clamp_or(value: f32, min: f32, max: f32, neutral: f32) -> f32 {
    if value.is_nan() {
        neutral
    } else {
        value.clamp(min, max)
    }
}

fn changed(value: f32, neutral: f32) -> bool {
    (value - neutral).abs() > EPSILON
}

/// Apply `adjustment`: the colour operations first, gamma last.
pub fn apply_tone(image: DynamicImage, adjustment: &ToneAdjustment) -> DynamicImage {
    let adj = adjustment.clamped();
    let mut image = image;

    if changed(adj.brightness, 0.0) {
        log::debug!("brightness {}", adj.brightness);
        image = image.brighten((adj.brightness * 2.55).round() as i32);
    }
    if changed(adj.contrast, 0.0) {
        log::debug!("contrast {}", adj.contrast);
        image = image.adjust_contrast(adj.contrast);
    }
    if changed(adj.saturation, 0.0) {
        log::debug!("saturation {}", adj.saturation);
        image = apply_saturation(image, adj.saturation);
    }
    if changed(adj.hue, 0.0) {
        log::debug!("hue {}", adj.hue);
        image = image.huerotate(adj.hue.round() as i32);
    }
    if changed(adj.gamma, 1.0) {
        log::debug!("gamma {}", adj.gamma);
        image = apply_gamma(image, adj.gamma);
    }

    image
}

/// `value^(1/gamma)` for a normalized channel value.
pub fn gamma_curve(value: f32, gamma: f32) -> f32 {
    value.clamp(0.0, 1.0).powf(1.0 / gamma)
}

pub fn apply_gamma(image: DynamicImage, gamma: f32) -> DynamicImage {
    let gamma = clamp_or(gamma, GAMMA_RANGE.0, GAMMA_RANGE.1, 1.0);
    map_rgb(image, |[r, g, b]| {
        [gamma_curve(r, gamma), gamma_curve(g, gamma), gamma_curve(b, gamma)]
    })
}

/// Blend each pixel toward (or away from) its Rec.601 luma.
pub fn apply_saturation(image: DynamicImage, saturation: f32) -> DynamicImage {
    let factor = 1.0 + saturation.clamp(-100.0, 100.0) / 100.0;
    map_rgb(image, |[r, g, b]| {
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        [
            luma + (r - luma) * factor,
            luma + (g - luma) * factor,
            luma + (b - luma) * factor,
        ]
    })
}

/// Single pass over every pixel in normalized RGB, alpha untouched.
fn map_rgb(image: DynamicImage, f: impl Fn([f32; 3]) -> [f32; 3]) -> DynamicImage {
    let has_alpha = image.color().has_alpha();
    let mut buf: Rgba32FImage = image.into_rgba32f();

    for pixel in buf.pixels_mut() {
        let [r, g, b] = f([pixel[0], pixel[1], pixel[2]]);
        pixel[0] = r.clamp(0.0, 1.0);
        pixel[1] = g.clamp(0.0, 1.0);
        pixel[2] = b.clamp(0.0, 1.0);
    }

    let out = DynamicImage::ImageRgba32F(buf);
    if has_alpha {
        DynamicImage::ImageRgba8(out.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(out.to_rgb8())
    }
}
