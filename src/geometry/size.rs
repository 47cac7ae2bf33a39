//! Output size resolution for resize requests.
//!
//! Rounding follows two rules:
//! - When both axes are scaled by one common factor (keep-aspect-ratio with a
//!   bounding box, crop-fill), each product is rounded to nearest with `.5`
//!   going up.
//! - When only one target is given under keep-aspect-ratio, the other axis is
//!   derived with integer arithmetic (`orig_missing * given / orig_given`),
//!   so `300x200` at width 100 is `100x66`.

use super::{Dimensions, GeometryError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeMode {
    /// Fit inside the target box, preserving aspect ratio.
    #[default]
    KeepAspectRatio,
    /// Use the targets as given; an omitted axis keeps its original size.
    Stretch,
    /// Cover the target box; the caller crops the overflow afterwards.
    Crop,
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResizeMode::KeepAspectRatio => "keep-aspect-ratio",
            ResizeMode::Stretch => "stretch",
            ResizeMode::Crop => "crop",
        };
        f.write_str(name)
    }
}

impl FromStr for ResizeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep-aspect-ratio" | "keepaspectratio" | "keep" | "fit" => {
                Ok(ResizeMode::KeepAspectRatio)
            }
            "stretch" | "exact" => Ok(ResizeMode::Stretch),
            "crop" | "fill" => Ok(ResizeMode::Crop),
            other => Err(format!("unknown resize mode: {other}")),
        }
    }
}

/// Resolve the output size of a resize.
///
/// # Examples
/// ```
/// # use imgbatch::geometry::{resolve_size, ResizeMode};
/// let d = resolve_size(400, 200, Some(100), None, ResizeMode::KeepAspectRatio).unwrap();
/// assert_eq!((d.width, d.height), (100, 50));
/// ```
pub fn resolve_size(
    orig_w: u32,
    orig_h: u32,
    target_w: Option<u32>,
    target_h: Option<u32>,
    mode: ResizeMode,
) -> Result<Dimensions, GeometryError> {
    let original = Dimensions::new(orig_w, orig_h)?;
    if target_w == Some(0) || target_h == Some(0) {
        return Err(GeometryError::ZeroDimension {
            width: target_w.unwrap_or(orig_w),
            height: target_h.unwrap_or(orig_h),
        });
    }

    match mode {
        ResizeMode::Stretch => Dimensions::new(
            target_w.unwrap_or(orig_w),
            target_h.unwrap_or(orig_h),
        ),
        ResizeMode::KeepAspectRatio => match (target_w, target_h) {
            (None, None) => Ok(original),
            (Some(w), Some(h)) => {
                let scale = (w as f64 / orig_w as f64).min(h as f64 / orig_h as f64);
                let (new_w, new_h) = scale_both(orig_w, orig_h, scale);
                // Float noise must never push the result past the box.
                Dimensions::new(new_w.min(w), new_h.min(h))
            }
            (Some(w), None) => Dimensions::new(w, derive_axis(orig_h, w, orig_w)),
            (None, Some(h)) => Dimensions::new(derive_axis(orig_w, h, orig_h), h),
        },
        ResizeMode::Crop => {
            let (Some(w), Some(h)) = (target_w, target_h) else {
                return Err(GeometryError::MissingTarget(mode));
            };
            let scale = (w as f64 / orig_w as f64).max(h as f64 / orig_h as f64);
            let (new_w, new_h) = scale_both(orig_w, orig_h, scale);
            // Covering the box is the whole point of crop mode.
            Dimensions::new(new_w.max(w), new_h.max(h))
        }
    }
}

fn scale_both(orig_w: u32, orig_h: u32, scale: f64) -> (u32, u32) {
    let w = (orig_w as f64 * scale).round().max(1.0) as u32;
    let h = (orig_h as f64 * scale).round().max(1.0) as u32;
    (w, h)
}

fn derive_axis(orig_missing: u32, given: u32, orig_given: u32) -> u32 {
    let derived = orig_missing as u64 * given as u64 / orig_given as u64;
    derived.clamp(1, u32::MAX as u64) as u32
}
