//! Crop rectangle resolution.
//!
//! Absolute and percentage crops are a strict contract: anything that does not
//! fit the source is rejected, never clamped. Centered crops are best effort:
//! an oversized request shrinks to the source and stays centered.

use super::GeometryError;
use serde::{Deserialize, Serialize};

/// A requested sub-region, before it is checked against a source image.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum CropIntent {
    Absolute {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    },
    /// All fields are percentages of the source size.
    Percent {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Centered {
        width: u32,
        height: u32,
    },
}

/// A pixel rectangle guaranteed to lie inside the source it was resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRectangle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRectangle {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

pub fn resolve_crop(
    source_w: u32,
    source_h: u32,
    intent: CropIntent,
) -> Result<CropRectangle, GeometryError> {
    if source_w == 0 || source_h == 0 {
        return Err(GeometryError::ZeroDimension {
            width: source_w,
            height: source_h,
        });
    }

    match intent {
        CropIntent::Absolute {
            x,
            y,
            width,
            height,
        } => checked_rect(source_w, source_h, x, y, width, height),
        CropIntent::Percent {
            x,
            y,
            width,
            height,
        } => {
            check_percent("x", x, false)?;
            check_percent("y", y, false)?;
            check_percent("width", width, true)?;
            check_percent("height", height, true)?;
            if x + width > 100.0 {
                return Err(GeometryError::PercentOverflow {
                    axis: "horizontal",
                    total: x + width,
                });
            }
            if y + height > 100.0 {
                return Err(GeometryError::PercentOverflow {
                    axis: "vertical",
                    total: y + height,
                });
            }

            checked_rect(
                source_w,
                source_h,
                percent_of(source_w, x),
                percent_of(source_h, y),
                percent_of(source_w, width),
                percent_of(source_h, height),
            )
        }
        CropIntent::Centered { width, height } => {
            let x = source_w.saturating_sub(width) / 2;
            let y = source_h.saturating_sub(height) / 2;
            checked_rect(
                source_w,
                source_h,
                x as i64,
                y as i64,
                width.min(source_w) as i64,
                height.min(source_h) as i64,
            )
        }
    }
}

fn check_percent(name: &'static str, value: f64, size: bool) -> Result<(), GeometryError> {
    let in_range = value.is_finite() && (0.0..=100.0).contains(&value);
    if !in_range || (size && value <= 0.0) {
        return Err(GeometryError::PercentOutOfRange { name, value });
    }
    Ok(())
}

fn percent_of(source: u32, pct: f64) -> i64 {
    (source as f64 * pct / 100.0).floor() as i64
}

/// The single boundary check every intent passes through.
fn checked_rect(
    source_w: u32,
    source_h: u32,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
) -> Result<CropRectangle, GeometryError> {
    if x < 0 || y < 0 {
        return Err(GeometryError::NegativeOrigin { x, y });
    }
    if width <= 0 || height <= 0 {
        return Err(GeometryError::NonPositiveSize { width, height });
    }
    if x >= source_w as i64 || y >= source_h as i64 {
        return Err(GeometryError::StartOutside {
            x,
            y,
            source_width: source_w,
            source_height: source_h,
        });
    }
    if x + width > source_w as i64 || y + height > source_h as i64 {
        return Err(GeometryError::ExceedsBounds {
            x,
            y,
            width,
            height,
            source_width: source_w,
            source_height: source_h,
        });
    }

    Ok(CropRectangle {
        x: x as u32,
        y: y as u32,
        width: width as u32,
        height: height as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn absolute(x: i64, y: i64, width: i64, height: i64) -> CropIntent {
        CropIntent::Absolute {
            x,
            y,
            width,
            height,
        }
    }

    fn percent(x: f64, y: f64, width: f64, height: f64) -> CropIntent {
        CropIntent::Percent {
            x,
            y,
            width,
            height,
        }
    }

    fn rect(x: u32, y: u32, width: u32, height: u32) -> CropRectangle {
        CropRectangle {
            x,
            y,
            width,
            height,
        }
    }

    // =========================================================================
    // absolute
    // =========================================================================

    #[test]
    fn absolute_inside_bounds() {
        assert_eq!(resolve_crop(100, 100, absolute(10, 20, 30, 40)), Ok(rect(10, 20, 30, 40)));
        assert_eq!(resolve_crop(100, 100, absolute(0, 0, 100, 100)), Ok(rect(0, 0, 100, 100)));
    }

    #[test]
    fn absolute_overflow_is_rejected_not_clamped() {
        let err = resolve_crop(100, 100, absolute(50, 50, 100, 100)).unwrap_err();
        assert!(matches!(err, GeometryError::ExceedsBounds { .. }));
    }

    #[test]
    fn absolute_negative_origin_is_rejected() {
        assert!(matches!(
            resolve_crop(100, 100, absolute(-1, 0, 10, 10)),
            Err(GeometryError::NegativeOrigin { .. })
        ));
    }

    #[test]
    fn absolute_empty_size_is_rejected() {
        assert!(matches!(
            resolve_crop(100, 100, absolute(0, 0, 0, 10)),
            Err(GeometryError::NonPositiveSize { .. })
        ));
    }

    #[test]
    fn absolute_start_outside_is_rejected() {
        assert!(matches!(
            resolve_crop(100, 100, absolute(100, 0, 1, 1)),
            Err(GeometryError::StartOutside { .. })
        ));
        assert!(matches!(
            resolve_crop(100, 100, absolute(0, 150, 1, 1)),
            Err(GeometryError::StartOutside { .. })
        ));
    }

    // =========================================================================
    // percent
    // =========================================================================

    #[test]
    fn percent_matches_equivalent_absolute() {
        assert_eq!(
            resolve_crop(200, 200, percent(25.0, 25.0, 50.0, 50.0)),
            resolve_crop(200, 200, absolute(50, 50, 100, 100))
        );
    }

    #[test]
    fn percent_floors_pixel_values() {
        // 33% of 10 = 3.3 -> 3
        assert_eq!(resolve_crop(10, 10, percent(33.0, 0.0, 33.0, 100.0)), Ok(rect(3, 0, 3, 10)));
    }

    #[test]
    fn percent_out_of_range_is_rejected() {
        assert!(matches!(
            resolve_crop(100, 100, percent(-5.0, 0.0, 50.0, 50.0)),
            Err(GeometryError::PercentOutOfRange { name: "x", .. })
        ));
        assert!(matches!(
            resolve_crop(100, 100, percent(0.0, 0.0, 0.0, 50.0)),
            Err(GeometryError::PercentOutOfRange { name: "width", .. })
        ));
        assert!(resolve_crop(100, 100, percent(0.0, 0.0, f64::NAN, 50.0)).is_err());
    }

    #[test]
    fn percent_sum_over_hundred_is_rejected() {
        assert!(matches!(
            resolve_crop(100, 100, percent(60.0, 0.0, 50.0, 50.0)),
            Err(GeometryError::PercentOverflow { axis: "horizontal", .. })
        ));
        assert!(matches!(
            resolve_crop(100, 100, percent(0.0, 51.0, 50.0, 50.0)),
            Err(GeometryError::PercentOverflow { axis: "vertical", .. })
        ));
    }

    #[test]
    fn percent_too_small_for_a_pixel_is_rejected() {
        // 1% of 10px floors to zero width
        assert!(resolve_crop(10, 10, percent(0.0, 0.0, 1.0, 50.0)).is_err());
    }

    // =========================================================================
    // centered
    // =========================================================================

    #[test]
    fn centered_inside_source() {
        assert_eq!(
            resolve_crop(100, 80, CropIntent::Centered { width: 50, height: 40 }),
            Ok(rect(25, 20, 50, 40))
        );
    }

    #[test]
    fn centered_truncates_odd_offsets() {
        assert_eq!(
            resolve_crop(101, 101, CropIntent::Centered { width: 50, height: 50 }),
            Ok(rect(25, 25, 50, 50))
        );
    }

    #[test]
    fn centered_oversize_covers_whole_source() {
        assert_eq!(
            resolve_crop(100, 100, CropIntent::Centered { width: 200, height: 200 }),
            Ok(rect(0, 0, 100, 100))
        );
    }

    #[test]
    fn centered_oversize_on_one_axis() {
        assert_eq!(
            resolve_crop(100, 60, CropIntent::Centered { width: 40, height: 500 }),
            Ok(rect(30, 0, 40, 60))
        );
    }

    // =========================================================================
    // invariant
    // =========================================================================

    #[test]
    fn resolved_rectangles_always_fit() {
        let intents = [
            absolute(0, 0, 1, 1),
            absolute(10, 10, 20, 5),
            percent(0.0, 0.0, 100.0, 100.0),
            percent(12.5, 40.0, 87.5, 60.0),
            CropIntent::Centered { width: 3, height: 999 },
            CropIntent::Centered { width: 999, height: 999 },
        ];
        for (w, h) in [(31, 17), (640, 480), (1, 1), (1000, 3)] {
            for intent in intents {
                if let Ok(r) = resolve_crop(w, h, intent) {
                    assert!(r.right() <= w && r.bottom() <= h, "{intent:?} on {w}x{h} gave {r:?}");
                    assert!(r.width > 0 && r.height > 0);
                }
            }
        }
    }

    #[test]
    fn intent_deserializes_from_tagged_json() {
        let intent: CropIntent =
            serde_json::from_str(r#"{"mode":"centered","width":10,"height":20}"#).unwrap();
        assert_eq!(intent, CropIntent::Centered { width: 10, height: 20 });
    }
}
