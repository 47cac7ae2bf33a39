//! Watermark placement.
//!
//! Coordinates are not clamped: content larger than its container yields
//! negative offsets, which the overlay step simply clips.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_MARGIN: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorPosition {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    Center,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Horizontal {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vertical {
    Top,
    Middle,
    Bottom,
}

impl AnchorPosition {
    pub const ALL: [AnchorPosition; 9] = [
        AnchorPosition::TopLeft,
        AnchorPosition::TopCenter,
        AnchorPosition::TopRight,
        AnchorPosition::MiddleLeft,
        AnchorPosition::Center,
        AnchorPosition::MiddleRight,
        AnchorPosition::BottomLeft,
        AnchorPosition::BottomCenter,
        AnchorPosition::BottomRight,
    ];

    fn axes(self) -> (Vertical, Horizontal) {
        use AnchorPosition::*;
        match self {
            TopLeft => (Vertical::Top, Horizontal::Left),
            TopCenter => (Vertical::Top, Horizontal::Center),
            TopRight => (Vertical::Top, Horizontal::Right),
            MiddleLeft => (Vertical::Middle, Horizontal::Left),
            Center => (Vertical::Middle, Horizontal::Center),
            MiddleRight => (Vertical::Middle, Horizontal::Right),
            BottomLeft => (Vertical::Bottom, Horizontal::Left),
            BottomCenter => (Vertical::Bottom, Horizontal::Center),
            BottomRight => (Vertical::Bottom, Horizontal::Right),
        }
    }
}

impl FromStr for AnchorPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        use AnchorPosition::*;
        match key.as_str() {
            "topleft" => Ok(TopLeft),
            "topcenter" => Ok(TopCenter),
            "topright" => Ok(TopRight),
            "middleleft" => Ok(MiddleLeft),
            "center" | "middlecenter" => Ok(Center),
            "middleright" => Ok(MiddleRight),
            "bottomleft" => Ok(BottomLeft),
            "bottomcenter" => Ok(BottomCenter),
            "bottomright" => Ok(BottomRight),
            _ => Err(format!("unknown anchor position: {s}")),
        }
    }
}

/// Top-left coordinate for `content` placed inside `container` at `anchor`.
///
/// # Examples
/// ```
/// # use imgbatch::geometry::{place, AnchorPosition};
/// assert_eq!(place(200, 200, 50, 50, AnchorPosition::BottomRight, 20), (130, 130));
/// ```
pub fn place(
    container_w: u32,
    container_h: u32,
    content_w: u32,
    content_h: u32,
    anchor: AnchorPosition,
    margin: u32,
) -> (i64, i64) {
    let (vertical, horizontal) = anchor.axes();
    let (cw, ch) = (container_w as i64, container_h as i64);
    let (w, h) = (content_w as i64, content_h as i64);
    let margin = margin as i64;

    let x = match horizontal {
        Horizontal::Left => margin,
        Horizontal::Center => (cw - w) / 2,
        Horizontal::Right => cw - w - margin,
    };
    let y = match vertical {
        Vertical::Top => margin,
        Vertical::Middle => (ch - h) / 2,
        Vertical::Bottom => ch - h - margin,
    };

    (x, y)
}
