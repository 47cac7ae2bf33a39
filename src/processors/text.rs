// imgbatch/src/processors/text.rs
use crate::core::{ImageToolError, Result};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Glyphs are 8x8 cells scaled by an integer factor.
const GLYPH_CELL: u32 = 8;

pub const FONT_SIZE_RANGE: (u32, u32) = (8, 512);

/// Renders text with the built-in 8x8 bitmap font.
#[derive(Debug, Clone, Copy)]
pub struct TextRenderer {
    scale: u32,
}

impl TextRenderer {
    /// `font_size` is the glyph height in pixels, rounded down to a multiple of 8.
    pub fn new(font_size: u32) -> Self {
        let font_size = font_size.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1);
        Self {
            scale: (font_size / GLYPH_CELL).max(1),
        }
    }

    /// Bounding box of `text`, one scaled pixel of spacing between glyphs.
    pub fn measure(&self, text: &str) -> Result<(u32, u32)> {
        let count = text.chars().count() as u32;
        if count == 0 {
            return Err(ImageToolError::InvalidParameter(
                "Watermark text cannot be empty".to_string(),
            ));
        }
        let glyph = GLYPH_CELL * self.scale;
        Ok((count * glyph + (count - 1) * self.scale, glyph))
    }

    pub fn render(&self, text: &str, color: Rgba<u8>) -> Result<RgbaImage> {
        let (width, height) = self.measure(text)?;
        let mut canvas = RgbaImage::new(width, height);
        let advance = (GLYPH_CELL + 1) * self.scale;

        for (idx, ch) in text.chars().enumerate() {
            let glyph = BASIC_FONTS
                .get(ch)
                .or_else(|| BASIC_FONTS.get('?'))
                .unwrap_or([0; 8]);
            let origin_x = idx as u32 * advance;

            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_CELL {
                    if (bits >> col) & 1 == 0 {
                        continue;
                    }
                    let x = origin_x + col * self.scale;
                    let y = row as u32 * self.scale;
                    draw_filled_rect_mut(
                        &mut canvas,
                        Rect::at(x as i32, y as i32).of_size(self.scale, self.scale),
                        color,
                    );
                }
            }
        }

        Ok(canvas)
    }
}

/// `#rgb`, `#rrggbb` or `#rrggbbaa`, leading `#` optional.
pub fn parse_hex_color(input: &str) -> Result<Rgba<u8>> {
    let hex = input.trim().trim_start_matches('#');
    let invalid = || ImageToolError::InvalidParameter(format!("Invalid color: {}", input));
    let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16).ok_or_else(invalid)? as u8;
                rgb[i] = v * 17;
            }
            Ok(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        6 | 8 if hex.is_ascii() => {
            let a = if hex.len() == 8 { byte(&hex[6..8])? } else { 255 };
            Ok(Rgba([byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, a]))
        }
        _ => Err(invalid()),
    }
}
