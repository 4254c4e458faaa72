//! Character-cell effects: the raster is divided into `stride` sized cells and
//! each cell is replaced by a glyph chosen from a brightness ramp.

use crate::{
    Effect, brightness,
    glyph_atlas::{GLYPH_SIZE, GlyphRows, ascii_glyph, density_glyph, emoji_sprite, glyph_bit},
    ramp_index,
};
use derivative::Derivative;
use derive_setters::Setters;
use image::{Rgba, RgbaImage};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct AsciiConfig {
    /// Darkest first.
    #[derivative(Default(value = r#""@#%*+=- .".to_string()"#))]
    pub ramp: String,

    #[derivative(Default(value = "8"))]
    pub stride: u32,

    #[derivative(Default(value = "BLACK"))]
    pub foreground: Rgba<u8>,

    #[derivative(Default(value = "WHITE"))]
    pub background: Rgba<u8>,
}

impl AsciiConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for AsciiConfig {
    fn apply(&self, image: &mut RgbaImage) {
        let ramp: Vec<char> = self.ramp.chars().collect();
        if ramp.is_empty() {
            log::warn!("ascii effect has an empty ramp, frame left unchanged");
            return;
        }

        draw_cells(image, self.stride, self.background, ramp.len(), |index| {
            let ch = ramp[index];
            if ch.is_whitespace() {
                return None;
            }

            let rows = ascii_glyph(ch)
                .copied()
                .unwrap_or_else(|| density_glyph(index, ramp.len()));
            Some((rows, self.foreground))
        });
    }
}

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct EmojiConfig {
    #[derivative(Default(value = r#""✅🥕😂💀🎉🚀 🫶".to_string()"#))]
    pub ramp: String,

    #[derivative(Default(value = "8"))]
    pub stride: u32,

    #[derivative(Default(value = "WHITE"))]
    pub background: Rgba<u8>,
}

impl EmojiConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for EmojiConfig {
    fn apply(&self, image: &mut RgbaImage) {
        let ramp: Vec<char> = self.ramp.chars().collect();
        if ramp.is_empty() {
            log::warn!("emoji effect has an empty ramp, frame left unchanged");
            return;
        }

        draw_cells(image, self.stride, self.background, ramp.len(), |index| {
            emoji_sprite(ramp[index]).map(|sprite| (sprite.rows, sprite.color))
        });
    }
}

/// Walks the cell grid. For each cell the top-left pixel is sampled, the cell
/// is cleared to `background`, and the glyph returned by `pick` for the ramp
/// slot is drawn scaled to the cell. Partial cells at the right and bottom
/// edges are clipped.
fn draw_cells<F>(image: &mut RgbaImage, stride: u32, background: Rgba<u8>, ramp_len: usize, pick: F)
where
    F: Fn(usize) -> Option<(GlyphRows, Rgba<u8>)>,
{
    let stride = stride.max(1);
    let (width, height) = image.dimensions();

    for cy in (0..height).step_by(stride as usize) {
        for cx in (0..width).step_by(stride as usize) {
            let index = ramp_index(brightness(image.get_pixel(cx, cy)), ramp_len);
            let glyph = pick(index);

            for y in cy..(cy + stride).min(height) {
                for x in cx..(cx + stride).min(width) {
                    let inked = glyph.as_ref().is_some_and(|(rows, _)| {
                        let gx = (x - cx) * GLYPH_SIZE / stride;
                        let gy = (y - cy) * GLYPH_SIZE / stride;
                        glyph_bit(rows, gx, gy)
                    });

                    let color = match (&glyph, inked) {
                        (Some((_, ink)), true) => *ink,
                        _ => background,
                    };
                    image.put_pixel(x, y, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_black_cell_draws_at_sign() {
        let mut image = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        AsciiConfig::new().apply(&mut image);

        let at = ascii_glyph('@').unwrap();
        for (x, y, pixel) in image.enumerate_pixels() {
            let expected = if glyph_bit(at, x, y) { BLACK } else { WHITE };
            assert_eq!(*pixel, expected, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_ascii_white_input_draws_dots() {
        // brightest slot of the default ramp is the dot
        let mut image = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255]));
        AsciiConfig::new().apply(&mut image);

        let dot = ascii_glyph('.').unwrap();
        for (x, y, pixel) in image.enumerate_pixels() {
            let expected = if glyph_bit(dot, x % 8, y % 8) { BLACK } else { WHITE };
            assert_eq!(*pixel, expected);
        }
    }

    #[test]
    fn test_ascii_whitespace_slot_clears_cell() {
        let mut image = RgbaImage::from_pixel(10, 10, Rgba([9, 9, 9, 255]));
        AsciiConfig::new().with_ramp(" ".to_string()).apply(&mut image);
        assert!(image.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_ascii_clips_partial_cells() {
        let mut image = RgbaImage::from_pixel(13, 5, Rgba([0, 0, 0, 255]));
        AsciiConfig::new().apply(&mut image);
        assert_eq!(image.dimensions(), (13, 5));
        assert!(image.pixels().all(|p| *p == BLACK || *p == WHITE));
    }

    #[test]
    fn test_ascii_scales_glyph_to_stride() {
        let mut image = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        AsciiConfig::new().with_stride(16).apply(&mut image);

        let at = ascii_glyph('@').unwrap();
        for (x, y, pixel) in image.enumerate_pixels() {
            let expected = if glyph_bit(at, x / 2, y / 2) { BLACK } else { WHITE };
            assert_eq!(*pixel, expected);
        }
    }

    #[test]
    fn test_emoji_uses_sprite_colour() {
        let mut image = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        EmojiConfig::new().apply(&mut image);

        let check = emoji_sprite('✅').unwrap();
        for (x, y, pixel) in image.enumerate_pixels() {
            let expected = if glyph_bit(&check.rows, x, y) {
                check.color
            } else {
                WHITE
            };
            assert_eq!(*pixel, expected);
        }
    }

    #[test]
    fn test_emoji_blank_slot() {
        // 8 slots: brightness 219 maps to slot 6, the space
        let mut image = RgbaImage::from_pixel(8, 8, Rgba([219, 219, 219, 255]));
        EmojiConfig::new().apply(&mut image);
        assert!(image.pixels().all(|p| *p == WHITE));
    }
}
