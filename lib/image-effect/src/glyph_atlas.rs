//! Built-in 8x8 bitmap glyphs used by the character-cell effects.
//!
//! Each glyph is eight row bytes, most significant bit on the left. There is
//! no font rasteriser in the pipeline, so characters outside the atlas fall
//! back to an ordered-dither block whose coverage follows its ramp position.

use image::Rgba;

pub const GLYPH_SIZE: u32 = 8;

pub type GlyphRows = [u8; 8];

pub fn glyph_bit(rows: &GlyphRows, x: u32, y: u32) -> bool {
    if x >= GLYPH_SIZE || y >= GLYPH_SIZE {
        return false;
    }

    rows[y as usize] & (0x80 >> x) != 0
}

const AT: GlyphRows = [0x3C, 0x42, 0x99, 0xA5, 0xA5, 0x9E, 0x40, 0x3C];
const HASH: GlyphRows = [0x24, 0x24, 0x7E, 0x24, 0x7E, 0x24, 0x24, 0x00];
const PERCENT: GlyphRows = [0x62, 0x64, 0x08, 0x10, 0x26, 0x46, 0x00, 0x00];
const STAR: GlyphRows = [0x00, 0x54, 0x38, 0x7C, 0x38, 0x54, 0x00, 0x00];
const PLUS: GlyphRows = [0x00, 0x10, 0x10, 0x7C, 0x10, 0x10, 0x00, 0x00];
const EQUALS: GlyphRows = [0x00, 0x00, 0x7C, 0x00, 0x7C, 0x00, 0x00, 0x00];
const MINUS: GlyphRows = [0x00, 0x00, 0x00, 0x7C, 0x00, 0x00, 0x00, 0x00];
const DOT: GlyphRows = [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x00];
const BLANK: GlyphRows = [0x00; 8];

pub fn ascii_glyph(ch: char) -> Option<&'static GlyphRows> {
    match ch {
        '@' => Some(&AT),
        '#' => Some(&HASH),
        '%' => Some(&PERCENT),
        '*' => Some(&STAR),
        '+' => Some(&PLUS),
        '=' => Some(&EQUALS),
        '-' => Some(&MINUS),
        '.' => Some(&DOT),
        ' ' => Some(&BLANK),
        _ => None,
    }
}

const BAYER_4X4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Dither block for ramp slot `index` of `len`: slot 0 is fully inked, the
/// last slot is empty.
pub fn density_glyph(index: usize, len: usize) -> GlyphRows {
    let coverage = if len <= 1 {
        1.0
    } else {
        1.0 - index.min(len - 1) as f32 / (len - 1) as f32
    };
    let lit = (coverage * 16.0).round() as u8;

    let mut rows = [0u8; 8];
    for (y, row) in rows.iter_mut().enumerate() {
        for x in 0..8 {
            if BAYER_4X4[y % 4][x % 4] < lit {
                *row |= 0x80 >> x;
            }
        }
    }
    rows
}

/// A single-colour emoji stand-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmojiSprite {
    pub color: Rgba<u8>,
    pub rows: GlyphRows,
}

const fn sprite(r: u8, g: u8, b: u8, rows: GlyphRows) -> EmojiSprite {
    EmojiSprite {
        color: Rgba([r, g, b, 255]),
        rows,
    }
}

const CHECK_MARK: EmojiSprite = sprite(0x2E, 0xB8, 0x4B, [0x00, 0x01, 0x03, 0x86, 0xCC, 0x78, 0x30, 0x00]);
const CARROT: EmojiSprite = sprite(0xF4, 0x90, 0x0C, [0x02, 0x06, 0x0E, 0x1C, 0x38, 0x70, 0xC0, 0x00]);
const TEARS_OF_JOY: EmojiSprite = sprite(0xFF, 0xCC, 0x4D, [0x3C, 0x7E, 0xDB, 0xFF, 0x81, 0xC3, 0x7E, 0x3C]);
const SKULL: EmojiSprite = sprite(0xCC, 0xD6, 0xDD, [0x7E, 0xFF, 0x99, 0x99, 0xFF, 0x7E, 0x54, 0x54]);
const PARTY_POPPER: EmojiSprite = sprite(0xDD, 0x2E, 0x44, [0xA2, 0x14, 0x41, 0x0C, 0x1C, 0x3C, 0x7C, 0xFC]);
const ROCKET: EmojiSprite = sprite(0x8C, 0x9E, 0xB4, [0x03, 0x07, 0x0E, 0x5C, 0x38, 0x70, 0xD0, 0x80]);
const HEART_HANDS: EmojiSprite = sprite(0xF4, 0xAB, 0xBA, [0x00, 0x66, 0xFF, 0xFF, 0x7E, 0x3C, 0x18, 0x00]);
const UNKNOWN_EMOJI: EmojiSprite = sprite(0x99, 0x99, 0x99, [0x3C, 0x7E, 0xFF, 0xFF, 0xFF, 0xFF, 0x7E, 0x3C]);

/// Sprite for `ch`, or `None` for whitespace. Unknown symbols render as a
/// gray disc.
pub fn emoji_sprite(ch: char) -> Option<EmojiSprite> {
    if ch.is_whitespace() {
        return None;
    }

    Some(match ch {
        '✅' => CHECK_MARK,
        '🥕' => CARROT,
        '😂' => TEARS_OF_JOY,
        '💀' => SKULL,
        '🎉' => PARTY_POPPER,
        '🚀' => ROCKET,
        '🫶' => HEART_HANDS,
        _ => UNKNOWN_EMOJI,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage(rows: &GlyphRows) -> u32 {
        rows.iter().map(|r| r.count_ones()).sum()
    }

    #[test]
    fn test_ascii_ramp_is_complete() {
        for ch in "@#%*+=- .".chars() {
            assert!(ascii_glyph(ch).is_some(), "missing glyph for {ch:?}");
        }
        assert!(ascii_glyph('Z').is_none());
        assert_eq!(coverage(ascii_glyph(' ').unwrap()), 0);
    }

    #[test]
    fn test_glyph_bit_reads_msb_first() {
        let rows = [0x80, 0x01, 0, 0, 0, 0, 0, 0];
        assert!(glyph_bit(&rows, 0, 0));
        assert!(!glyph_bit(&rows, 1, 0));
        assert!(glyph_bit(&rows, 7, 1));
        assert!(!glyph_bit(&rows, 8, 0));
    }

    #[test]
    fn test_density_glyph_coverage_decreases() {
        let full = density_glyph(0, 5);
        let half = density_glyph(2, 5);
        let empty = density_glyph(4, 5);

        assert_eq!(coverage(&full), 64);
        assert_eq!(coverage(&half), 32);
        assert_eq!(coverage(&empty), 0);
    }

    #[test]
    fn test_emoji_lookup() {
        assert_eq!(emoji_sprite('🥕'), Some(CARROT));
        assert_eq!(emoji_sprite('X'), Some(UNKNOWN_EMOJI));
        assert_eq!(emoji_sprite(' '), None);
    }
}
