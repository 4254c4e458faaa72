//! Per-frame pixel transforms for the gifbooth capture pipeline.
//!
//! Every effect is a small configuration struct implementing [`Effect`]. The
//! configuration carries the tunable constants, so a transform never reads
//! ambient state and two calls with the same config and input agree (except
//! for the randomised effects in [`noise_effect`] and [`sketch_effect::EinkConfig`]).
//!
//! [`EffectId`] names the fixed catalog and [`EffectSettings`] maps each id to
//! its configured transform.

pub mod catalog;
pub mod glyph_atlas;
pub mod glyph_effect;
pub mod monochrome_effect;
pub mod noise_effect;
pub mod sketch_effect;
pub mod stylized_effect;

pub use catalog::{EffectId, EffectSettings};
pub use image::{Rgba, RgbaImage};

/// 8-bit RGBA raster. `image::ImageBuffer` keeps `len == width * height * 4`.
pub type RasterBuffer = RgbaImage;

pub type ImageEffectResult<T> = Result<T, ImageEffectError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageEffectError {
    #[error("Unknown effect: {0}")]
    UnknownEffect(String),

    #[error("Invalid effect id: {0}")]
    InvalidEffectId(u8),
}

/// A transform that rewrites a raster in place.
///
/// Implementations must not fail: out-of-range math is clamped internally so a
/// single odd frame can never abort a run.
pub trait Effect {
    fn apply(&self, image: &mut RgbaImage);
}

/// Mean of the colour channels, in `[0, 255]`.
pub(crate) fn brightness(pixel: &Rgba<u8>) -> f32 {
    (pixel[0] as u32 + pixel[1] as u32 + pixel[2] as u32) as f32 / 3.0
}

/// Maps a brightness onto `0..len` with `floor(b / 255 * (len - 1))`.
pub(crate) fn ramp_index(brightness: f32, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }

    let index = ((brightness / 255.0) * (len - 1) as f32).floor();
    (index.max(0.0) as usize).min(len - 1)
}
