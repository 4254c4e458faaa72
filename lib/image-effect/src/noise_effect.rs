//! Randomised effects. Each exposes `apply_with_rng` so callers and tests can
//! supply a seeded generator; [`Effect::apply`] draws from the thread rng.

use crate::{Effect, brightness};
use derivative::Derivative;
use derive_setters::Setters;
use image::{Rgba, RgbaImage};
use rand::Rng;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Random dot rendering: a pixel survives as an opaque dot with probability
/// `brightness / 255 * density`, otherwise it becomes fully transparent.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct StippleConfig {
    #[derivative(Default(value = "0.5"))]
    pub density: f32,
}

impl StippleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_with_rng<R: Rng + ?Sized>(&self, image: &mut RgbaImage, rng: &mut R) {
        let density = self.density.max(0.0);

        for pixel in image.pixels_mut() {
            let chance = brightness(pixel) / 255.0 * density;

            if rng.random::<f32>() < chance {
                pixel[3] = 255;
            } else {
                *pixel = TRANSPARENT;
            }
        }
    }
}

impl Effect for StippleConfig {
    fn apply(&self, image: &mut RgbaImage) {
        self.apply_with_rng(image, &mut rand::rng());
    }
}

/// Horizontal channel tearing: with probability `probability` a pixel copies
/// its red and green from the pixel `shift` positions further along the
/// row-major buffer. Blue and alpha are untouched.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct GlitchConfig {
    #[derivative(Default(value = "5"))]
    pub shift: u32,

    #[derivative(Default(value = "0.05"))]
    pub probability: f32,
}

impl GlitchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_with_rng<R: Rng + ?Sized>(&self, image: &mut RgbaImage, rng: &mut R) {
        let offset = self.shift as usize * 4;
        let samples: &mut [u8] = image;
        let len = samples.len();

        for i in (0..len).step_by(4) {
            if rng.random::<f32>() >= self.probability {
                continue;
            }

            // source pixel wraps onto the next row and is skipped past the end
            if i + offset + 1 < len {
                samples[i] = samples[i + offset];
                samples[i + 1] = samples[i + offset + 1];
            }
        }
    }
}

impl Effect for GlitchConfig {
    fn apply(&self, image: &mut RgbaImage) {
        self.apply_with_rng(image, &mut rand::rng());
    }
}
