use crate::Effect;
use derivative::Derivative;
use derive_setters::Setters;
use image::RgbaImage;

/// Block mosaic: each `block_size` square takes the colour of its top-left pixel.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct PixelateConfig {
    #[derivative(Default(value = "10"))]
    pub block_size: u32,
}

impl PixelateConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for PixelateConfig {
    fn apply(&self, image: &mut RgbaImage) {
        let block = self.block_size.max(1);
        let (width, height) = image.dimensions();

        for by in (0..height).step_by(block as usize) {
            for bx in (0..width).step_by(block as usize) {
                let color = *image.get_pixel(bx, by);

                for y in by..(by + block).min(height) {
                    for x in bx..(bx + block).min(width) {
                        image.put_pixel(x, y, color);
                    }
                }
            }
        }
    }
}

/// Channel quantisation: `v -> floor(v / step) * step` on R, G and B.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct PosterizeConfig {
    #[derivative(Default(value = "64"))]
    pub step: u8,
}

impl PosterizeConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn quantize(value: u8, step: u8) -> u8 {
    let step = step.max(1);
    (value / step) * step
}

impl Effect for PosterizeConfig {
    fn apply(&self, image: &mut RgbaImage) {
        for pixel in image.pixels_mut() {
            pixel[0] = quantize(pixel[0], self.step);
            pixel[1] = quantize(pixel[1], self.step);
            pixel[2] = quantize(pixel[2], self.step);
        }
    }
}

/// Semi-transparent black scan lines every `line_period` rows, starting at row 0.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct CrtConfig {
    #[derivative(Default(value = "2"))]
    pub line_period: u32,

    #[derivative(Default(value = "0.2"))]
    pub line_opacity: f32,
}

impl CrtConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for CrtConfig {
    fn apply(&self, image: &mut RgbaImage) {
        let opacity = self.line_opacity.clamp(0.0, 1.0);
        let keep = 1.0 - opacity;
        let (width, height) = image.dimensions();

        for y in (0..height).step_by(self.line_period.max(1) as usize) {
            for x in 0..width {
                let pixel = image.get_pixel_mut(x, y);
                for c in 0..3 {
                    pixel[c] = (pixel[c] as f32 * keep).round().clamp(0.0, 255.0) as u8;
                }
                pixel[3] = (opacity * 255.0 + pixel[3] as f32 * keep)
                    .round()
                    .clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Soft bleed: the raster is repeatedly blurred with a growing radius and
/// composited back over itself at reduced opacity.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct WatercolorConfig {
    #[derivative(Default(value = "5"))]
    pub blur_passes: u32,

    #[derivative(Default(value = "0.8"))]
    pub opacity: f32,
}

impl WatercolorConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for WatercolorConfig {
    fn apply(&self, image: &mut RgbaImage) {
        let opacity = self.opacity.clamp(0.0, 1.0);

        for pass in 0..self.blur_passes {
            // radius 0 is a plain self-blit
            let layer = if pass == 0 {
                image.clone()
            } else {
                imageproc::filter::gaussian_blur_f32(&*image, pass as f32)
            };

            composite_over(image, &layer, opacity);
        }
    }
}

/// Source-over compositing of `layer` onto `image` with a global alpha.
pub(crate) fn composite_over(image: &mut RgbaImage, layer: &RgbaImage, opacity: f32) {
    for (dst, src) in image.pixels_mut().zip(layer.pixels()) {
        let alpha = opacity * src[3] as f32 / 255.0;

        for c in 0..3 {
            dst[c] = (src[c] as f32 * alpha + dst[c] as f32 * (1.0 - alpha))
                .round()
                .clamp(0.0, 255.0) as u8;
        }

        dst[3] = (alpha * 255.0 + dst[3] as f32 * (1.0 - alpha))
            .round()
            .clamp(0.0, 255.0) as u8;
    }
}
