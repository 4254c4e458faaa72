//! Edge-driven effects: line-art illustration and the dithered e-ink look.
//!
//! Both share the same neighbour-difference edge detector. Pixels on the
//! border replicate the centre value for missing neighbours, so the frame
//! edge itself never registers as an edge.

use crate::{Effect, stylized_effect::quantize};
use derivative::Derivative;
use derive_setters::Setters;
use image::{GrayImage, ImageBuffer, Luma, RgbaImage};
use rand::Rng;

/// Mask value for an edge pixel.
pub const EDGE: u8 = 0;
/// Mask value for a pixel with no edge.
pub const NO_EDGE: u8 = 255;

/// Rounded mean of the colour channels.
pub fn grayscale_plane(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = image.get_pixel(x, y);
        let sum = pixel[0] as u32 + pixel[1] as u32 + pixel[2] as u32;
        Luma([(sum as f32 / 3.0).round() as u8])
    })
}

/// `|left - right| + |top - bottom|` for every pixel, in `[0, 510]`.
pub fn edge_strength(gray: &GrayImage) -> ImageBuffer<Luma<u16>, Vec<u16>> {
    let (width, height) = gray.dimensions();
    let at = |x: u32, y: u32| gray.get_pixel(x, y)[0] as i32;

    ImageBuffer::from_fn(width, height, |x, y| {
        let center = at(x, y);
        let left = if x > 0 { at(x - 1, y) } else { center };
        let right = if x + 1 < width { at(x + 1, y) } else { center };
        let top = if y > 0 { at(x, y - 1) } else { center };
        let bottom = if y + 1 < height { at(x, y + 1) } else { center };

        Luma([((left - right).abs() + (top - bottom).abs()) as u16])
    })
}

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct EdgeDetectionConfig {
    /// Scaled strengths above this value are edges.
    #[derivative(Default(value = "20"))]
    pub threshold: u8,

    #[derivative(Default(value = "1.8"))]
    pub contrast: f32,
}

impl EdgeDetectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binary edge mask: [`EDGE`] where an edge was found, [`NO_EDGE`] elsewhere.
    pub fn mask(&self, gray: &GrayImage) -> GrayImage {
        let strength = edge_strength(gray);
        let contrast = self.contrast.max(0.0);
        let threshold = self.threshold as f32;

        GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            let scaled = (strength.get_pixel(x, y)[0] as f32 * contrast).min(255.0);
            Luma([if scaled > threshold { EDGE } else { NO_EDGE }])
        })
    }
}

/// Flat poster colours with white fill wherever no edge was detected.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct IllustrationConfig {
    #[derivative(Default(value = "20"))]
    pub edge_threshold: u8,

    #[derivative(Default(value = "1.8"))]
    pub edge_contrast: f32,

    #[derivative(Default(value = "120"))]
    pub color_step: u8,
}

impl IllustrationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    fn edge_detection(&self) -> EdgeDetectionConfig {
        EdgeDetectionConfig::new()
            .with_threshold(self.edge_threshold)
            .with_contrast(self.edge_contrast)
    }
}

impl Effect for IllustrationConfig {
    fn apply(&self, image: &mut RgbaImage) {
        let mask = self.edge_detection().mask(&grayscale_plane(image));

        for (pixel, edge) in image.pixels_mut().zip(mask.pixels()) {
            for c in 0..3 {
                let level = quantize(pixel[c], self.color_step) as u16 + edge[0] as u16;
                pixel[c] = level.min(255) as u8;
            }
        }
    }
}

/// Black-and-white e-paper rendering: noisy threshold dithering combined with
/// the edge mask.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct EinkConfig {
    #[derivative(Default(value = "20"))]
    pub edge_threshold: u8,

    #[derivative(Default(value = "1.0"))]
    pub edge_contrast: f32,

    /// Width of the uniform noise band added before thresholding.
    #[derivative(Default(value = "30.0"))]
    pub noise_intensity: f32,
}

impl EinkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_with_rng<R: Rng + ?Sized>(&self, image: &mut RgbaImage, rng: &mut R) {
        let gray = grayscale_plane(image);
        let mask = EdgeDetectionConfig::new()
            .with_threshold(self.edge_threshold)
            .with_contrast(self.edge_contrast)
            .mask(&gray);
        let amplitude = self.noise_intensity.max(0.0);

        for ((pixel, luma), edge) in image.pixels_mut().zip(gray.pixels()).zip(mask.pixels()) {
            let noise = rng.random::<f32>() * amplitude - amplitude / 2.0;
            let binary = if luma[0] as f32 + noise > 128.0 { 255 } else { 0 };
            let value = binary.max(edge[0]);

            pixel[0] = value;
            pixel[1] = value;
            pixel[2] = value;
        }
    }
}

impl Effect for EinkConfig {
    fn apply(&self, image: &mut RgbaImage) {
        self.apply_with_rng(image, &mut rand::rng());
    }
}
