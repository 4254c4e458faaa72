use crate::{Effect, brightness, ramp_index};
use derivative::Derivative;
use derive_setters::Setters;
use image::{Rgba, RgbaImage};

pub const HEATMAP_BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const HEATMAP_GREEN: Rgba<u8> = Rgba([0, 128, 0, 255]);
pub const HEATMAP_YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);
pub const HEATMAP_RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

fn default_heatmap_colors() -> Vec<Rgba<u8>> {
    vec![HEATMAP_BLUE, HEATMAP_GREEN, HEATMAP_YELLOW, HEATMAP_RED]
}

/// Brightness banding into a cold-to-hot palette.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct HeatmapConfig {
    /// Ordered from coldest (darkest input) to hottest (brightest input).
    #[derivative(Default(value = "default_heatmap_colors()"))]
    pub colors: Vec<Rgba<u8>>,
}

impl HeatmapConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for HeatmapConfig {
    fn apply(&self, image: &mut RgbaImage) {
        if self.colors.is_empty() {
            log::warn!("heatmap has an empty colour ramp, frame left unchanged");
            return;
        }

        for pixel in image.pixels_mut() {
            let index = ramp_index(brightness(pixel), self.colors.len());
            *pixel = self.colors[index];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heatmap_bands() {
        let mut image = RgbaImage::new(4, 1);
        image.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([128, 128, 128, 255]));
        image.put_pixel(2, 0, Rgba([200, 200, 200, 10]));
        image.put_pixel(3, 0, Rgba([255, 255, 255, 255]));

        HeatmapConfig::new().apply(&mut image);

        assert_eq!(*image.get_pixel(0, 0), HEATMAP_BLUE);
        assert_eq!(*image.get_pixel(1, 0), HEATMAP_GREEN);
        assert_eq!(*image.get_pixel(2, 0), HEATMAP_YELLOW);
        assert_eq!(*image.get_pixel(3, 0), HEATMAP_RED);
    }

    #[test]
    fn test_heatmap_custom_ramp() {
        let mut image = RgbaImage::from_pixel(3, 3, Rgba([250, 250, 250, 255]));
        let white = Rgba([255, 255, 255, 255]);
        HeatmapConfig::new()
            .with_colors(vec![Rgba([0, 0, 0, 255]), white])
            .apply(&mut image);

        assert!(image.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_heatmap_empty_ramp_is_noop() {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4]));
        HeatmapConfig::new().with_colors(vec![]).apply(&mut image);
        assert!(image.pixels().all(|p| *p == Rgba([1, 2, 3, 4])));
    }
}
