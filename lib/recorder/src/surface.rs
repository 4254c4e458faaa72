use crate::{RecorderError, RecorderResult};
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::{RgbaImage, imageops};

/// The fixed-size raster every sampled frame is drawn onto.
pub struct RasterSurface {
    width: u32,
    height: u32,
    mirror: bool,
    resizer: Resizer,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32, mirror: bool) -> RecorderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RecorderError::InvalidConfig(format!(
                "raster size must be positive, got {width}x{height}"
            )));
        }

        Ok(Self {
            width,
            height,
            mirror,
            resizer: Resizer::new(),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Scales `frame` to the surface size and mirrors it if configured.
    pub fn draw(&mut self, frame: &RgbaImage) -> RecorderResult<RgbaImage> {
        let mut raster = if frame.dimensions() == (self.width, self.height) {
            frame.clone()
        } else {
            self.resize(frame)?
        };

        if self.mirror {
            imageops::flip_horizontal_in_place(&mut raster);
        }

        Ok(raster)
    }

    fn resize(&mut self, frame: &RgbaImage) -> RecorderResult<RgbaImage> {
        let (src_width, src_height) = frame.dimensions();
        if src_width == 0 || src_height == 0 {
            return Err(RecorderError::ImageProcessingFailed(
                "source frame is empty".to_string(),
            ));
        }

        let src_image =
            Image::from_vec_u8(src_width, src_height, frame.as_raw().clone(), PixelType::U8x4)?;
        let mut dst_image = Image::new(self.width, self.height, PixelType::U8x4);

        let resize_options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
        self.resizer
            .resize(&src_image, &mut dst_image, &resize_options)?;

        RgbaImage::from_raw(self.width, self.height, dst_image.into_vec()).ok_or_else(|| {
            RecorderError::ImageProcessingFailed("Failed to create resized image buffer".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_same_size_is_copied() -> anyhow::Result<()> {
        let frame = RgbaImage::from_fn(4, 2, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let mut surface = RasterSurface::new(4, 2, false)?;
        assert_eq!(surface.draw(&frame)?, frame);
        Ok(())
    }

    #[test]
    fn test_mirror_flips_columns() -> anyhow::Result<()> {
        let frame = RgbaImage::from_fn(4, 2, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let mut surface = RasterSurface::new(4, 2, true)?;
        let raster = surface.draw(&frame)?;

        for (x, y, pixel) in raster.enumerate_pixels() {
            assert_eq!(pixel, frame.get_pixel(3 - x, y));
        }
        Ok(())
    }

    #[test]
    fn test_scales_to_surface_size() -> anyhow::Result<()> {
        let frame = RgbaImage::from_pixel(64, 48, Rgba([255, 0, 0, 255]));
        let mut surface = RasterSurface::new(32, 24, true)?;
        let raster = surface.draw(&frame)?;

        assert_eq!(raster.dimensions(), (32, 24));
        assert_eq!(raster.len(), 32 * 24 * 4);
        assert!(raster.pixels().all(|p| p[0] >= 250 && p[1] <= 5 && p[2] <= 5));
        Ok(())
    }

    #[test]
    fn test_zero_size_is_invalid() {
        assert!(matches!(
            RasterSurface::new(0, 10, false),
            Err(RecorderError::InvalidConfig(_))
        ));
    }
}
