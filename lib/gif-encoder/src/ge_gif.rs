use crate::{EncodedArtifact, EncoderError, EncoderResult, ImageEncoder, ImagePayload};
use derivative::Derivative;
use derive_setters::Setters;
use image::{
    Delay, Frame, imageops,
    codecs::gif::{GifEncoder, Repeat},
};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct GifImageEncoder {
    /// Quantizer speed, 1 (best) to 30 (fastest).
    #[derivative(Default(value = "10"))]
    pub speed: i32,

    #[derivative(Default(value = "true"))]
    pub repeat_infinite: bool,
}

impl GifImageEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageEncoder for GifImageEncoder {
    fn encode(
        &self,
        images: &[ImagePayload],
        width: u32,
        height: u32,
        frame_delay: Duration,
    ) -> EncoderResult<EncodedArtifact> {
        if images.is_empty() {
            return Err(EncoderError::EmptySequence);
        }

        if width == 0 || height == 0 {
            return Err(EncoderError::InvalidSize(width, height));
        }

        let now = Instant::now();
        let delay = Delay::from_saturating_duration(frame_delay);
        let mut data = Vec::new();

        {
            let mut encoder = GifEncoder::new_with_speed(&mut data, self.speed.clamp(1, 30));
            if self.repeat_infinite {
                encoder.set_repeat(Repeat::Infinite)?;
            }

            for payload in images {
                let mut image = payload.decode()?;
                if image.dimensions() != (width, height) {
                    log::debug!(
                        "resize frame {}x{} -> {width}x{height}",
                        image.width(),
                        image.height()
                    );
                    image = imageops::resize(&image, width, height, imageops::FilterType::Triangle);
                }

                encoder.encode_frame(Frame::from_parts(image, 0, 0, delay))?;
            }
        }

        log::info!(
            "GIF encoding time: {:.2?}, {} frames, {} bytes",
            now.elapsed(),
            images.len(),
            data.len()
        );

        Ok(EncodedArtifact {
            data,
            width,
            height,
            frame_count: images.len(),
        })
    }
}
