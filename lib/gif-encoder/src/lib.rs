mod ge_gif;

pub use ge_gif::GifImageEncoder;

use image::{ImageFormat, RgbaImage};
use std::{fmt, io::Cursor, time::Duration};

#[derive(thiserror::Error, Debug)]
pub enum EncoderError {
    #[error("No frames to encode")]
    EmptySequence,

    #[error("Invalid output size {0}x{1}")]
    InvalidSize(u32, u32),

    #[error("Image encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type EncoderResult<T> = std::result::Result<T, EncoderError>;

/// One encoded still (PNG) together with its geometry.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl ImagePayload {
    pub fn encode_png(image: &RgbaImage) -> EncoderResult<Self> {
        let mut data = Vec::new();
        image.write_to(&mut Cursor::new(&mut data), ImageFormat::Png)?;

        Ok(Self {
            width: image.width(),
            height: image.height(),
            data,
        })
    }

    pub fn decode(&self) -> EncoderResult<RgbaImage> {
        Ok(image::load_from_memory_with_format(&self.data, ImageFormat::Png)?.to_rgba8())
    }
}

/// The finished animation.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedArtifact {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
}

impl fmt::Debug for EncodedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedArtifact")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("frame_count", &self.frame_count)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl EncodedArtifact {
    pub fn mime_type(&self) -> &'static str {
        "image/gif"
    }
}

/// Turns an ordered list of stills into one animated image.
pub trait ImageEncoder: Send + Sync {
    fn encode(
        &self,
        images: &[ImagePayload],
        width: u32,
        height: u32,
        frame_delay: Duration,
    ) -> EncoderResult<EncodedArtifact>;
}
