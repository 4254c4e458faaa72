use crate::{FrameSequence, RecorderResult};
use gif_encoder::{EncodedArtifact, ImageEncoder};
use std::time::{Duration, Instant};

/// Hands a finished sequence to the encoder with the run's output geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceAssembler {
    pub width: u32,
    pub height: u32,
    pub frame_delay: Duration,
}

impl SequenceAssembler {
    pub fn new(width: u32, height: u32, frame_delay: Duration) -> Self {
        Self {
            width,
            height,
            frame_delay,
        }
    }

    pub fn assemble<E: ImageEncoder + ?Sized>(
        &self,
        encoder: &E,
        sequence: &FrameSequence,
    ) -> RecorderResult<EncodedArtifact> {
        let now = Instant::now();
        let artifact = encoder.encode(
            sequence.frames(),
            self.width,
            self.height,
            self.frame_delay,
        )?;

        log::info!(
            "assembled {} frames into {} bytes in {:.2?}",
            sequence.len(),
            artifact.data.len(),
            now.elapsed()
        );
        Ok(artifact)
    }
}
