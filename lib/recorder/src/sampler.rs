use crate::{RasterSurface, RecorderError, RecorderResult, SampleSchedule, StopSignal};
use camera::FrameSource;
use gif_encoder::ImagePayload;
use image_effect::{EffectId, EffectSettings};
use std::time::Instant;

/// Encoded stills in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSequence {
    frames: Vec<ImagePayload>,
}

impl FrameSequence {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, frame: ImagePayload) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[ImagePayload] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<ImagePayload> {
        self.frames
    }
}

/// Samples a playing source on a fixed schedule, runs the active effect on
/// every sample and collects the encoded results.
pub struct FrameSampler<'a> {
    schedule: SampleSchedule,
    surface: RasterSurface,
    effect: EffectId,
    settings: &'a EffectSettings,
}

impl<'a> FrameSampler<'a> {
    pub fn new(
        schedule: SampleSchedule,
        surface: RasterSurface,
        effect: EffectId,
        settings: &'a EffectSettings,
    ) -> Self {
        Self {
            schedule,
            surface,
            effect,
            settings,
        }
    }

    /// Runs all ticks. `on_progress` receives the percentage after each tick.
    ///
    /// Returns [`RecorderError::Cancelled`] if `stop` is raised before the
    /// last tick; a failing source ends the run with
    /// [`RecorderError::CaptureInterrupted`]. Partial sequences are dropped.
    pub fn run<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
        stop: &StopSignal,
        mut on_progress: impl FnMut(u8),
    ) -> RecorderResult<FrameSequence> {
        let frame_count = self.schedule.frame_count();
        let interval = self.schedule.interval();
        let mut sequence = FrameSequence::with_capacity(frame_count as usize);

        log::info!(
            "sampling {frame_count} frames every {interval:.2?} with {} at {}x{}",
            self.effect,
            self.surface.dimensions().0,
            self.surface.dimensions().1
        );

        for index in 0..frame_count {
            if stop.is_stopped() {
                log::info!("sampling stopped after {index} frames");
                return Err(RecorderError::Cancelled);
            }

            let now = Instant::now();
            let payload = self.tick(source)?;
            sequence.push(payload);

            let done = index + 1;
            on_progress(self.schedule.progress(done));
            log::debug!("sample[{done}/{frame_count}] tick time: {:.2?}", now.elapsed());

            if stop.wait_timeout(interval) && done < frame_count {
                log::info!("sampling stopped after {done} frames");
                return Err(RecorderError::Cancelled);
            }
        }

        Ok(sequence)
    }

    fn tick<S: FrameSource + ?Sized>(&mut self, source: &mut S) -> RecorderResult<ImagePayload> {
        let frame = source
            .read_frame()
            .map_err(|e| RecorderError::CaptureInterrupted(e.to_string()))?;

        let mut raster = self.surface.draw(&frame)?;
        self.settings.apply(self.effect, &mut raster);

        ImagePayload::encode_png(&raster)
            .map_err(|e| RecorderError::ImageProcessingFailed(e.to_string()))
    }
}
