use derivative::Derivative;
use derive_setters::Setters;
use image_effect::{EffectId, EffectSettings};
use std::{
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
    time::Duration,
};

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct PipelineConfig {
    /// Length of the recorded clip. Sampling spans the same duration.
    #[derivative(Default(value = "Duration::from_millis(1000)"))]
    pub recording_duration: Duration,

    #[derivative(Default(value = "20"))]
    pub frame_count: u32,

    /// Delay between frames of the output animation.
    #[derivative(Default(value = "Duration::from_millis(100)"))]
    pub frame_delay: Duration,

    /// Output size relative to the recorded frames, ignored when both
    /// `width` and `height` are set.
    #[derivative(Default(value = "0.5"))]
    pub scale: f32,

    #[derivative(Default(value = "None"))]
    #[setters(strip_option)]
    pub width: Option<u32>,

    #[derivative(Default(value = "None"))]
    #[setters(strip_option)]
    pub height: Option<u32>,

    #[derivative(Default(value = "true"))]
    pub mirror: bool,

    #[derivative(Default(value = "30"))]
    pub record_fps: u32,

    pub effect_settings: EffectSettings,

    /// Selected effect, read once when a run starts.
    #[derivative(Default(value = "Arc::new(AtomicU8::new(EffectId::Stipple.into()))"))]
    pub effect: Arc<AtomicU8>,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_effect(&self) -> EffectId {
        let raw = self.effect.load(Ordering::Relaxed);
        EffectId::from_u8(raw).unwrap_or_else(|e| {
            log::warn!("{e}, falling back to {}", EffectId::default());
            EffectId::default()
        })
    }

    /// Output raster size for frames of `source` size.
    pub fn raster_size(&self, source: (u32, u32)) -> (u32, u32) {
        if let (Some(width), Some(height)) = (self.width, self.height) {
            return (width, height);
        }

        let scale = if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        };
        let scaled = |v: u32| ((v as f32 * scale).round() as u32).max(1);
        (scaled(source.0), scaled(source.1))
    }
}
