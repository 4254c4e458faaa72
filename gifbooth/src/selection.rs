//! The effect the user picked, shared with every pipeline run.

use image_effect::EffectId;
use once_cell::sync::Lazy;
use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

static SELECTED_EFFECT: Lazy<Arc<AtomicU8>> =
    Lazy::new(|| Arc::new(AtomicU8::new(EffectId::default().into())));

/// The process-wide selection cell, suitable for `PipelineConfig::with_effect`.
pub fn shared() -> Arc<AtomicU8> {
    SELECTED_EFFECT.clone()
}

pub fn set_effect(id: EffectId) {
    log::debug!("selected effect: {id}");
    SELECTED_EFFECT.store(id.into(), Ordering::Relaxed);
}

pub fn current() -> EffectId {
    EffectId::from_u8(SELECTED_EFFECT.load(Ordering::Relaxed)).unwrap_or_default()
}
