use crate::{
    Effect, ImageEffectError,
    glyph_effect::{AsciiConfig, EmojiConfig},
    monochrome_effect::HeatmapConfig,
    noise_effect::{GlitchConfig, StippleConfig},
    sketch_effect::{EinkConfig, IllustrationConfig},
    stylized_effect::{CrtConfig, PixelateConfig, PosterizeConfig, WatercolorConfig},
};
use derive_setters::Setters;
use image::RgbaImage;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::{fmt, str::FromStr};

/// The fixed effect catalog. The discriminant is the stable id shared across
/// threads through an `AtomicU8`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum EffectId {
    #[default]
    Stipple = 0,
    Ascii,
    Emoji,
    Glitch,
    Heatmap,
    Watercolor,
    Crt,
    Pixelate,
    Posterize,
    Eink,
    Illustration,
}

impl EffectId {
    pub fn all() -> &'static [EffectId] {
        &[
            EffectId::Stipple,
            EffectId::Ascii,
            EffectId::Emoji,
            EffectId::Glitch,
            EffectId::Heatmap,
            EffectId::Watercolor,
            EffectId::Crt,
            EffectId::Pixelate,
            EffectId::Posterize,
            EffectId::Eink,
            EffectId::Illustration,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            EffectId::Stipple => "stipple",
            EffectId::Ascii => "ascii",
            EffectId::Emoji => "emoji",
            EffectId::Glitch => "glitch",
            EffectId::Heatmap => "heatmap",
            EffectId::Watercolor => "watercolor",
            EffectId::Crt => "crt",
            EffectId::Pixelate => "pixelate",
            EffectId::Posterize => "posterize",
            EffectId::Eink => "eink",
            EffectId::Illustration => "illustration",
        }
    }

    /// Whether equal input and settings always give an identical raster.
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, EffectId::Stipple | EffectId::Glitch | EffectId::Eink)
    }

    pub fn from_u8(id: u8) -> Result<Self, ImageEffectError> {
        EffectId::try_from(id).map_err(|_| ImageEffectError::InvalidEffectId(id))
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectId {
    type Err = ImageEffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        EffectId::all()
            .iter()
            .copied()
            .find(|id| id.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ImageEffectError::UnknownEffect(s.to_string()))
    }
}

/// Tunable parameters for every effect in the catalog.
#[derive(Debug, Clone, Default, Setters)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct EffectSettings {
    pub stipple: StippleConfig,
    pub ascii: AsciiConfig,
    pub emoji: EmojiConfig,
    pub glitch: GlitchConfig,
    pub heatmap: HeatmapConfig,
    pub watercolor: WatercolorConfig,
    pub crt: CrtConfig,
    pub pixelate: PixelateConfig,
    pub posterize: PosterizeConfig,
    pub eink: EinkConfig,
    pub illustration: IllustrationConfig,
}

impl EffectSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effect(&self, id: EffectId) -> &dyn Effect {
        match id {
            EffectId::Stipple => &self.stipple,
            EffectId::Ascii => &self.ascii,
            EffectId::Emoji => &self.emoji,
            EffectId::Glitch => &self.glitch,
            EffectId::Heatmap => &self.heatmap,
            EffectId::Watercolor => &self.watercolor,
            EffectId::Crt => &self.crt,
            EffectId::Pixelate => &self.pixelate,
            EffectId::Posterize => &self.posterize,
            EffectId::Eink => &self.eink,
            EffectId::Illustration => &self.illustration,
        }
    }

    pub fn apply(&self, id: EffectId, image: &mut RgbaImage) {
        log::trace!("applying {id} to {}x{} raster", image.width(), image.height());
        self.effect(id).apply(image);
    }
}
