use anyhow::{Context, Result, bail};
use derivative::Derivative;
use image_effect::{
    EffectSettings, Rgba,
    glyph_effect::{AsciiConfig, EmojiConfig},
    monochrome_effect::HeatmapConfig,
    noise_effect::{GlitchConfig, StippleConfig},
    sketch_effect::{EinkConfig, IllustrationConfig},
    stylized_effect::{CrtConfig, PixelateConfig, PosterizeConfig, WatercolorConfig},
};
use platform_dirs::AppDirs;
use recorder::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const APP_NAME: &str = "gifbooth";

/// Contents of `gifbooth.toml`. Every section and key is optional.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,

    pub capture: Capture,
    pub effects: Effects,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Capture {
    #[derivative(Default(value = "\"stipple\".to_string()"))]
    pub effect: String,

    /// Camera name as printed by `--list-cameras`; the first working camera
    /// is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,

    /// Directory for generated files, the working directory when empty.
    pub save_dir: String,

    #[derivative(Default(value = "1000"))]
    pub duration_ms: u64,

    #[derivative(Default(value = "20"))]
    pub frame_count: u32,

    #[derivative(Default(value = "100"))]
    pub frame_delay_ms: u64,

    #[derivative(Default(value = "0.5"))]
    pub scale: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    #[derivative(Default(value = "true"))]
    pub mirror: bool,

    #[derivative(Default(value = "30"))]
    pub fps: u32,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct Effects {
    pub stipple: Stipple,
    pub ascii: Ascii,
    pub emoji: Emoji,
    pub glitch: Glitch,
    pub heatmap: Heatmap,
    pub watercolor: Watercolor,
    pub crt: Crt,
    pub pixelate: Pixelate,
    pub posterize: Posterize,
    pub eink: Eink,
    pub illustration: Illustration,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Stipple {
    #[derivative(Default(value = "StippleConfig::default().density"))]
    pub density: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Ascii {
    /// Darkest to brightest.
    #[derivative(Default(value = "AsciiConfig::default().ramp"))]
    pub ramp: String,

    #[derivative(Default(value = "AsciiConfig::default().stride"))]
    pub stride: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Emoji {
    #[derivative(Default(value = "EmojiConfig::default().ramp"))]
    pub ramp: String,

    #[derivative(Default(value = "EmojiConfig::default().stride"))]
    pub stride: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Glitch {
    #[derivative(Default(value = "GlitchConfig::default().shift"))]
    pub shift: u32,

    #[derivative(Default(value = "GlitchConfig::default().probability"))]
    pub probability: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Heatmap {
    /// RGBA colours from coldest to hottest.
    #[derivative(Default(value = "heatmap_colors_default()"))]
    pub colors: Vec<[u8; 4]>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Watercolor {
    #[derivative(Default(value = "WatercolorConfig::default().blur_passes"))]
    pub blur_passes: u32,

    #[derivative(Default(value = "WatercolorConfig::default().opacity"))]
    pub opacity: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Crt {
    #[derivative(Default(value = "CrtConfig::default().line_period"))]
    pub line_period: u32,

    #[derivative(Default(value = "CrtConfig::default().line_opacity"))]
    pub line_opacity: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Pixelate {
    #[derivative(Default(value = "PixelateConfig::default().block_size"))]
    pub block_size: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Posterize {
    #[derivative(Default(value = "PosterizeConfig::default().step"))]
    pub step: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Eink {
    #[derivative(Default(value = "EinkConfig::default().edge_threshold"))]
    pub edge_threshold: u8,

    #[derivative(Default(value = "EinkConfig::default().edge_contrast"))]
    pub edge_contrast: f32,

    #[derivative(Default(value = "EinkConfig::default().noise_intensity"))]
    pub noise_intensity: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Illustration {
    #[derivative(Default(value = "IllustrationConfig::default().edge_threshold"))]
    pub edge_threshold: u8,

    #[derivative(Default(value = "IllustrationConfig::default().edge_contrast"))]
    pub edge_contrast: f32,

    #[derivative(Default(value = "IllustrationConfig::default().color_step"))]
    pub color_step: u8,
}

fn heatmap_colors_default() -> Vec<[u8; 4]> {
    HeatmapConfig::default()
        .colors
        .into_iter()
        .map(|color| color.0)
        .collect()
}

impl Config {
    /// `<config_dir>/gifbooth/gifbooth.toml`
    pub fn default_path() -> Result<PathBuf> {
        let app_dirs = AppDirs::new(Some(APP_NAME), true)
            .context("no configuration directory on this platform")?;
        Ok(app_dirs.config_dir.join(format!("{APP_NAME}.toml")))
    }

    /// Reads `path`, or the default location when `path` is `None`. A missing
    /// file yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        let mut config = match fs::read_to_string(&config_path) {
            Ok(text) => toml::from_str::<Config>(&text)
                .with_context(|| format!("parse {} failed", config_path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("{} not found, using defaults", config_path.display());
                Config::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read {} failed", config_path.display()));
            }
        };

        config.config_path = config_path;
        log::debug!("{config:?}");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        if self.config_path.as_os_str().is_empty() {
            bail!("config has no file path");
        }

        if let Some(dir) = self.config_path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }

        let text = toml::to_string_pretty(self).context("convert config to toml failed")?;
        fs::write(&self.config_path, text)
            .with_context(|| format!("save {} failed", self.config_path.display()))?;

        log::info!("saved config to {}", self.config_path.display());
        Ok(())
    }

    pub fn save_dir(&self) -> PathBuf {
        if self.capture.save_dir.trim().is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(self.capture.save_dir.trim())
        }
    }
}

impl From<&Effects> for EffectSettings {
    fn from(effects: &Effects) -> Self {
        EffectSettings::new()
            .with_stipple(StippleConfig::new().with_density(effects.stipple.density))
            .with_ascii(
                AsciiConfig::new()
                    .with_ramp(effects.ascii.ramp.clone())
                    .with_stride(effects.ascii.stride),
            )
            .with_emoji(
                EmojiConfig::new()
                    .with_ramp(effects.emoji.ramp.clone())
                    .with_stride(effects.emoji.stride),
            )
            .with_glitch(
                GlitchConfig::new()
                    .with_shift(effects.glitch.shift)
                    .with_probability(effects.glitch.probability),
            )
            .with_heatmap(
                HeatmapConfig::new()
                    .with_colors(effects.heatmap.colors.iter().map(|c| Rgba(*c)).collect()),
            )
            .with_watercolor(
                WatercolorConfig::new()
                    .with_blur_passes(effects.watercolor.blur_passes)
                    .with_opacity(effects.watercolor.opacity),
            )
            .with_crt(
                CrtConfig::new()
                    .with_line_period(effects.crt.line_period)
                    .with_line_opacity(effects.crt.line_opacity),
            )
            .with_pixelate(PixelateConfig::new().with_block_size(effects.pixelate.block_size))
            .with_posterize(PosterizeConfig::new().with_step(effects.posterize.step))
            .with_eink(
                EinkConfig::new()
                    .with_edge_threshold(effects.eink.edge_threshold)
                    .with_edge_contrast(effects.eink.edge_contrast)
                    .with_noise_intensity(effects.eink.noise_intensity),
            )
            .with_illustration(
                IllustrationConfig::new()
                    .with_edge_threshold(effects.illustration.edge_threshold)
                    .with_edge_contrast(effects.illustration.edge_contrast)
                    .with_color_step(effects.illustration.color_step),
            )
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        let capture = &config.capture;
        let mut pipeline = PipelineConfig::new()
            .with_recording_duration(Duration::from_millis(capture.duration_ms))
            .with_frame_count(capture.frame_count)
            .with_frame_delay(Duration::from_millis(capture.frame_delay_ms))
            .with_scale(capture.scale)
            .with_mirror(capture.mirror)
            .with_record_fps(capture.fps)
            .with_effect_settings(EffectSettings::from(&config.effects));

        if let Some(width) = capture.width {
            pipeline = pipeline.with_width(width);
        }
        if let Some(height) = capture.height {
            pipeline = pipeline.with_height(height);
        }
        pipeline
    }
}
