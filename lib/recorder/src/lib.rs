//! # gifbooth recorder
//!
//! Turns a short camera clip into an animated GIF with a per-frame effect.
//!
//! A run goes through four stages on one worker thread:
//!
//! 1. **Recording**: the camera stream is recorded into an in-memory clip.
//!    The stream is released as soon as recording ends.
//! 2. **Sampling**: [`FrameSampler`] plays the clip back and takes a fixed
//!    number of evenly spaced samples. Each sample is scaled onto a
//!    [`RasterSurface`], passed through the selected effect and encoded as
//!    PNG.
//! 3. **Assembling**: [`SequenceAssembler`] hands the ordered stills to an
//!    [`ImageEncoder`](gif_encoder::ImageEncoder).
//! 4. **Ready**: the controller holds the finished artifact.
//!
//! ## Quick Start
//!
//! ```no_run
//! use camera::{Rgba, SyntheticCamera};
//! use gif_encoder::GifImageEncoder;
//! use image_effect::EffectId;
//! use recorder::{PipelineConfig, PipelineController, PipelineState};
//! use std::sync::atomic::Ordering;
//!
//! let config = PipelineConfig::new();
//! config.effect.store(EffectId::Posterize.into(), Ordering::Relaxed);
//!
//! let camera = SyntheticCamera::solid(640, 480, Rgba([255, 0, 0, 255]));
//! let mut controller = PipelineController::new(camera, GifImageEncoder::new(), config);
//!
//! controller.start();
//! if let PipelineState::Ready(artifact) = controller.wait(|p| println!("{p}%")) {
//!     std::fs::write("booth.gif", &artifact.data).unwrap();
//! }
//! ```

mod assembler;
mod pipeline;
mod pipeline_config;
mod recorder_error;
mod sampler;
mod schedule;
mod stop_signal;
mod surface;

pub use assembler::SequenceAssembler;
pub use pipeline::{PipelineController, PipelineState};
pub use pipeline_config::PipelineConfig;
pub use recorder_error::{ErrorKind, RecorderError};
pub use sampler::{FrameSampler, FrameSequence};
pub use schedule::SampleSchedule;
pub use stop_signal::{StopHandle, StopSignal, stop_signal};
pub use surface::RasterSurface;

pub type RecorderResult<T> = Result<T, RecorderError>;
