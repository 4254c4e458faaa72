pub mod camera_client;
pub mod camera_info;
pub mod clip_recorder;
pub mod synthetic;

pub use camera_client::{CameraClient, CameraConfig, CameraStream, NokhwaCamera, PixelFormat};
pub use camera_info::CameraInfo;
pub use clip_recorder::{ClipRecorder, ClipRecorderConfig, RecordedClip, RecorderState, TimedFrame};
pub use image::{Rgba, RgbaImage};
pub use synthetic::SyntheticCamera;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

pub type CameraResult<T> = Result<T, CameraError>;

#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    #[error("Failed to query cameras: {0}")]
    QueryError(String),

    #[error("Failed to initialize camera: {0}")]
    InitializationError(String),

    #[error("Failed to start camera: {0}")]
    StartError(String),

    #[error("Failed to stop camera: {0}")]
    StopError(String),

    #[error("Camera is already in use")]
    DeviceBusy,

    #[error("Camera is unavailable: {0}")]
    Unavailable(String),

    #[error("Camera lost: {0}")]
    DeviceLost(String),

    #[error("No frame available")]
    NoFrameAvailable,

    #[error("Nothing was recorded")]
    EmptyRecording,

    #[error("Image error: {0}")]
    ImageLibraryError(#[from] image::ImageError),

    #[error("Camera error: {0}")]
    NokhwaError(#[from] nokhwa::NokhwaError),
}

/// Anything that yields the current video frame on demand.
pub trait FrameSource: Send {
    fn read_frame(&mut self) -> CameraResult<RgbaImage>;
}

/// A capture device that hands out one live stream at a time.
///
/// The stream owns the device: dropping it stops capture and makes the device
/// ready again.
pub trait CameraDevice {
    type Stream: FrameSource + 'static;

    fn is_ready(&self) -> bool;

    fn acquire(&self) -> CameraResult<Self::Stream>;
}

/// Exclusive claim on a device, released on drop.
#[derive(Debug)]
pub struct DeviceLease {
    in_use: Arc<AtomicBool>,
}

impl DeviceLease {
    pub fn try_acquire(in_use: &Arc<AtomicBool>) -> CameraResult<Self> {
        if in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CameraError::DeviceBusy);
        }

        Ok(Self {
            in_use: in_use.clone(),
        })
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.in_use.store(false, Ordering::Release);
        log::debug!("camera lease released");
    }
}

pub fn init() {
    #[cfg(target_os = "macos")]
    nokhwa::nokhwa_initialize(|granted| {
        log::info!("User said {} for nokhwa", granted);
    });
}

pub fn rgb_to_rgba(rgb_image: &image::RgbImage) -> RgbaImage {
    let (width, height) = rgb_image.dimensions();

    RgbaImage::from_fn(width, height, |x, y| {
        let pixel = rgb_image.get_pixel(x, y);
        Rgba([pixel[0], pixel[1], pixel[2], 255])
    })
}
