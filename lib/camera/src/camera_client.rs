use crate::{
    CameraDevice, CameraError, CameraResult, DeviceLease, FrameSource, camera_info, rgb_to_rgba,
};
use derivative::Derivative;
use derive_setters::Setters;
use image::RgbaImage;
use nokhwa::{
    CallbackCamera,
    pixel_format::{RgbAFormat, RgbFormat},
    utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution},
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    #[default]
    RGBA,
    RGB,
}

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct CameraConfig {
    #[derivative(Default(value = "None"))]
    #[setters[strip_option]]
    pub fps: Option<u32>,

    #[derivative(Default(value = "None"))]
    #[setters[strip_option]]
    pub width: Option<u32>,

    #[derivative(Default(value = "None"))]
    #[setters[strip_option]]
    pub height: Option<u32>,

    #[derivative(Default(value = "PixelFormat::RGBA"))]
    pub pixel_format: PixelFormat,

    /// How long a freshly opened stream may take to deliver its first frame.
    #[derivative(Default(value = "Duration::from_secs(3)"))]
    pub warmup_timeout: Duration,
}

pub struct CameraClient {
    camera: Option<CallbackCamera>,
    is_running: Arc<AtomicBool>,
    pixel_format: PixelFormat,
    warmup_timeout: Duration,
    delivered: bool,
}

impl CameraClient {
    pub fn new(camera_index: CameraIndex, config: CameraConfig) -> CameraResult<Self> {
        let pixel_format = config.pixel_format;
        let format_type = RequestedFormatType::AbsoluteHighestFrameRate;
        let format = match pixel_format {
            PixelFormat::RGBA => RequestedFormat::new::<RgbAFormat>(format_type),
            PixelFormat::RGB => RequestedFormat::new::<RgbFormat>(format_type),
        };

        let mut camera = CallbackCamera::new(camera_index, format, move |_| {})
            .map_err(|e| CameraError::InitializationError(e.to_string()))?;

        if let Some(fps) = config.fps
            && let Err(e) = camera.set_frame_rate(fps)
        {
            log::warn!("camera set frame rate ({fps}) failed: {e}");
        }

        if let Some(w) = config.width
            && let Some(h) = config.height
            && let Err(e) = camera.set_resolution(Resolution::new(w, h))
        {
            log::warn!("camera set resolution ({w} x {h}) failed: {e}");
        }

        Ok(Self {
            camera: Some(camera),
            is_running: Arc::new(AtomicBool::new(false)),
            pixel_format,
            warmup_timeout: config.warmup_timeout,
            delivered: false,
        })
    }

    pub fn start(&mut self) -> CameraResult<()> {
        if let Some(ref mut camera) = self.camera {
            camera
                .open_stream()
                .map_err(|e| CameraError::StartError(e.to_string()))?;
            self.is_running.store(true, Ordering::Relaxed);
            Ok(())
        } else {
            Err(CameraError::InitializationError(
                "Camera not initialized".to_string(),
            ))
        }
    }

    pub fn stop(&mut self) -> CameraResult<()> {
        if let Some(ref mut camera) = self.camera {
            camera
                .stop_stream()
                .map_err(|e| CameraError::StopError(e.to_string()))?;
            self.is_running.store(false, Ordering::Relaxed);
            Ok(())
        } else {
            Err(CameraError::StopError("Camera not initialized".to_string()))
        }
    }

    pub fn last_frame(&self) -> CameraResult<RgbaImage> {
        match self.camera {
            Some(ref c) => {
                let buffer = c.last_frame()?;

                match self.pixel_format {
                    PixelFormat::RGBA => Ok(buffer.decode_image::<RgbAFormat>()?),
                    PixelFormat::RGB => {
                        if let Ok(rgb_image) = buffer.decode_image::<RgbFormat>() {
                            Ok(rgb_to_rgba(&rgb_image))
                        } else {
                            Err(CameraError::NoFrameAvailable)
                        }
                    }
                }
            }
            None => Err(CameraError::InitializationError("No camera".to_string())),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }
}

impl FrameSource for CameraClient {
    fn read_frame(&mut self) -> CameraResult<RgbaImage> {
        if !self.is_running() {
            return Err(CameraError::DeviceLost("stream is not running".to_string()));
        }

        if self.delivered {
            return match self.last_frame() {
                Ok(frame) if !frame.is_empty() => Ok(frame),
                Ok(_) => Err(CameraError::NoFrameAvailable),
                Err(e) => Err(CameraError::DeviceLost(e.to_string())),
            };
        }

        // a stream that was just opened has no frame yet
        let step = Duration::from_millis(20);
        let attempts = (self.warmup_timeout.as_millis() / step.as_millis()).max(1);
        for _ in 0..attempts {
            match self.last_frame() {
                Ok(frame) if !frame.is_empty() => {
                    self.delivered = true;
                    return Ok(frame);
                }
                Ok(_) => log::trace!("empty frame while warming up"),
                Err(e) => log::trace!("no frame while warming up: {e}"),
            }
            thread::sleep(step);
        }

        Err(CameraError::NoFrameAvailable)
    }
}

impl Drop for CameraClient {
    fn drop(&mut self) {
        if self.is_running() {
            _ = self.stop();
        }
    }
}

/// A running nokhwa stream together with its device lease.
pub struct CameraStream {
    client: CameraClient,
    _lease: DeviceLease,
}

impl FrameSource for CameraStream {
    fn read_frame(&mut self) -> CameraResult<RgbaImage> {
        self.client.read_frame()
    }
}

/// A physical camera, chosen by name or taken as the first working device.
pub struct NokhwaCamera {
    index: CameraIndex,
    config: CameraConfig,
    in_use: Arc<AtomicBool>,
}

impl NokhwaCamera {
    pub fn new(index: CameraIndex, config: CameraConfig) -> Self {
        Self {
            index,
            config,
            in_use: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn by_name(name: &str, config: CameraConfig) -> CameraResult<Self> {
        Ok(Self::new(camera_info::query_camera_id(name)?, config))
    }

    pub fn first_available(config: CameraConfig) -> CameraResult<Self> {
        let cameras = camera_info::query_available_cameras();
        let first = camera_info::select_camera(&cameras, None)?;

        log::info!("using camera: {}", first.name);
        Self::by_name(&first.name, config)
    }
}

impl CameraDevice for NokhwaCamera {
    type Stream = CameraStream;

    fn is_ready(&self) -> bool {
        !self.in_use.load(Ordering::Acquire)
    }

    fn acquire(&self) -> CameraResult<CameraStream> {
        let lease = DeviceLease::try_acquire(&self.in_use)?;

        let mut client = CameraClient::new(self.index.clone(), self.config.clone())
            .map_err(|e| CameraError::Unavailable(e.to_string()))?;
        client
            .start()
            .map_err(|e| CameraError::Unavailable(e.to_string()))?;

        log::info!("camera {} acquired", self.index);
        Ok(CameraStream {
            client,
            _lease: lease,
        })
    }
}
