//! A software camera for demos and tests.

use crate::{CameraDevice, CameraError, CameraResult, DeviceLease, FrameSource};
use image::{Rgba, RgbaImage};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

pub type FrameGenerator = Arc<dyn Fn(usize) -> RgbaImage + Send + Sync>;

/// Generates frames from a function of the frame index. Supports failure
/// injection and exposes whether its stream is currently held.
#[derive(Clone)]
pub struct SyntheticCamera {
    generator: FrameGenerator,
    fail_after: Option<usize>,
    access_denied: bool,
    in_use: Arc<AtomicBool>,
}

impl SyntheticCamera {
    pub fn new(generator: impl Fn(usize) -> RgbaImage + Send + Sync + 'static) -> Self {
        Self {
            generator: Arc::new(generator),
            fail_after: None,
            access_denied: false,
            in_use: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> Self {
        Self::new(move |_| RgbaImage::from_pixel(width, height, color))
    }

    /// A diagonal colour sweep that drifts with the frame index.
    pub fn moving_gradient(width: u32, height: u32) -> Self {
        Self::new(move |index| {
            let shift = index as u32 * 4;
            RgbaImage::from_fn(width, height, |x, y| {
                Rgba([
                    ((x + shift) * 255 / width.max(1)) as u8,
                    (y * 255 / height.max(1)) as u8,
                    ((x + y + shift) % 256) as u8,
                    255,
                ])
            })
        })
    }

    /// Every stream serves `frames` frames and then reports the device as lost.
    pub fn fail_after(mut self, frames: usize) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// The device looks present but refuses to open.
    pub fn deny_access(mut self) -> Self {
        self.access_denied = true;
        self
    }

    pub fn in_use(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }
}

impl CameraDevice for SyntheticCamera {
    type Stream = SyntheticStream;

    fn is_ready(&self) -> bool {
        !self.in_use()
    }

    fn acquire(&self) -> CameraResult<SyntheticStream> {
        if self.access_denied {
            return Err(CameraError::Unavailable("permission denied".to_string()));
        }

        let lease = DeviceLease::try_acquire(&self.in_use)?;
        log::debug!("synthetic camera acquired");

        Ok(SyntheticStream {
            generator: self.generator.clone(),
            fail_after: self.fail_after,
            served: 0,
            _lease: lease,
        })
    }
}

pub struct SyntheticStream {
    generator: FrameGenerator,
    fail_after: Option<usize>,
    served: usize,
    _lease: DeviceLease,
}

impl FrameSource for SyntheticStream {
    fn read_frame(&mut self) -> CameraResult<RgbaImage> {
        if let Some(limit) = self.fail_after
            && self.served >= limit
        {
            return Err(CameraError::DeviceLost(format!(
                "synthetic device unplugged after {limit} frames"
            )));
        }

        let frame = (self.generator)(self.served);
        self.served += 1;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_frames() -> anyhow::Result<()> {
        let camera = SyntheticCamera::solid(3, 2, Rgba([255, 0, 0, 255]));
        let mut stream = camera.acquire()?;
        let frame = stream.read_frame()?;

        assert_eq!(frame.dimensions(), (3, 2));
        assert!(frame.pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
        Ok(())
    }

    #[test]
    fn test_single_stream_at_a_time() -> anyhow::Result<()> {
        let camera = SyntheticCamera::solid(1, 1, Rgba([0, 0, 0, 255]));
        assert!(camera.is_ready());

        let stream = camera.acquire()?;
        assert!(camera.in_use());
        assert!(!camera.is_ready());
        assert!(matches!(camera.acquire(), Err(CameraError::DeviceBusy)));

        drop(stream);
        assert!(camera.is_ready());
        Ok(())
    }

    #[test]
    fn test_fail_after() -> anyhow::Result<()> {
        let camera = SyntheticCamera::solid(1, 1, Rgba([0, 0, 0, 255])).fail_after(2);
        let mut stream = camera.acquire()?;

        assert!(stream.read_frame().is_ok());
        assert!(stream.read_frame().is_ok());
        assert!(matches!(stream.read_frame(), Err(CameraError::DeviceLost(_))));
        Ok(())
    }

    #[test]
    fn test_denied_access() {
        let camera = SyntheticCamera::solid(1, 1, Rgba([0, 0, 0, 255])).deny_access();
        assert!(camera.is_ready());
        assert!(matches!(camera.acquire(), Err(CameraError::Unavailable(_))));
        assert!(!camera.in_use());
    }

    #[test]
    fn test_moving_gradient_changes_over_time() -> anyhow::Result<()> {
        let camera = SyntheticCamera::moving_gradient(32, 8);
        let mut stream = camera.acquire()?;
        let first = stream.read_frame()?;
        let second = stream.read_frame()?;
        assert_ne!(first, second);
        Ok(())
    }
}
