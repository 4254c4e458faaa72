//! Records a live stream into an in-memory clip that can be played back later.

use crate::{CameraError, CameraResult, FrameSource};
use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, bounded};
use derivative::Derivative;
use derive_setters::Setters;
use image::RgbaImage;
use std::{
    fmt,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// A captured frame and its offset from the first captured frame.
#[derive(Debug, Clone)]
pub struct TimedFrame {
    pub offset: Duration,
    pub image: RgbaImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Inactive,
    Recording,
}

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct ClipRecorderConfig {
    #[derivative(Default(value = "30"))]
    pub fps: u32,
}

impl ClipRecorderConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

pub type DataAvailableCallback = Arc<dyn Fn(&TimedFrame) + Send + Sync>;

struct RecordingWorker {
    stop_sender: Sender<()>,
    handle: JoinHandle<CameraResult<Vec<TimedFrame>>>,
}

pub struct ClipRecorder {
    config: ClipRecorderConfig,
    on_data_available: Option<DataAvailableCallback>,
    worker: Option<RecordingWorker>,
}

impl fmt::Debug for ClipRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipRecorder")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

impl ClipRecorder {
    pub fn new(config: ClipRecorderConfig) -> Self {
        Self {
            config,
            on_data_available: None,
            worker: None,
        }
    }

    /// Called on the recording thread for every captured frame.
    pub fn on_data_available(mut self, callback: impl Fn(&TimedFrame) + Send + Sync + 'static) -> Self {
        self.on_data_available = Some(Arc::new(callback));
        self
    }

    pub fn state(&self) -> RecorderState {
        if self.worker.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Inactive
        }
    }

    /// `true` once the recording thread has ended on its own, which only
    /// happens when the stream failed.
    pub fn is_interrupted(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| worker.handle.is_finished())
    }

    /// Starts capturing from `stream` on a background thread. The recorder
    /// takes ownership of the stream and drops it when recording ends.
    pub fn start<S: FrameSource + 'static>(&mut self, stream: S) -> CameraResult<()> {
        if self.worker.is_some() {
            return Err(CameraError::StartError("recorder is already recording".to_string()));
        }

        let (stop_sender, stop_receiver) = bounded(1);
        let interval = Duration::from_millis(1000 / self.config.fps.max(1) as u64);
        let callback = self.on_data_available.clone();

        let handle = thread::spawn(move || record(stream, interval, stop_receiver, callback));

        log::info!("clip recorder started at {} fps", self.config.fps.max(1));
        self.worker = Some(RecordingWorker {
            stop_sender,
            handle,
        });
        Ok(())
    }

    /// Stops recording and returns the clip. The stream has been released
    /// when this returns. Calling it again, or before `start`, returns `None`.
    pub fn stop(&mut self) -> Option<CameraResult<RecordedClip>> {
        let RecordingWorker {
            stop_sender,
            handle,
        } = self.worker.take()?;

        _ = stop_sender.try_send(());
        drop(stop_sender);

        let frames = match handle.join() {
            Ok(frames) => frames,
            Err(_) => {
                log::warn!("clip recorder thread panicked");
                Err(CameraError::DeviceLost("recorder thread panicked".to_string()))
            }
        };

        Some(frames.and_then(RecordedClip::new))
    }
}

impl Drop for ClipRecorder {
    fn drop(&mut self) {
        if let Some(result) = self.stop()
            && let Err(e) = result
        {
            log::debug!("dropped recorder ended with: {e}");
        }
    }
}

fn record<S: FrameSource>(
    mut stream: S,
    interval: Duration,
    stop_receiver: Receiver<()>,
    callback: Option<DataAvailableCallback>,
) -> CameraResult<Vec<TimedFrame>> {
    let mut frames: Vec<TimedFrame> = vec![];
    let mut first_frame_at: Option<Instant> = None;

    loop {
        let tick = Instant::now();

        match stream.read_frame() {
            Ok(image) => {
                let start = *first_frame_at.get_or_insert(tick);
                let frame = TimedFrame {
                    offset: tick.duration_since(start),
                    image,
                };

                if let Some(ref callback) = callback {
                    callback(&frame);
                }
                frames.push(frame);
            }
            Err(CameraError::NoFrameAvailable) => log::debug!("no frame on this tick"),
            Err(e) => {
                log::warn!("recording interrupted after {} frames: {e}", frames.len());
                return Err(e);
            }
        }

        match stop_receiver.recv_timeout(interval.saturating_sub(tick.elapsed())) {
            Err(RecvTimeoutError::Timeout) => (),
            Ok(_) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    log::info!("clip recorder captured {} frames", frames.len());
    Ok(frames)
}

/// A finished recording. As a [`FrameSource`] it plays back by wall clock:
/// the first read starts playback, each read returns the frame whose offset
/// was most recently reached, and the final frame holds past the end.
#[derive(Debug, Clone)]
pub struct RecordedClip {
    frames: Vec<TimedFrame>,
    playback_started: Option<Instant>,
}

impl RecordedClip {
    pub fn new(frames: Vec<TimedFrame>) -> CameraResult<Self> {
        if frames.is_empty() {
            return Err(CameraError::EmptyRecording);
        }

        Ok(Self {
            frames,
            playback_started: None,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Offset of the final frame.
    pub fn duration(&self) -> Duration {
        self.frames.last().map(|f| f.offset).unwrap_or_default()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.frames
            .first()
            .map(|f| f.image.dimensions())
            .unwrap_or_default()
    }

    pub fn play(&mut self) {
        self.playback_started = Some(Instant::now());
    }

    pub fn frame_at(&self, elapsed: Duration) -> Option<&RgbaImage> {
        let index = self.frames.partition_point(|f| f.offset <= elapsed);
        self.frames.get(index.saturating_sub(1)).map(|f| &f.image)
    }
}

impl FrameSource for RecordedClip {
    fn read_frame(&mut self) -> CameraResult<RgbaImage> {
        let started = *self.playback_started.get_or_insert_with(Instant::now);

        self.frame_at(started.elapsed())
            .cloned()
            .ok_or(CameraError::NoFrameAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticCamera;
    use crate::{CameraDevice, Rgba};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn frame(offset_ms: u64, value: u8) -> TimedFrame {
        TimedFrame {
            offset: Duration::from_millis(offset_ms),
            image: RgbaImage::from_pixel(2, 2, Rgba([value, 0, 0, 255])),
        }
    }

    #[test]
    fn test_clip_playback_picks_latest_reached_frame() {
        let clip = RecordedClip::new(vec![frame(0, 1), frame(100, 2), frame(200, 3)]).unwrap();

        let red = |d: u64| clip.frame_at(Duration::from_millis(d)).unwrap().get_pixel(0, 0)[0];
        assert_eq!(red(0), 1);
        assert_eq!(red(99), 1);
        assert_eq!(red(100), 2);
        assert_eq!(red(250), 3);
        assert_eq!(red(10_000), 3);
        assert_eq!(clip.duration(), Duration::from_millis(200));
        assert_eq!(clip.dimensions(), (2, 2));
    }

    #[test]
    fn test_empty_clip_is_rejected() {
        assert!(matches!(
            RecordedClip::new(vec![]),
            Err(CameraError::EmptyRecording)
        ));
    }

    #[test]
    fn test_record_then_stop_releases_stream() -> anyhow::Result<()> {
        let camera = SyntheticCamera::solid(8, 6, Rgba([10, 20, 30, 255]));
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();

        let mut recorder = ClipRecorder::new(ClipRecorderConfig::new().with_fps(50))
            .on_data_available(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        assert_eq!(recorder.state(), RecorderState::Inactive);

        recorder.start(camera.acquire()?)?;
        assert_eq!(recorder.state(), RecorderState::Recording);
        assert!(!camera.is_ready());

        thread::sleep(Duration::from_millis(120));
        let clip = recorder.stop().expect("recorder was running")?;

        assert_eq!(recorder.state(), RecorderState::Inactive);
        assert!(camera.is_ready());
        assert!(clip.frame_count() >= 1);
        assert_eq!(seen.load(Ordering::Relaxed), clip.frame_count());
        assert_eq!(clip.dimensions(), (8, 6));

        // stop is idempotent
        assert!(recorder.stop().is_none());
        Ok(())
    }

    #[test]
    fn test_device_loss_surfaces_on_stop() -> anyhow::Result<()> {
        let camera = SyntheticCamera::solid(4, 4, Rgba([0, 0, 0, 255])).fail_after(2);
        let mut recorder = ClipRecorder::new(ClipRecorderConfig::new().with_fps(100));

        recorder.start(camera.acquire()?)?;
        thread::sleep(Duration::from_millis(100));
        assert!(recorder.is_interrupted());

        let result = recorder.stop().expect("recorder was running");
        assert!(matches!(result, Err(CameraError::DeviceLost(_))));
        assert!(camera.is_ready());
        Ok(())
    }

    #[test]
    fn test_second_start_is_rejected() -> anyhow::Result<()> {
        let first = SyntheticCamera::solid(2, 2, Rgba([1, 1, 1, 255]));
        let second = SyntheticCamera::solid(2, 2, Rgba([2, 2, 2, 255]));
        let mut recorder = ClipRecorder::new(ClipRecorderConfig::new());

        recorder.start(first.acquire()?)?;
        assert!(recorder.start(second.acquire()?).is_err());
        assert!(second.is_ready());

        drop(recorder);
        assert!(first.is_ready());
        Ok(())
    }
}
