use crate::{
    FrameSampler, PipelineConfig, RasterSurface, RecorderError, RecorderResult, SampleSchedule,
    SequenceAssembler, StopHandle, StopSignal, stop_signal,
};
use camera::{CameraDevice, ClipRecorder, ClipRecorderConfig, FrameSource, RecordedClip};
use crossbeam::channel::{Receiver, Sender, TryRecvError, unbounded};
use gif_encoder::{EncodedArtifact, ImageEncoder};
use image_effect::EffectId;
use std::{
    fmt,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// How often the recording phase checks for a lost device.
const RECORDING_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Recording,
    Sampling { progress: u8 },
    Assembling,
    Ready(EncodedArtifact),
    Error(String),
}

impl PipelineState {
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            PipelineState::Recording | PipelineState::Sampling { .. } | PipelineState::Assembling
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Recording => "recording",
            PipelineState::Sampling { .. } => "sampling",
            PipelineState::Assembling => "assembling",
            PipelineState::Ready(_) => "ready",
            PipelineState::Error(_) => "error",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Sampling { progress } => write!(f, "sampling ({progress}%)"),
            PipelineState::Error(reason) => write!(f, "error: {reason}"),
            state => f.write_str(state.name()),
        }
    }
}

#[derive(Debug)]
enum WorkerEvent {
    Sampling,
    Progress(u8),
    Assembling,
    Finished(EncodedArtifact),
    Failed(RecorderError),
    Cancelled,
}

struct ActiveRun {
    stop: StopHandle,
    events: Receiver<WorkerEvent>,
    handle: JoinHandle<()>,
}

/// Owns the single capture-to-GIF run.
///
/// `start` acquires the camera and hands the stream to a worker thread that
/// records, samples and assembles. The caller observes the run through
/// [`poll`](Self::poll) or [`wait`](Self::wait); [`dismiss`](Self::dismiss)
/// and drop stop the worker and release the camera.
pub struct PipelineController<C: CameraDevice, E: ImageEncoder + 'static> {
    camera: C,
    encoder: Arc<E>,
    config: PipelineConfig,
    state: PipelineState,
    run: Option<ActiveRun>,
    runs_started: u64,
}

impl<C: CameraDevice, E: ImageEncoder + 'static> PipelineController<C, E> {
    pub fn new(camera: C, encoder: E, config: PipelineConfig) -> Self {
        Self {
            camera,
            encoder: Arc::new(encoder),
            config,
            state: PipelineState::Idle,
            run: None,
            runs_started: 0,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn runs_started(&self) -> u64 {
        self.runs_started
    }

    /// Percentage of sampled frames; only defined while sampling.
    pub fn progress(&self) -> Option<u8> {
        match self.state {
            PipelineState::Sampling { progress } => Some(progress),
            _ => None,
        }
    }

    pub fn artifact(&self) -> Option<&EncodedArtifact> {
        match self.state {
            PipelineState::Ready(ref artifact) => Some(artifact),
            _ => None,
        }
    }

    /// Returns `true` if a new run was started.
    ///
    /// While a run is in progress, or after an error, this is a no-op. From
    /// `Ready` it discards the artifact and returns to `Idle` without
    /// starting.
    pub fn start(&mut self) -> bool {
        self.poll();

        match self.state {
            PipelineState::Idle => (),
            PipelineState::Ready(_) => {
                self.dismiss();
                return false;
            }
            ref state => {
                log::debug!("start ignored in {} state", state.name());
                return false;
            }
        }

        if !self.camera.is_ready() {
            log::warn!("start ignored, camera is not ready");
            return false;
        }

        let effect = self.config.selected_effect();
        let schedule =
            match SampleSchedule::new(self.config.recording_duration, self.config.frame_count) {
                Ok(schedule) => schedule,
                Err(e) => {
                    self.fail(e);
                    return false;
                }
            };

        let stream = match self.camera.acquire() {
            Ok(stream) => stream,
            Err(e) => {
                self.fail(RecorderError::Device(e));
                return false;
            }
        };

        let (stop, stop_sig) = stop_signal();
        let (sender, events) = unbounded();
        let config = self.config.clone();
        let encoder = self.encoder.clone();

        let handle = thread::spawn(move || {
            let result = run_pipeline(
                stream,
                &config,
                schedule,
                effect,
                encoder.as_ref(),
                &stop_sig,
                &sender,
            );

            let event = match result {
                Ok(artifact) => WorkerEvent::Finished(artifact),
                Err(RecorderError::Cancelled) => WorkerEvent::Cancelled,
                Err(e) => WorkerEvent::Failed(e),
            };
            _ = sender.send(event);
            log::info!("pipeline worker exit");
        });

        self.run = Some(ActiveRun {
            stop,
            events,
            handle,
        });
        self.runs_started += 1;
        self.transition(PipelineState::Recording);
        log::info!("run #{} started with {effect}", self.runs_started);
        true
    }

    /// Applies pending worker events without blocking.
    pub fn poll(&mut self) -> &PipelineState {
        loop {
            let Some(run) = self.run.as_ref() else {
                break;
            };

            match run.events.try_recv() {
                Ok(event) => self.apply(event, &mut |_: u8| {}),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.worker_vanished(),
            }
        }

        &self.state
    }

    /// Blocks until the current run ends. `on_progress` sees every sampling
    /// percentage.
    pub fn wait(&mut self, mut on_progress: impl FnMut(u8)) -> &PipelineState {
        loop {
            let Some(run) = self.run.as_ref() else {
                break;
            };

            match run.events.recv() {
                Ok(event) => self.apply(event, &mut on_progress),
                Err(_) => self.worker_vanished(),
            }
        }

        &self.state
    }

    /// Stops any run, releases the camera and discards results.
    pub fn dismiss(&mut self) {
        self.stop_worker();
        self.transition(PipelineState::Idle);
    }

    fn apply(&mut self, event: WorkerEvent, on_progress: &mut dyn FnMut(u8)) {
        match event {
            WorkerEvent::Sampling => self.transition(PipelineState::Sampling { progress: 0 }),
            WorkerEvent::Progress(progress) => {
                self.state = PipelineState::Sampling { progress };
                on_progress(progress);
            }
            WorkerEvent::Assembling => self.transition(PipelineState::Assembling),
            WorkerEvent::Finished(artifact) => {
                self.stop_worker();
                self.transition(PipelineState::Ready(artifact));
            }
            WorkerEvent::Failed(e) => {
                self.stop_worker();
                self.fail(e);
            }
            WorkerEvent::Cancelled => {
                self.stop_worker();
                self.transition(PipelineState::Idle);
            }
        }
    }

    fn worker_vanished(&mut self) {
        self.stop_worker();
        self.fail(RecorderError::CaptureInterrupted(
            "pipeline worker exited unexpectedly".to_string(),
        ));
    }

    fn stop_worker(&mut self) {
        let Some(ActiveRun {
            mut stop, handle, ..
        }) = self.run.take()
        else {
            return;
        };

        stop.stop();
        if handle.join().is_err() {
            log::warn!("pipeline worker panicked");
        }
    }

    fn fail(&mut self, e: RecorderError) {
        log::warn!("pipeline failed ({:?}): {e}", e.kind());
        self.transition(PipelineState::Error(e.to_string()));
    }

    fn transition(&mut self, state: PipelineState) {
        if self.state.name() != state.name() {
            log::info!("pipeline {} -> {}", self.state.name(), state.name());
        }
        self.state = state;
    }
}

impl<C: CameraDevice, E: ImageEncoder + 'static> Drop for PipelineController<C, E> {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

fn run_pipeline<S: FrameSource + 'static, E: ImageEncoder + ?Sized>(
    stream: S,
    config: &PipelineConfig,
    schedule: SampleSchedule,
    effect: EffectId,
    encoder: &E,
    stop: &StopSignal,
    events: &Sender<WorkerEvent>,
) -> RecorderResult<EncodedArtifact> {
    let mut clip = record_clip(stream, config, stop)?;
    _ = events.send(WorkerEvent::Sampling);

    let (width, height) = config.raster_size(clip.dimensions());
    let surface = RasterSurface::new(width, height, config.mirror)?;

    clip.play();
    let sequence = FrameSampler::new(schedule, surface, effect, &config.effect_settings).run(
        &mut clip,
        stop,
        |progress| {
            _ = events.send(WorkerEvent::Progress(progress));
        },
    )?;

    if stop.is_stopped() {
        return Err(RecorderError::Cancelled);
    }

    _ = events.send(WorkerEvent::Assembling);
    SequenceAssembler::new(width, height, config.frame_delay).assemble(encoder, &sequence)
}

/// Records for the configured duration. The stream is released before this
/// returns, whatever the outcome.
fn record_clip<S: FrameSource + 'static>(
    stream: S,
    config: &PipelineConfig,
    stop: &StopSignal,
) -> RecorderResult<RecordedClip> {
    let mut recorder = ClipRecorder::new(ClipRecorderConfig::new().with_fps(config.record_fps));
    recorder.start(stream).map_err(RecorderError::Device)?;

    let deadline = Instant::now() + config.recording_duration;
    let mut cancelled = false;

    while let Some(remaining) = deadline.checked_duration_since(Instant::now())
        && !remaining.is_zero()
    {
        if stop.wait_timeout(remaining.min(RECORDING_POLL_INTERVAL)) {
            cancelled = true;
            break;
        }

        if recorder.is_interrupted() {
            break;
        }
    }

    let clip = recorder.stop();
    if cancelled {
        log::info!("recording cancelled, camera released");
        return Err(RecorderError::Cancelled);
    }

    match clip {
        Some(Ok(clip)) => {
            log::info!(
                "recorded {} frames over {:.2?}",
                clip.frame_count(),
                clip.duration()
            );
            Ok(clip)
        }
        Some(Err(e)) => Err(RecorderError::CaptureInterrupted(e.to_string())),
        None => Err(RecorderError::CaptureInterrupted(
            "recorder was not running".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camera::{Rgba, SyntheticCamera};
    use gif_encoder::GifImageEncoder;

    fn quick_config() -> PipelineConfig {
        PipelineConfig::new()
            .with_recording_duration(Duration::from_millis(200))
            .with_frame_count(4)
            .with_scale(1.0)
    }

    #[test]
    fn test_state_names() {
        assert!(PipelineState::Recording.is_running());
        assert!(PipelineState::Sampling { progress: 5 }.is_running());
        assert!(!PipelineState::Error("x".to_string()).is_running());
        assert_eq!(PipelineState::Assembling.name(), "assembling");
    }

    #[test]
    fn test_failed_start_keeps_reason_in_display() {
        let camera = SyntheticCamera::solid(4, 4, Rgba([0, 0, 0, 255])).deny_access();
        let mut controller = PipelineController::new(camera, GifImageEncoder::new(), quick_config());

        assert!(!controller.start());
        assert_eq!(
            controller.state().to_string(),
            "error: Camera device failed: Camera is unavailable: permission denied"
        );
        assert_eq!(PipelineState::Idle.to_string(), "idle");
        assert_eq!(PipelineState::Sampling { progress: 40 }.to_string(), "sampling (40%)");
    }

    #[test]
    fn test_full_run_reaches_ready() {
        let camera = SyntheticCamera::solid(16, 8, Rgba([40, 90, 200, 255]));
        let mut controller = PipelineController::new(camera, GifImageEncoder::new(), quick_config());

        assert!(controller.start());
        assert_eq!(controller.state(), &PipelineState::Recording);

        let mut seen = vec![];
        let state = controller.wait(|p| seen.push(p)).clone();

        let PipelineState::Ready(artifact) = state else {
            panic!("unexpected state {state:?}");
        };
        assert_eq!(artifact.frame_count, 4);
        assert_eq!((artifact.width, artifact.height), (16, 8));
        assert_eq!(seen, vec![25, 50, 75, 100]);
        assert_eq!(controller.progress(), None);
        assert!(controller.camera().is_ready());
    }

    #[test]
    fn test_start_from_ready_only_dismisses() {
        let camera = SyntheticCamera::solid(4, 4, Rgba([0, 0, 0, 255]));
        let mut controller = PipelineController::new(camera, GifImageEncoder::new(), quick_config());

        assert!(controller.start());
        controller.wait(|_| {});
        assert!(controller.artifact().is_some());

        assert!(!controller.start());
        assert_eq!(controller.state(), &PipelineState::Idle);
        assert_eq!(controller.runs_started(), 1);

        assert!(controller.start());
        assert_eq!(controller.runs_started(), 2);
    }

    #[test]
    fn test_start_ignored_when_camera_busy() -> anyhow::Result<()> {
        let camera = SyntheticCamera::solid(4, 4, Rgba([0, 0, 0, 255]));
        let _held = camera.acquire()?;

        let mut controller =
            PipelineController::new(camera.clone(), GifImageEncoder::new(), quick_config());
        assert!(!controller.start());
        assert_eq!(controller.state(), &PipelineState::Idle);
        assert_eq!(controller.runs_started(), 0);
        Ok(())
    }

    #[test]
    fn test_invalid_schedule_is_config_error() {
        let camera = SyntheticCamera::solid(4, 4, Rgba([0, 0, 0, 255]));
        let mut controller = PipelineController::new(
            camera,
            GifImageEncoder::new(),
            quick_config().with_frame_count(0),
        );

        assert!(!controller.start());
        assert!(matches!(controller.state(), PipelineState::Error(_)));
        assert!(controller.camera().is_ready());
    }

    #[test]
    fn test_drop_releases_camera() {
        let camera = SyntheticCamera::solid(4, 4, Rgba([0, 0, 0, 255]));
        let watcher = camera.clone();

        let mut controller = PipelineController::new(
            camera,
            GifImageEncoder::new(),
            quick_config().with_recording_duration(Duration::from_secs(30)),
        );
        assert!(controller.start());
        assert!(watcher.in_use());

        drop(controller);
        assert!(!watcher.in_use());
    }
}
