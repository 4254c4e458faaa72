// cargo test -p recorder --test pipeline_test

use camera::{CameraDevice, Rgba, SyntheticCamera};
use gif_encoder::{
    EncodedArtifact, EncoderError, EncoderResult, GifImageEncoder, ImageEncoder, ImagePayload,
};
use image_effect::EffectId;
use recorder::{PipelineConfig, PipelineController, PipelineState};
use std::{
    sync::{Arc, Mutex, atomic::Ordering},
    thread,
    time::{Duration, Instant},
};

#[derive(Debug, Clone)]
struct EncodeCall {
    frames: Vec<ImagePayload>,
    width: u32,
    height: u32,
    frame_delay: Duration,
}

/// Records what it was asked to encode and returns a placeholder artifact.
#[derive(Clone, Default)]
struct RecordingEncoder {
    calls: Arc<Mutex<Vec<EncodeCall>>>,
}

impl ImageEncoder for RecordingEncoder {
    fn encode(
        &self,
        images: &[ImagePayload],
        width: u32,
        height: u32,
        frame_delay: Duration,
    ) -> EncoderResult<EncodedArtifact> {
        self.calls.lock().unwrap().push(EncodeCall {
            frames: images.to_vec(),
            width,
            height,
            frame_delay,
        });

        Ok(EncodedArtifact {
            data: b"GIF89a".to_vec(),
            width,
            height,
            frame_count: images.len(),
        })
    }
}

/// Rejects every sequence, as a full disk would.
struct FailingEncoder;

impl ImageEncoder for FailingEncoder {
    fn encode(&self, _: &[ImagePayload], _: u32, _: u32, _: Duration) -> EncoderResult<EncodedArtifact> {
        Err(EncoderError::EncodingFailed("disk full".to_string()))
    }
}

fn config_with(effect: EffectId) -> PipelineConfig {
    let config = PipelineConfig::new()
        .with_recording_duration(Duration::from_millis(1000))
        .with_frame_count(20)
        .with_width(32)
        .with_height(24);
    config.effect.store(effect.into(), Ordering::Relaxed);
    config
}

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}

#[test]
fn posterized_red_clip_becomes_twenty_uniform_frames() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let camera = SyntheticCamera::solid(32, 24, Rgba([255, 0, 0, 255]));
    let encoder = RecordingEncoder::default();
    let calls = encoder.calls.clone();

    let mut controller = PipelineController::new(camera, encoder, config_with(EffectId::Posterize));
    assert!(controller.start());

    let mut progress = vec![];
    let state = controller.wait(|p| progress.push(p)).clone();
    assert!(matches!(state, PipelineState::Ready(_)), "{state:?}");

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);

    let call = &calls[0];
    assert_eq!((call.width, call.height), (32, 24));
    assert_eq!(call.frame_delay, Duration::from_millis(100));
    assert_eq!(call.frames.len(), 20);

    for payload in &call.frames {
        let image = payload.decode()?;
        assert_eq!(image.dimensions(), (32, 24));
        assert!(image.pixels().all(|p| *p == Rgba([192, 0, 0, 255])));
    }

    assert_eq!(progress.len(), 20);
    assert_eq!(progress.last(), Some(&100));
    Ok(())
}

#[test]
fn start_during_a_run_is_ignored() {
    let camera = SyntheticCamera::solid(8, 8, Rgba([10, 10, 10, 255]));
    let mut controller = PipelineController::new(
        camera,
        RecordingEncoder::default(),
        config_with(EffectId::Pixelate)
            .with_recording_duration(Duration::from_millis(300))
            .with_frame_count(3),
    );

    assert!(controller.start());
    assert!(!controller.start());
    assert_eq!(controller.runs_started(), 1);

    // still ignored once sampling has begun
    assert!(wait_until(Duration::from_secs(5), || {
        !matches!(controller.poll(), PipelineState::Recording)
    }));
    assert!(!controller.start());
    assert_eq!(controller.runs_started(), 1);

    controller.wait(|_| {});
    assert!(controller.artifact().is_some());
}

#[test]
fn dismiss_while_recording_releases_camera() {
    let camera = SyntheticCamera::solid(8, 8, Rgba([0, 0, 0, 255]));
    let watcher = camera.clone();
    let encoder = RecordingEncoder::default();
    let calls = encoder.calls.clone();

    let mut controller = PipelineController::new(
        camera,
        encoder,
        config_with(EffectId::Crt).with_recording_duration(Duration::from_secs(30)),
    );

    assert!(controller.start());
    assert_eq!(controller.state(), &PipelineState::Recording);
    assert!(watcher.in_use());

    let start = Instant::now();
    controller.dismiss();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(controller.state(), &PipelineState::Idle);
    assert!(!watcher.in_use());
    assert!(watcher.is_ready());
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn denied_camera_moves_to_error_and_needs_dismiss() {
    let camera = SyntheticCamera::solid(8, 8, Rgba([0, 0, 0, 255])).deny_access();
    let mut controller =
        PipelineController::new(camera, RecordingEncoder::default(), config_with(EffectId::Ascii));

    assert!(!controller.start());
    assert!(matches!(controller.state(), PipelineState::Error(reason) if reason.contains("permission denied")));

    // no retry from the error state
    assert!(!controller.start());
    assert!(matches!(controller.state(), PipelineState::Error(_)));

    controller.dismiss();
    assert_eq!(controller.state(), &PipelineState::Idle);
}

#[test]
fn device_lost_mid_recording_is_capture_error() {
    let camera = SyntheticCamera::solid(8, 8, Rgba([0, 0, 0, 255])).fail_after(2);
    let watcher = camera.clone();
    let encoder = RecordingEncoder::default();
    let calls = encoder.calls.clone();

    let mut controller = PipelineController::new(camera, encoder, config_with(EffectId::Heatmap));
    assert!(controller.start());

    let state = controller.wait(|_| {}).clone();
    assert!(matches!(state, PipelineState::Error(ref reason) if reason.starts_with("Capture interrupted")), "{state:?}");
    assert!(calls.lock().unwrap().is_empty());
    assert!(watcher.is_ready());
}

#[test]
fn real_gif_encoder_produces_animation() {
    let camera = SyntheticCamera::moving_gradient(40, 30);
    let mut controller = PipelineController::new(
        camera,
        GifImageEncoder::new(),
        config_with(EffectId::Illustration)
            .with_recording_duration(Duration::from_millis(300))
            .with_frame_count(5)
            .with_width(20)
            .with_height(15),
    );

    assert!(controller.start());
    let state = controller.wait(|_| {}).clone();

    let PipelineState::Ready(artifact) = state else {
        panic!("unexpected state {state:?}");
    };
    assert_eq!(&artifact.data[..6], b"GIF89a");
    assert_eq!(artifact.frame_count, 5);
    assert_eq!((artifact.width, artifact.height), (20, 15));
}

#[test]
fn encoder_failure_ends_in_error_without_artifact() {
    let _ = env_logger::builder().is_test(true).try_init();

    let camera = SyntheticCamera::solid(32, 24, Rgba([0, 128, 255, 255]));
    let watcher = camera.clone();
    let config = config_with(EffectId::Pixelate)
        .with_recording_duration(Duration::from_millis(200))
        .with_frame_count(4);

    let mut controller = PipelineController::new(camera, FailingEncoder, config);
    assert!(controller.start());

    let state = controller.wait(|_| {}).clone();
    match state {
        PipelineState::Error(ref reason) => {
            assert!(reason.starts_with("Encoding failed"), "{reason}");
            assert!(reason.contains("disk full"), "{reason}");
        }
        other => panic!("expected an error, got {other:?}"),
    }
    assert!(controller.artifact().is_none());
    assert_eq!(controller.progress(), None);
    assert!(watcher.is_ready());

    assert!(!controller.start());
    assert_eq!(controller.state(), &state);
    assert_eq!(controller.runs_started(), 1);

    controller.dismiss();
    assert_eq!(controller.state(), &PipelineState::Idle);
    assert!(controller.start());
    assert_eq!(controller.runs_started(), 2);
}
