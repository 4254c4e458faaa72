use camera::{
    CameraConfig, CameraDevice, CameraResult, ClipRecorder, ClipRecorderConfig, FrameSource,
    NokhwaCamera, PixelFormat, camera_info::query_available_cameras,
};
use std::{thread, time::Duration};

fn main() -> CameraResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    camera::init();

    let cameras = query_available_cameras();
    if cameras.is_empty() {
        log::warn!("No working cameras found!");
        return Ok(());
    }

    for camera in &cameras {
        log::info!("found camera: {camera}");
    }

    let config = CameraConfig::default()
        .with_pixel_format(PixelFormat::RGBA)
        .with_width(1280)
        .with_height(720)
        .with_fps(30);

    let camera = NokhwaCamera::by_name(&cameras[0].name, config)?;
    let mut recorder = ClipRecorder::new(ClipRecorderConfig::new().with_fps(30))
        .on_data_available(|frame| log::debug!("frame at {:.2?}", frame.offset));

    recorder.start(camera.acquire()?)?;
    thread::sleep(Duration::from_secs(1));

    let Some(clip) = recorder.stop() else {
        return Ok(());
    };
    let mut clip = clip?;

    log::info!(
        "recorded {} frames over {:.2?}, {}x{}",
        clip.frame_count(),
        clip.duration(),
        clip.dimensions().0,
        clip.dimensions().1
    );

    std::fs::create_dir_all("tmp")?;
    clip.play();
    for index in 0..5 {
        clip.read_frame()?.save(format!("tmp/clip-{index}.png"))?;
        thread::sleep(clip.duration() / 5);
    }

    Ok(())
}
