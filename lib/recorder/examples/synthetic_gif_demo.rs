use camera::SyntheticCamera;
use gif_encoder::GifImageEncoder;
use image_effect::EffectId;
use recorder::{PipelineConfig, PipelineController, PipelineState};
use std::{sync::atomic::Ordering, time::Instant};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    std::fs::create_dir_all("tmp")?;
    let config = PipelineConfig::new();

    for effect in EffectId::all() {
        config.effect.store((*effect).into(), Ordering::Relaxed);

        let camera = SyntheticCamera::moving_gradient(320, 240);
        let mut controller =
            PipelineController::new(camera, GifImageEncoder::new(), config.clone());

        let now = Instant::now();
        controller.start();

        match controller.wait(|p| log::debug!("{effect}: {p}%")) {
            PipelineState::Ready(artifact) => {
                let path = format!("tmp/{effect}.gif");
                std::fs::write(&path, &artifact.data)?;
                log::info!("{path}: {} bytes in {:.2?}", artifact.data.len(), now.elapsed());
            }
            state => log::warn!("{effect} ended in {state:?}"),
        }
    }

    Ok(())
}
