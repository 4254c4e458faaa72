use anyhow::{Context, Result, bail};
use camera::{CameraConfig, CameraDevice, NokhwaCamera, SyntheticCamera, camera_info};
use clap::Parser;
use gif_encoder::GifImageEncoder;
use gifbooth::{Config, selection};
use image_effect::EffectId;
use recorder::{PipelineConfig, PipelineController, PipelineState};
use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
    time::Instant,
};

/// Record a short camera clip and turn it into an animated GIF.
#[derive(Parser, Debug)]
#[command(name = "gifbooth", version, about)]
struct Args {
    /// Configuration file, `<config_dir>/gifbooth/gifbooth.toml` by default
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Effect name, see `--list-effects`
    #[arg(short, long)]
    effect: Option<String>,

    /// Camera name, see `--list-cameras`
    #[arg(long)]
    camera: Option<String>,

    /// Output file, a timestamped name in the save directory by default
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of frames in the animation
    #[arg(long)]
    frames: Option<u32>,

    /// Recording length in milliseconds
    #[arg(long)]
    duration_ms: Option<u64>,

    /// Use a generated test pattern instead of a camera
    #[arg(long)]
    synthetic: bool,

    #[arg(long)]
    list_effects: bool,

    #[arg(long)]
    list_cameras: bool,

    /// Write the effective configuration back to the configuration file
    #[arg(long)]
    save_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.list_effects {
        for id in EffectId::all() {
            println!("{id}");
        }
        return Ok(());
    }

    if args.list_cameras {
        camera::init();
        let cameras = camera_info::query_available_cameras();
        if cameras.is_empty() {
            println!("no working camera found");
        }
        for camera in cameras {
            println!("{camera}");
        }
        return Ok(());
    }

    let mut config = Config::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    let effect = config
        .capture
        .effect
        .parse::<EffectId>()
        .with_context(|| "pick an effect from --list-effects")?;
    selection::set_effect(effect);

    if args.save_config {
        config.save()?;
    }

    let output = match args.output {
        Some(ref path) => path.clone(),
        None => default_output(&config)?,
    };

    let pipeline = PipelineConfig::from(&config).with_effect(selection::shared());
    log::info!("recording {} ms with effect {effect}", config.capture.duration_ms);

    if args.synthetic {
        return run(SyntheticCamera::moving_gradient(640, 480), pipeline, output);
    }

    camera::init();
    let camera_config = CameraConfig::default().with_fps(config.capture.fps);
    let device = match config.capture.camera {
        Some(ref name) => NokhwaCamera::by_name(name, camera_config),
        None => NokhwaCamera::first_available(camera_config),
    }
    .context("open camera failed")?;

    run(device, pipeline, output)
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(ref effect) = args.effect {
        config.capture.effect = effect.clone();
    }
    if let Some(ref camera) = args.camera {
        config.capture.camera = Some(camera.clone());
    }
    if let Some(frames) = args.frames {
        config.capture.frame_count = frames;
    }
    if let Some(duration_ms) = args.duration_ms {
        config.capture.duration_ms = duration_ms;
    }
}

fn default_output(config: &Config) -> Result<PathBuf> {
    let dir = config.save_dir();
    fs::create_dir_all(&dir).with_context(|| format!("create {} failed", dir.display()))?;

    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    Ok(dir.join(format!("gifbooth-{stamp}.gif")))
}

fn run<C: CameraDevice>(camera: C, pipeline: PipelineConfig, output: PathBuf) -> Result<()> {
    let now = Instant::now();
    let mut controller = PipelineController::new(camera, GifImageEncoder::new(), pipeline);

    if !controller.start() {
        bail!("pipeline did not start, {}", controller.state());
    }

    let state = controller.wait(|progress| {
        print!("\rsampling {progress:>3}%");
        _ = io::stdout().flush();
    });
    println!();

    match state {
        PipelineState::Ready(artifact) => {
            fs::write(&output, &artifact.data)
                .with_context(|| format!("write {} failed", output.display()))?;

            log::info!(
                "{} frames, {}x{}, {} bytes in {:.2?}",
                artifact.frame_count,
                artifact.width,
                artifact.height,
                artifact.data.len(),
                now.elapsed()
            );
            println!("{}", output.display());
            Ok(())
        }
        PipelineState::Error(reason) => bail!("{reason}"),
        state => bail!("pipeline ended in {state}"),
    }
}
