use gif_encoder::{GifImageEncoder, ImageEncoder, ImagePayload};
use image::{Rgba, RgbaImage};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (width, height) = (160, 120);
    let frames = (0..20)
        .map(|index| {
            let image = RgbaImage::from_fn(width, height, |x, y| {
                let band = (x + index * 8) / 20 % 2 == 0;
                Rgba([if band { 230 } else { 30 }, (y * 2) as u8, 128, 255])
            });
            ImagePayload::encode_png(&image)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let now = std::time::Instant::now();
    let artifact = GifImageEncoder::new().encode(&frames, width, height, Duration::from_millis(100))?;
    log::info!("GIF encoding time: {:.2?}", now.elapsed());

    std::fs::create_dir_all("tmp")?;
    std::fs::write("tmp/stripes.gif", &artifact.data)?;
    log::info!("wrote tmp/stripes.gif ({} bytes)", artifact.data.len());

    Ok(())
}
