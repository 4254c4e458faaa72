use image::{ImageReader, Rgba, RgbaImage};
use image_effect::{EffectId, EffectSettings};
use std::{fs, path::Path, time::Instant};

fn sample_image() -> RgbaImage {
    RgbaImage::from_fn(320, 240, |x, y| {
        let r = (x * 255 / 320) as u8;
        let g = (y * 255 / 240) as u8;
        let b = if (x / 40 + y / 40) % 2 == 0 { 200 } else { 40 };
        Rgba([r, g, b, 255])
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let output_dir = Path::new("tmp/effects");
    fs::create_dir_all(output_dir)?;

    let img_path = Path::new("data/test.png");
    let source = if img_path.exists() {
        ImageReader::open(img_path)?.decode()?.to_rgba8()
    } else {
        sample_image()
    };

    println!("Source size: {}x{}", source.width(), source.height());
    println!("{:<15} {:>12} {:>12}", "Effect", "Time (ms)", "Max FPS");
    println!("{}", "-".repeat(41));

    let settings = EffectSettings::new();
    for id in EffectId::all() {
        let mut image = source.clone();

        let start = Instant::now();
        settings.apply(*id, &mut image);
        let time_ms = start.elapsed().as_secs_f64() * 1000.0;

        image.save(output_dir.join(format!("{id}.png")))?;
        println!("{:<15} {:>12.3} {:>12.0}", id.name(), time_ms, 1000.0 / time_ms.max(0.001));
    }

    println!("\nImages saved to: {}", output_dir.display());
    Ok(())
}
