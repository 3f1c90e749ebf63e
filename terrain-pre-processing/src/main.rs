/// Heightmap to terrain mesh converter main entry point
mod converter;

use constants::terrain::DEFAULT_HEIGHT_SCALE;
use converter::TerrainConverter;
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        eprintln!(
            "Usage: {} <heightmap.png> [diffuse.png] [height-scale]",
            args[0]
        );
        std::process::exit(1);
    }

    let heightmap_path = &args[1];
    let diffuse_path = args.get(2).map(String::as_str);

    let height_scale = match args.get(3) {
        Some(raw) => {
            let parsed: f32 = raw
                .parse()
                .map_err(|_| format!("height-scale is not a number: {raw}"))?;
            if !parsed.is_finite() || parsed < 0.0 {
                return Err(format!("height-scale must be >= 0, got {raw}").into());
            }
            parsed
        }
        None => DEFAULT_HEIGHT_SCALE,
    };

    let converter = TerrainConverter::new(heightmap_path, diffuse_path, height_scale)?;
    converter.convert()?;

    Ok(())
}
