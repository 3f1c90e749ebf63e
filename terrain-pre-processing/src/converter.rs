/// Offline terrain converter: bakes a heightmap and writes .gltf / .glb files.
use constants::terrain::{PLANE_SIZE, TERRAIN_RESOLUTION};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use terrain_mesh::{
    ExportOptions, ExportedModel, TerrainExportScene, TerrainGrid, TextureData, export_terrain,
};

/// Rotation quaternion (x, y, z, w) placing the grid's height axis along
/// world up, matching how the viewer orients the terrain entity.
const UPRIGHT_ROTATION: [f32; 4] = [
    -std::f32::consts::FRAC_1_SQRT_2,
    0.0,
    0.0,
    std::f32::consts::FRAC_1_SQRT_2,
];

pub struct TerrainConverter {
    heightmap_path: PathBuf,
    diffuse_path: Option<PathBuf>,
    output_dir: PathBuf,
    height_scale: f32,
}

impl TerrainConverter {
    pub fn new(
        heightmap_path: &str,
        diffuse_path: Option<&str>,
        height_scale: f32,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let heightmap_path = PathBuf::from(heightmap_path);
        if !heightmap_path.exists() {
            return Err(format!(
                "Heightmap file does not exist: {}",
                heightmap_path.display()
            )
            .into());
        }

        let diffuse_path = match diffuse_path {
            Some(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(
                        format!("Diffuse file does not exist: {}", path.display()).into()
                    );
                }
                Some(path)
            }
            None => None,
        };

        let output_dir = heightmap_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();

        Ok(Self {
            heightmap_path,
            diffuse_path,
            output_dir,
            height_scale,
        })
    }

    /// Run the full pipeline: decode, bake, export both document flavours.
    pub fn convert(&self) -> Result<(), Box<dyn std::error::Error>> {
        println!(
            "Converting {} into a displaced {}x{} terrain mesh (scale {})...",
            self.heightmap_path.display(),
            TERRAIN_RESOLUTION,
            TERRAIN_RESOLUTION,
            self.height_scale
        );

        let pb = ProgressBar::new(4);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} steps ({percent}%) {msg}")
                .unwrap()
                .progress_chars("▉▊▋▌▍▎▏ "),
        );

        pb.set_message("Decoding heightmap");
        let heightmap_bytes = fs::read(&self.heightmap_path)?;
        let field = terrain_mesh::HeightField::from_encoded_bytes(&heightmap_bytes)?;
        field.ensure_covers(TERRAIN_RESOLUTION)?;
        pb.inc(1);

        pb.set_message("Baking displacement");
        let mut grid = TerrainGrid::new(TERRAIN_RESOLUTION, PLANE_SIZE);
        grid.bake_displacement(&field, self.height_scale)?;
        pb.inc(1);

        let diffuse = match &self.diffuse_path {
            Some(path) => Some(TextureData::EncodedPng(fs::read(path)?)),
            None => None,
        };

        let scene = TerrainExportScene {
            grid: &grid,
            diffuse,
            node_rotation: UPRIGHT_ROTATION,
            visible: true,
        };

        pb.set_message("Writing glTF");
        self.write_document(
            &scene,
            &ExportOptions {
                include_transforms: true,
                ..Default::default()
            },
        )?;
        pb.inc(1);

        pb.set_message("Writing GLB");
        self.write_document(
            &scene,
            &ExportOptions {
                include_transforms: true,
                binary_output: true,
                ..Default::default()
            },
        )?;
        pb.inc(1);

        pb.finish_with_message("Terrain exported");
        println!("Conversion complete!");
        Ok(())
    }

    fn write_document(
        &self,
        scene: &TerrainExportScene,
        options: &ExportOptions,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let model = export_terrain(scene, options)?;
        let path = self.output_dir.join(model.file_name());
        let bytes = match model {
            ExportedModel::Text(text) => text.into_bytes(),
            ExportedModel::Binary(binary) => binary,
        };
        fs::write(&path, &bytes)?;
        println!("✓ Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ColorType, ImageEncoder};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let pixels: Vec<u8> = (0..width * height)
            .flat_map(|i| [(i % 256) as u8, 0, 0, 255])
            .collect();
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(&pixels, width, height, ColorType::Rgba8)
            .unwrap();
        bytes
    }

    fn scratch_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("terrain-convert-{nanos}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn converts_a_heightmap_into_both_documents() {
        let dir = scratch_dir();
        let heightmap = dir.join("hills.png");
        fs::write(
            &heightmap,
            encode_png(
                TERRAIN_RESOLUTION as u32,
                TERRAIN_RESOLUTION as u32,
            ),
        )
        .unwrap();

        let converter =
            TerrainConverter::new(heightmap.to_str().unwrap(), None, 3.0).unwrap();
        converter.convert().unwrap();

        let gltf = fs::read_to_string(dir.join(constants::export::GLTF_FILE_NAME)).unwrap();
        assert!(gltf.contains("\"version\": \"2.0\""));

        let glb = fs::read(dir.join(constants::export::GLB_FILE_NAME)).unwrap();
        assert_eq!(&glb[0..4], b"glTF");
    }

    #[test]
    fn rejects_missing_input() {
        assert!(TerrainConverter::new("/nonexistent/heightmap.png", None, 1.0).is_err());
    }

    #[test]
    fn rejects_undersized_heightmaps() {
        let dir = scratch_dir();
        let heightmap = dir.join("tiny.png");
        fs::write(&heightmap, encode_png(8, 8)).unwrap();

        let converter =
            TerrainConverter::new(heightmap.to_str().unwrap(), None, 1.0).unwrap();
        assert!(converter.convert().is_err());
    }
}
