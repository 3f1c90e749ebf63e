/// Terrain mesh export into portable .gltf / .glb documents
pub mod buffer;
pub mod document;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::io::Cursor;

use crate::error::TerrainError;
use crate::grid::TerrainGrid;
use buffer::BufferBuilder;
use document::{DocumentParts, GeometryAccessors, ImageSource, build_root};

/// Recognised export options; defaults mirror the viewer's download action.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Write the terrain node's orientation into the document instead of
    /// leaving the node transform identity.
    pub include_transforms: bool,
    /// Skip nodes that are hidden in the scene.
    pub only_visible_nodes: bool,
    /// GLB binary container instead of pretty-printed JSON.
    pub binary_output: bool,
    /// Largest allowed texture edge; bigger diffuse maps get downscaled.
    pub max_texture_dimension: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_transforms: false,
            only_visible_nodes: true,
            binary_output: false,
            max_texture_dimension: constants::export::DEFAULT_MAX_TEXTURE_DIMENSION,
        }
    }
}

/// Diffuse texture handed to the exporter.
#[derive(Debug, Clone)]
pub enum TextureData {
    /// Already-encoded PNG bytes
    EncodedPng(Vec<u8>),
    /// Raw RGBA8 pixels, 4 bytes per pixel
    Rgba8 {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
}

impl TextureData {
    /// Produce PNG bytes no larger than `max_dimension` per edge. Anything
    /// that cannot be decoded or re-encoded is an export failure, never a
    /// mutation of the scene.
    fn encode_png(&self, max_dimension: u32) -> Result<Vec<u8>, TerrainError> {
        let decoded = match self {
            TextureData::EncodedPng(bytes) => {
                image::load_from_memory(bytes).map_err(|err| {
                    TerrainError::ExportSerializationFailure {
                        reason: format!("diffuse texture is not decodable: {err}"),
                    }
                })?
            }
            TextureData::Rgba8 {
                width,
                height,
                pixels,
            } => {
                let buffer =
                    image::RgbaImage::from_raw(*width, *height, pixels.clone()).ok_or_else(
                        || TerrainError::ExportSerializationFailure {
                            reason: format!(
                                "diffuse pixel buffer does not match {width}x{height} RGBA"
                            ),
                        },
                    )?;
                image::DynamicImage::ImageRgba8(buffer)
            }
        };

        let bounded = if decoded.width() > max_dimension || decoded.height() > max_dimension {
            decoded.resize(
                max_dimension,
                max_dimension,
                image::imageops::FilterType::Triangle,
            )
        } else {
            decoded
        };

        let mut png = Cursor::new(Vec::new());
        bounded
            .write_to(&mut png, image::ImageOutputFormat::Png)
            .map_err(|err| TerrainError::ExportSerializationFailure {
                reason: format!("PNG encoding failed: {err}"),
            })?;

        Ok(png.into_inner())
    }
}

/// One terrain node plus its material inputs, borrowed from the scene.
/// The exporter reads it and never writes back.
pub struct TerrainExportScene<'a> {
    pub grid: &'a TerrainGrid,
    pub diffuse: Option<TextureData>,
    /// Node orientation quaternion (x, y, z, w) the renderer displays with.
    pub node_rotation: [f32; 4],
    pub visible: bool,
}

impl<'a> TerrainExportScene<'a> {
    pub fn new(grid: &'a TerrainGrid) -> Self {
        Self {
            grid,
            diffuse: None,
            node_rotation: [0.0, 0.0, 0.0, 1.0],
            visible: true,
        }
    }
}

/// Finished one-shot export artifact.
#[derive(Debug)]
pub enum ExportedModel {
    /// Pretty-printed glTF JSON with the buffer embedded as a data URI
    Text(String),
    /// GLB binary container
    Binary(Vec<u8>),
}

impl ExportedModel {
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportedModel::Text(_) => constants::export::GLTF_FILE_NAME,
            ExportedModel::Binary(_) => constants::export::GLB_FILE_NAME,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ExportedModel::Text(text) => text.into_bytes(),
            ExportedModel::Binary(bytes) => bytes,
        }
    }
}

/// Serialise the terrain into a .gltf / .glb document. Degenerate meshes and
/// hidden nodes still produce well-formed (empty) documents.
pub fn export_terrain(
    scene: &TerrainExportScene,
    options: &ExportOptions,
) -> Result<ExportedModel, TerrainError> {
    let skip_node = scene.grid.vertex_count() == 0
        || (options.only_visible_nodes && !scene.visible);

    let mut buffer = BufferBuilder::new();
    let mut geometry = None;
    let mut image = ImageSource::None;

    if !skip_node {
        geometry = Some(GeometryAccessors {
            positions: buffer.pack_positions(scene.grid.positions()),
            normals: buffer.pack_vec3(scene.grid.normals()),
            uvs: buffer.pack_vec2(scene.grid.uvs()),
            indices: buffer.pack_indices_u32(scene.grid.indices()),
        });

        if let Some(ref diffuse) = scene.diffuse {
            let png = diffuse.encode_png(options.max_texture_dimension)?;
            image = if options.binary_output {
                ImageSource::BufferView(buffer.pack_bytes(&png))
            } else {
                ImageSource::Uri(format!(
                    "data:image/png;base64,{}",
                    BASE64.encode(&png)
                ))
            };
        }
    }

    let buffer_uri = if options.binary_output || buffer.data().is_empty() {
        None
    } else {
        Some(format!(
            "data:application/octet-stream;base64,{}",
            BASE64.encode(buffer.data())
        ))
    };

    let root = build_root(DocumentParts {
        geometry,
        image,
        node_rotation: options.include_transforms.then_some(scene.node_rotation),
        buffer_byte_length: buffer.data().len() as u64,
        buffer_uri,
        views: buffer.views(),
        accessors: buffer.accessors(),
        mesh_name: "terrain",
        generator: constants::export::EXPORT_GENERATOR,
    });

    if options.binary_output {
        let json_string = serde_json::to_string(&root).map_err(|err| {
            TerrainError::ExportSerializationFailure {
                reason: err.to_string(),
            }
        })?;
        Ok(ExportedModel::Binary(document::assemble_glb(
            &json_string,
            buffer.data(),
        )))
    } else {
        let text = serde_json::to_string_pretty(&root).map_err(|err| {
            TerrainError::ExportSerializationFailure {
                reason: err.to_string(),
            }
        })?;
        Ok(ExportedModel::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::height_field::HeightField;
    use gltf_json as json;

    fn baked_grid(resolution: usize) -> TerrainGrid {
        let mut data = Vec::with_capacity(resolution * resolution * 4);
        for y in 0..resolution {
            for x in 0..resolution {
                data.extend_from_slice(&[((x * 50 + y * 90) % 256) as u8, 0, 0, 255]);
            }
        }
        let field = HeightField::from_rgba8(resolution, resolution, &data).unwrap();
        let mut grid = TerrainGrid::new(resolution, 50.0);
        grid.bake_displacement(&field, 2.0).unwrap();
        grid
    }

    fn decode_buffer(root: &json::Root) -> Vec<u8> {
        let uri = root.buffers[0].uri.as_ref().unwrap();
        let encoded = uri
            .strip_prefix("data:application/octet-stream;base64,")
            .unwrap();
        BASE64.decode(encoded).unwrap()
    }

    fn accessor_f32s(root: &json::Root, data: &[u8], accessor: usize) -> Vec<f32> {
        let accessor = &root.accessors[accessor];
        let view = &root.buffer_views[accessor.buffer_view.unwrap().value()];
        let offset = view.byte_offset.map(|o| o.0 as usize).unwrap_or(0);
        let length = view.byte_length.0 as usize;
        bytemuck::cast_slice(&data[offset..offset + length]).to_vec()
    }

    #[test]
    fn text_export_round_trips_geometry() {
        let grid = baked_grid(4);
        let scene = TerrainExportScene::new(&grid);
        let exported = export_terrain(&scene, &ExportOptions::default()).unwrap();

        let ExportedModel::Text(text) = exported else {
            panic!("expected textual export");
        };
        let root: json::Root = serde_json::from_str(&text).unwrap();

        assert_eq!(root.meshes.len(), 1);
        assert_eq!(root.scenes.len(), 1);
        assert_eq!(root.scenes[0].nodes.len(), 1);
        let data = decode_buffer(&root);

        // Packing order: positions, normals, uvs, indices.
        let positions = accessor_f32s(&root, &data, 0);
        assert_eq!(positions.len(), grid.vertex_count() * 3);
        for (i, position) in grid.positions().iter().enumerate() {
            for axis in 0..3 {
                assert!((positions[i * 3 + axis] - position[axis]).abs() < 1e-6);
            }
        }

        let index_accessor = &root.accessors[3];
        assert_eq!(index_accessor.count.0 as usize, grid.indices().len());
        let view = &root.buffer_views[index_accessor.buffer_view.unwrap().value()];
        let offset = view.byte_offset.map(|o| o.0 as usize).unwrap_or(0);
        let indices: Vec<u32> =
            bytemuck::cast_slice(&data[offset..offset + view.byte_length.0 as usize]).to_vec();
        assert_eq!(indices, grid.indices());
    }

    #[test]
    fn empty_grid_exports_a_parseable_document() {
        let grid = TerrainGrid::empty();
        let scene = TerrainExportScene::new(&grid);
        let exported = export_terrain(&scene, &ExportOptions::default()).unwrap();

        let ExportedModel::Text(text) = exported else {
            panic!("expected textual export");
        };
        let root: json::Root = serde_json::from_str(&text).unwrap();
        assert!(root.meshes.is_empty());
        assert!(root.buffers.is_empty());
        assert!(root.scenes.is_empty());
        assert_eq!(root.asset.version, "2.0");
    }

    #[test]
    fn hidden_node_is_skipped_only_when_asked() {
        let grid = baked_grid(4);
        let mut scene = TerrainExportScene::new(&grid);
        scene.visible = false;

        let skipped = export_terrain(&scene, &ExportOptions::default()).unwrap();
        let ExportedModel::Text(text) = skipped else {
            panic!("expected textual export");
        };
        let root: json::Root = serde_json::from_str(&text).unwrap();
        assert!(root.meshes.is_empty());

        let options = ExportOptions {
            only_visible_nodes: false,
            ..Default::default()
        };
        let kept = export_terrain(&scene, &options).unwrap();
        let ExportedModel::Text(text) = kept else {
            panic!("expected textual export");
        };
        let root: json::Root = serde_json::from_str(&text).unwrap();
        assert_eq!(root.meshes.len(), 1);
    }

    #[test]
    fn transforms_only_written_when_requested() {
        let grid = baked_grid(4);
        let mut scene = TerrainExportScene::new(&grid);
        scene.node_rotation = [-std::f32::consts::FRAC_1_SQRT_2, 0.0, 0.0,
            std::f32::consts::FRAC_1_SQRT_2];

        let identity = export_terrain(&scene, &ExportOptions::default()).unwrap();
        let ExportedModel::Text(text) = identity else {
            panic!("expected textual export");
        };
        let root: json::Root = serde_json::from_str(&text).unwrap();
        assert!(root.nodes[0].rotation.is_none());

        let options = ExportOptions {
            include_transforms: true,
            ..Default::default()
        };
        let oriented = export_terrain(&scene, &options).unwrap();
        let ExportedModel::Text(text) = oriented else {
            panic!("expected textual export");
        };
        let root: json::Root = serde_json::from_str(&text).unwrap();
        assert!(root.nodes[0].rotation.is_some());
    }

    #[test]
    fn diffuse_texture_is_embedded_and_bounded() {
        let grid = baked_grid(4);
        let mut scene = TerrainExportScene::new(&grid);
        scene.diffuse = Some(TextureData::Rgba8 {
            width: 8,
            height: 8,
            pixels: vec![200u8; 8 * 8 * 4],
        });

        let options = ExportOptions {
            max_texture_dimension: 4,
            ..Default::default()
        };
        let exported = export_terrain(&scene, &options).unwrap();
        let ExportedModel::Text(text) = exported else {
            panic!("expected textual export");
        };
        let root: json::Root = serde_json::from_str(&text).unwrap();

        assert_eq!(root.images.len(), 1);
        assert_eq!(root.textures.len(), 1);
        let material = &root.materials[0];
        assert!(material.pbr_metallic_roughness.base_color_texture.is_some());

        let uri = root.images[0].uri.as_ref().unwrap();
        let png = BASE64
            .decode(uri.strip_prefix("data:image/png;base64,").unwrap())
            .unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert!(decoded.width() <= 4 && decoded.height() <= 4);
    }

    #[test]
    fn corrupt_diffuse_fails_the_export_only() {
        let grid = baked_grid(4);
        let mut scene = TerrainExportScene::new(&grid);
        scene.diffuse = Some(TextureData::EncodedPng(vec![0xba, 0xad, 0xf0, 0x0d]));

        let err = export_terrain(&scene, &ExportOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::TerrainError::ExportSerializationFailure { .. }
        ));
        // Source grid is untouched.
        assert_eq!(grid.vertex_count(), 16);
    }

    #[test]
    fn binary_export_embeds_image_in_buffer() {
        let grid = baked_grid(4);
        let mut scene = TerrainExportScene::new(&grid);
        scene.diffuse = Some(TextureData::Rgba8 {
            width: 2,
            height: 2,
            pixels: vec![128u8; 2 * 2 * 4],
        });

        let options = ExportOptions {
            binary_output: true,
            ..Default::default()
        };
        let exported = export_terrain(&scene, &options).unwrap();
        let ExportedModel::Binary(glb) = exported else {
            panic!("expected binary export");
        };

        assert_eq!(&glb[0..4], b"glTF");
        let json_len = u32::from_le_bytes(glb[12..16].try_into().unwrap()) as usize;
        let root: json::Root = serde_json::from_slice(&glb[20..20 + json_len]).unwrap();

        assert!(root.buffers[0].uri.is_none());
        assert!(root.images[0].buffer_view.is_some());
        assert!(root.images[0].uri.is_none());
    }
}
