//! glTF 2.0 document assembly and GLB container packing

use gltf_json as json;
use gltf_json::validation::Checked::Valid;
use std::collections::BTreeMap;

use super::buffer::{AccessorIndex, ViewIndex};

/// Accessors describing one terrain primitive
pub struct GeometryAccessors {
    pub positions: AccessorIndex,
    pub normals: AccessorIndex,
    pub uvs: AccessorIndex,
    pub indices: AccessorIndex,
}

/// Where the diffuse image lives in the document
pub enum ImageSource {
    None,
    /// Embedded data URI (textual exports)
    Uri(String),
    /// View into the binary buffer (GLB exports)
    BufferView(ViewIndex),
}

/// Everything the root assembly needs besides the packed buffer itself
pub struct DocumentParts<'a> {
    pub geometry: Option<GeometryAccessors>,
    pub image: ImageSource,
    pub node_rotation: Option<[f32; 4]>,
    pub buffer_byte_length: u64,
    pub buffer_uri: Option<String>,
    pub views: &'a [json::buffer::View],
    pub accessors: &'a [json::Accessor],
    pub mesh_name: &'a str,
    pub generator: &'a str,
}

/// Assemble the complete glTF root. A `geometry` of `None` still yields a
/// well-formed document with an empty scene.
pub fn build_root(parts: DocumentParts) -> json::Root {
    let mut meshes = Vec::new();
    let mut nodes = Vec::new();
    let mut materials = Vec::new();
    let mut textures = Vec::new();
    let mut images = Vec::new();
    let mut samplers = Vec::new();

    match parts.image {
        ImageSource::None => {}
        ImageSource::Uri(uri) => {
            images.push(json::Image {
                buffer_view: None,
                mime_type: Some(json::image::MimeType("image/png".to_string())),
                name: None,
                uri: Some(uri),
                extensions: Default::default(),
                extras: Default::default(),
            });
        }
        ImageSource::BufferView(view) => {
            images.push(json::Image {
                buffer_view: Some(view.as_json_index()),
                mime_type: Some(json::image::MimeType("image/png".to_string())),
                name: None,
                uri: None,
                extensions: Default::default(),
                extras: Default::default(),
            });
        }
    }

    if !images.is_empty() {
        samplers.push(json::texture::Sampler::default());
        textures.push(json::Texture {
            name: None,
            sampler: Some(json::Index::new(0)),
            source: json::Index::new(0),
            extensions: Default::default(),
            extras: Default::default(),
        });
    }

    if let Some(geometry) = parts.geometry {
        materials.push(json::Material {
            name: Some("terrain".to_string()),
            pbr_metallic_roughness: json::material::PbrMetallicRoughness {
                base_color_texture: textures.first().map(|_| json::texture::Info {
                    index: json::Index::new(0),
                    tex_coord: 0,
                    extensions: Default::default(),
                    extras: Default::default(),
                }),
                ..Default::default()
            },
            ..Default::default()
        });

        let mut attributes = BTreeMap::new();
        attributes.insert(
            Valid(json::mesh::Semantic::Positions),
            geometry.positions.as_json_index(),
        );
        attributes.insert(
            Valid(json::mesh::Semantic::Normals),
            geometry.normals.as_json_index(),
        );
        attributes.insert(
            Valid(json::mesh::Semantic::TexCoords(0)),
            geometry.uvs.as_json_index(),
        );

        meshes.push(json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(parts.mesh_name.to_string()),
            primitives: vec![json::mesh::Primitive {
                attributes,
                extensions: Default::default(),
                extras: Default::default(),
                indices: Some(geometry.indices.as_json_index()),
                material: Some(json::Index::new(0)),
                mode: Valid(json::mesh::Mode::Triangles),
                targets: None,
            }],
            weights: None,
        });

        nodes.push(json::Node {
            camera: None,
            children: None,
            extensions: Default::default(),
            extras: Default::default(),
            matrix: None,
            mesh: Some(json::Index::new(0)),
            name: Some(parts.mesh_name.to_string()),
            rotation: parts.node_rotation.map(json::scene::UnitQuaternion),
            scale: None,
            skin: None,
            translation: None,
            weights: None,
        });
    }

    let buffers = if parts.buffer_byte_length > 0 {
        vec![json::Buffer {
            byte_length: parts.buffer_byte_length.into(),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: parts.buffer_uri,
        }]
    } else {
        Vec::new()
    };

    // A scene with zero nodes does not survive re-parsing (its node list is
    // skipped on serialisation), so node-less documents carry no scene at all.
    let scenes = if nodes.is_empty() {
        Vec::new()
    } else {
        vec![json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some("Scene".to_string()),
            nodes: (0..nodes.len() as u32).map(json::Index::new).collect(),
        }]
    };
    let scene = (!scenes.is_empty()).then(|| json::Index::new(0));

    json::Root {
        accessors: parts.accessors.to_vec(),
        animations: Vec::new(),
        asset: json::Asset {
            copyright: None,
            extensions: Default::default(),
            extras: Default::default(),
            generator: Some(parts.generator.to_string()),
            min_version: None,
            version: "2.0".to_string(),
        },
        buffers,
        buffer_views: parts.views.to_vec(),
        cameras: Vec::new(),
        extensions: Default::default(),
        extensions_required: Vec::new(),
        extensions_used: Vec::new(),
        extras: Default::default(),
        images,
        materials,
        meshes,
        nodes,
        samplers,
        scene,
        scenes,
        skins: Vec::new(),
        textures,
    }
}

/// Assemble a GLB binary: 12-byte header, JSON chunk, BIN chunk, all
/// 4-byte aligned.
pub fn assemble_glb(json_string: &str, buffer_data: &[u8]) -> Vec<u8> {
    let json_bytes = json_string.as_bytes();

    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let json_chunk_length = json_bytes.len() + json_padding;

    let buffer_padding = (4 - (buffer_data.len() % 4)) % 4;
    let buffer_chunk_length = buffer_data.len() + buffer_padding;

    let total_length = 12 + 8 + json_chunk_length + 8 + buffer_chunk_length;

    let mut glb = Vec::with_capacity(total_length);

    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    glb.extend_from_slice(&(json_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes()); // "JSON"
    glb.extend_from_slice(json_bytes);
    for _ in 0..json_padding {
        glb.push(0x20); // JSON chunks pad with spaces
    }

    glb.extend_from_slice(&(buffer_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x004E4942u32.to_le_bytes()); // "BIN\0"
    glb.extend_from_slice(buffer_data);
    for _ in 0..buffer_padding {
        glb.push(0);
    }

    glb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_parts_build_a_parseable_document() {
        let root = build_root(DocumentParts {
            geometry: None,
            image: ImageSource::None,
            node_rotation: None,
            buffer_byte_length: 0,
            buffer_uri: None,
            views: &[],
            accessors: &[],
            mesh_name: "terrain",
            generator: "test",
        });

        assert_eq!(root.asset.version, "2.0");
        assert!(root.meshes.is_empty());
        assert!(root.buffers.is_empty());
        assert!(root.scene.is_none());
        assert!(root.scenes.is_empty());

        let text = serde_json::to_string_pretty(&root).unwrap();
        let reparsed: json::Root = serde_json::from_str(&text).unwrap();
        assert!(reparsed.nodes.is_empty());
        assert!(reparsed.scenes.is_empty());
    }

    #[test]
    fn glb_layout_has_aligned_chunks() {
        let glb = assemble_glb("{}", &[1, 2, 3]);

        assert_eq!(&glb[0..4], b"glTF");
        assert_eq!(u32::from_le_bytes(glb[4..8].try_into().unwrap()), 2);
        assert_eq!(
            u32::from_le_bytes(glb[8..12].try_into().unwrap()) as usize,
            glb.len()
        );

        let json_len = u32::from_le_bytes(glb[12..16].try_into().unwrap()) as usize;
        assert_eq!(json_len % 4, 0);
        assert_eq!(u32::from_le_bytes(glb[16..20].try_into().unwrap()), 0x4E4F534A);

        let bin_header = 20 + json_len;
        let bin_len =
            u32::from_le_bytes(glb[bin_header..bin_header + 4].try_into().unwrap()) as usize;
        assert_eq!(bin_len % 4, 0);
        assert_eq!(
            u32::from_le_bytes(glb[bin_header + 4..bin_header + 8].try_into().unwrap()),
            0x004E4942
        );
        assert_eq!(glb.len(), bin_header + 8 + bin_len);
    }
}
