/// Scene export bridge: snapshots the terrain and hands the document to the
/// platform download path.
use bevy::prelude::*;
use terrain_mesh::{ExportOptions, TerrainExportScene, TextureData, export_terrain};

use crate::engine::assets::terrain_assets::TerrainAssets;
use crate::engine::terrain::scene::{TerrainScene, terrain_orientation};
use crate::rpc::web_rpc::WebRpcInterface;

#[derive(Event)]
pub struct ExportRequested {
    pub options: ExportOptions,
}

impl ExportRequested {
    pub fn gltf() -> Self {
        Self {
            options: ExportOptions::default(),
        }
    }

    pub fn glb() -> Self {
        Self {
            options: ExportOptions {
                binary_output: true,
                ..Default::default()
            },
        }
    }
}

/// Export the terrain exactly as last baked. The exporter borrows the grid;
/// a failed export leaves the scene untouched and only reports the error.
pub fn handle_export_requests(
    mut requests: EventReader<ExportRequested>,
    scene: Option<Res<TerrainScene>>,
    assets: Res<TerrainAssets>,
    images: Res<Assets<Image>>,
    visibilities: Query<&Visibility>,
    mut rpc: ResMut<WebRpcInterface>,
) {
    for request in requests.read() {
        let Some(ref scene) = scene else {
            warn!("Export requested before the terrain was spawned");
            rpc.send_notification(
                "export_failed",
                serde_json::json!({"reason": "terrain not ready"}),
            );
            continue;
        };

        let diffuse = images
            .get(&assets.diffuse_texture)
            .and_then(texture_data_from_image);
        let visible = visibilities
            .get(scene.entity)
            .map(|visibility| !matches!(visibility, Visibility::Hidden))
            .unwrap_or(true);

        let export_scene = TerrainExportScene {
            grid: &scene.grid,
            diffuse,
            node_rotation: terrain_orientation().to_array(),
            visible,
        };

        match export_terrain(&export_scene, &request.options) {
            Ok(model) => {
                let file_name = model.file_name();
                let mime = if request.options.binary_output {
                    "model/gltf-binary"
                } else {
                    "model/gltf+json"
                };
                let bytes = model.into_bytes();

                match deliver(file_name, &bytes, mime) {
                    Ok(()) => {
                        info!("✓ Exported {} ({} bytes)", file_name, bytes.len());
                        rpc.send_notification(
                            "export_complete",
                            serde_json::json!({
                                "file": file_name,
                                "bytes": bytes.len()
                            }),
                        );
                    }
                    Err(reason) => {
                        warn!("Export delivery failed: {}", reason);
                        rpc.send_notification(
                            "export_failed",
                            serde_json::json!({"reason": reason}),
                        );
                    }
                }
            }
            Err(err) => {
                warn!("Export failed: {}", err);
                rpc.send_notification(
                    "export_failed",
                    serde_json::json!({"reason": err.to_string()}),
                );
            }
        }
    }
}

/// Snapshot a CPU-resident RGBA8 texture for the exporter
fn texture_data_from_image(image: &Image) -> Option<TextureData> {
    use bevy::render::render_resource::TextureFormat;

    let data = image.data.as_ref()?;
    let size = image.size();
    match image.texture_descriptor.format {
        TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => Some(TextureData::Rgba8 {
            width: size.x,
            height: size.y,
            pixels: data.clone(),
        }),
        other => {
            warn!("Diffuse texture format {:?} not exportable, skipping", other);
            None
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn deliver(file_name: &str, bytes: &[u8], _mime: &str) -> Result<(), String> {
    std::fs::write(file_name, bytes).map_err(|err| err.to_string())
}

/// Hand the document to the browser as a one-shot object-URL download
#[cfg(target_arch = "wasm32")]
fn deliver(file_name: &str, bytes: &[u8], mime: &str) -> Result<(), String> {
    use wasm_bindgen::JsCast;

    let array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(&array.buffer());

    let blob_options = web_sys::BlobPropertyBag::new();
    blob_options.set_type(mime);
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &blob_options)
        .map_err(|_| String::from("blob creation failed"))?;

    let url = web_sys::Url::create_object_url_with_blob(&blob)
        .map_err(|_| String::from("object URL creation failed"))?;

    let window = web_sys::window().ok_or_else(|| String::from("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| String::from("no document"))?;

    let anchor = document
        .create_element("a")
        .map_err(|_| String::from("anchor creation failed"))?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|_| String::from("anchor cast failed"))?;

    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();

    let _ = web_sys::Url::revoke_object_url(&url);
    Ok(())
}
