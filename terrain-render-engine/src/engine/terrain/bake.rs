/// Displacement bake orchestration with latest-request-wins sequencing
use bevy::prelude::*;
use terrain_mesh::{HeightField, TerrainError};

use crate::engine::assets::terrain_assets::TerrainAssets;
use crate::engine::terrain::mesh::update_terrain_mesh;
use crate::engine::terrain::scene::TerrainScene;
use crate::rpc::web_rpc::WebRpcInterface;

/// Which heightmap a bake should sample
#[derive(Clone, Debug)]
pub enum BakeSource {
    /// The manifest's default heightmap texture
    DefaultHeightmap,
    /// The most recent user upload
    UserUpload,
}

/// Request to re-displace the terrain. `scale` of `None` keeps the scene's
/// current height scale.
#[derive(Event)]
pub struct BakeRequested {
    pub source: BakeSource,
    pub scale: Option<f32>,
}

/// Latest heightmap bytes uploaded through the RPC bridge
#[derive(Resource, Default)]
pub struct UserHeightmap {
    pub bytes: Option<Vec<u8>>,
}

/// Monotonic bake sequencing. Two overlapping requests race on the shared
/// vertex buffer; a completion is applied only when it belongs to the newest
/// issued request, so stale decodes are discarded instead of clobbering a
/// newer bake.
#[derive(Default)]
pub struct BakeSequencer {
    latest_issued: u64,
    latest_applied: u64,
}

impl BakeSequencer {
    pub fn issue(&mut self) -> u64 {
        self.latest_issued += 1;
        self.latest_issued
    }

    pub fn try_apply(&mut self, sequence: u64) -> bool {
        if sequence == self.latest_issued && sequence > self.latest_applied {
            self.latest_applied = sequence;
            true
        } else {
            false
        }
    }
}

enum PendingSource {
    Asset,
    Encoded(Vec<u8>),
}

struct PendingBake {
    sequence: u64,
    source: PendingSource,
    scale: Option<f32>,
}

#[derive(Resource, Default)]
pub struct BakeQueue {
    sequencer: BakeSequencer,
    pending: Vec<PendingBake>,
}

/// Assign sequence numbers to incoming requests and snapshot their input
pub fn process_bake_requests(
    mut requests: EventReader<BakeRequested>,
    mut queue: ResMut<BakeQueue>,
    user_heightmap: Res<UserHeightmap>,
    mut rpc: ResMut<WebRpcInterface>,
) {
    for request in requests.read() {
        let source = match request.source {
            BakeSource::DefaultHeightmap => PendingSource::Asset,
            BakeSource::UserUpload => match user_heightmap.bytes {
                Some(ref bytes) => PendingSource::Encoded(bytes.clone()),
                None => {
                    warn!("Bake requested before any heightmap upload");
                    rpc.send_notification(
                        "bake_failed",
                        serde_json::json!({"reason": "no uploaded heightmap"}),
                    );
                    continue;
                }
            },
        };

        let sequence = queue.sequencer.issue();
        queue.pending.push(PendingBake {
            sequence,
            source,
            scale: request.scale,
        });
        info!("Bake {} queued", sequence);
    }
}

/// Resolve pending bakes whose image input has finished loading. The bake
/// itself never partially applies: heights are staged inside the grid and the
/// previous state survives any decode or sampling failure.
pub fn complete_pending_bakes(
    mut queue: ResMut<BakeQueue>,
    scene: Option<ResMut<TerrainScene>>,
    assets: Res<TerrainAssets>,
    asset_server: Res<AssetServer>,
    images: Res<Assets<Image>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut rpc: ResMut<WebRpcInterface>,
) {
    let Some(mut scene) = scene else {
        return;
    };

    let mut still_pending = Vec::new();

    for pending in std::mem::take(&mut queue.pending) {
        let outcome = match pending.source {
            PendingSource::Encoded(ref bytes) => HeightField::from_encoded_bytes(bytes),
            PendingSource::Asset => {
                match asset_server.get_load_state(&assets.heightmap_texture) {
                    Some(bevy::asset::LoadState::Loaded) => {
                        match images.get(&assets.heightmap_texture) {
                            Some(image) => height_field_from_image(image),
                            None => {
                                still_pending.push(pending);
                                continue;
                            }
                        }
                    }
                    Some(bevy::asset::LoadState::Failed(_)) => {
                        Err(TerrainError::ImageDecodeFailure {
                            reason: "default heightmap failed to load".to_string(),
                        })
                    }
                    _ => {
                        still_pending.push(pending);
                        continue;
                    }
                }
            }
        };

        if !queue.sequencer.try_apply(pending.sequence) {
            info!("Discarding stale bake {}", pending.sequence);
            continue;
        }

        let scale = pending.scale.unwrap_or(scene.height_scale);
        let result = outcome.and_then(|field| scene.grid.bake_displacement(&field, scale));

        match result {
            Ok(()) => {
                scene.height_scale = scale;
                if let Some(mesh) = meshes.get_mut(&scene.mesh) {
                    update_terrain_mesh(mesh, &scene.grid);
                }
                info!("✓ Bake {} applied (scale {})", pending.sequence, scale);
                rpc.send_notification(
                    "bake_complete",
                    serde_json::json!({"sequence": pending.sequence, "scale": scale}),
                );
            }
            Err(err) => {
                warn!("Bake {} failed: {}", pending.sequence, err);
                rpc.send_notification(
                    "bake_failed",
                    serde_json::json!({"sequence": pending.sequence, "reason": err.to_string()}),
                );
            }
        }
    }

    queue.pending = still_pending;
}

/// Read the first channel of a CPU-resident RGBA8 texture
fn height_field_from_image(image: &Image) -> Result<HeightField, TerrainError> {
    use bevy::render::render_resource::TextureFormat;

    let data = image
        .data
        .as_ref()
        .ok_or_else(|| TerrainError::ImageDecodeFailure {
            reason: "heightmap pixel data is not resident on the CPU".to_string(),
        })?;

    let size = image.size();
    match image.texture_descriptor.format {
        TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => {
            HeightField::from_rgba8(size.x as usize, size.y as usize, data)
        }
        other => Err(TerrainError::ImageDecodeFailure {
            reason: format!("unsupported heightmap texture format {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_increase_monotonically() {
        let mut sequencer = BakeSequencer::default();
        assert_eq!(sequencer.issue(), 1);
        assert_eq!(sequencer.issue(), 2);
        assert_eq!(sequencer.issue(), 3);
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut sequencer = BakeSequencer::default();
        let first = sequencer.issue();
        let second = sequencer.issue();

        // The older request resolves after a newer one was issued.
        assert!(!sequencer.try_apply(first));
        assert!(sequencer.try_apply(second));
    }

    #[test]
    fn completions_apply_once() {
        let mut sequencer = BakeSequencer::default();
        let only = sequencer.issue();
        assert!(sequencer.try_apply(only));
        assert!(!sequencer.try_apply(only));
    }

    #[test]
    fn applying_unblocks_the_next_request() {
        let mut sequencer = BakeSequencer::default();
        let first = sequencer.issue();
        assert!(sequencer.try_apply(first));

        let second = sequencer.issue();
        assert!(sequencer.try_apply(second));
    }
}
