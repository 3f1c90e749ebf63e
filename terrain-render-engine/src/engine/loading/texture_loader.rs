use crate::engine::assets::terrain_assets::TerrainAssets;
use crate::engine::loading::progress::LoadingProgress;
use bevy::prelude::*;

/// Poll the texture set named by the manifest until everything is resident
pub fn check_texture_loading(
    mut loading_progress: ResMut<LoadingProgress>,
    mut assets: ResMut<TerrainAssets>,
    asset_server: Res<AssetServer>,
) {
    if loading_progress.textures_loaded || !loading_progress.manifest_loaded {
        return;
    }

    let heightmap_loaded = matches!(
        asset_server.get_load_state(&assets.heightmap_texture),
        Some(bevy::asset::LoadState::Loaded)
    );
    let diffuse_loaded = matches!(
        asset_server.get_load_state(&assets.diffuse_texture),
        Some(bevy::asset::LoadState::Loaded)
    );

    if heightmap_loaded && diffuse_loaded {
        info!("✓ Default textures loaded");
        loading_progress.textures_loaded = true;
        assets.is_loaded = true;
    }
}
