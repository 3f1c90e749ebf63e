use bevy::prelude::*;

use crate::engine::assets::manifest::TerrainManifest;
use crate::engine::assets::terrain_assets::TerrainAssets;
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::terrain::bake::{BakeRequested, BakeSource};
use crate::engine::terrain::scene::{TerrainScene, spawn_terrain};

const MANIFEST_PATH: &str = "manifest.json";

#[derive(Resource, Default)]
pub struct ManifestLoader {
    handle: Option<Handle<TerrainManifest>>,
}

/// Kick off the manifest load
pub fn start_loading(mut manifest_loader: ResMut<ManifestLoader>, asset_server: Res<AssetServer>) {
    info!("Loading scene manifest from: {}", MANIFEST_PATH);
    manifest_loader.handle = Some(asset_server.load(MANIFEST_PATH));
}

/// Once the manifest is ready, start texture loads, spawn the terrain entity
/// and queue the initial bake of the default heightmap.
pub fn load_manifest_system(
    mut loading_progress: ResMut<LoadingProgress>,
    manifest_loader: Res<ManifestLoader>,
    mut assets: ResMut<TerrainAssets>,
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    manifests: Res<Assets<TerrainManifest>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut bake_requests: EventWriter<BakeRequested>,
) {
    if loading_progress.manifest_loaded {
        return;
    }

    let Some(ref handle) = manifest_loader.handle else {
        return;
    };
    let Some(manifest) = manifests.get(handle) else {
        return;
    };

    info!("✓ Scene manifest loaded");
    assets.manifest = Some(handle.clone());
    loading_progress.manifest_loaded = true;

    assets.heightmap_texture = asset_server.load(manifest.heightmap_texture.as_str());
    assets.diffuse_texture = asset_server.load(manifest.diffuse_texture.as_str());

    let scene = spawn_terrain(
        &mut commands,
        &mut meshes,
        &mut materials,
        assets.diffuse_texture.clone(),
        manifest.height_scale,
    );
    commands.insert_resource(scene);

    bake_requests.write(BakeRequested {
        source: BakeSource::DefaultHeightmap,
        scale: Some(manifest.height_scale),
    });
}
