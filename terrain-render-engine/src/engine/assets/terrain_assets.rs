use super::manifest::TerrainManifest;
use bevy::prelude::*;

/// Handles for the texture set the viewer renders with. Textures stay at
/// `Handle::default()` until the manifest names them.
#[derive(Resource, Default)]
pub struct TerrainAssets {
    pub heightmap_texture: Handle<Image>,
    pub diffuse_texture: Handle<Image>,
    pub manifest: Option<Handle<TerrainManifest>>,
    pub is_loaded: bool,
}
