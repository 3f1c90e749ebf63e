use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Scene manifest describing the default texture set and bake parameters.
/// Loaded from `assets/manifest.json` at startup.
#[derive(Asset, TypePath, Debug, Clone, Serialize, Deserialize)]
pub struct TerrainManifest {
    /// Relative asset path of the default heightmap image
    pub heightmap_texture: String,
    /// Relative asset path of the default diffuse map
    pub diffuse_texture: String,
    #[serde(default = "default_height_scale")]
    pub height_scale: f32,
}

fn default_height_scale() -> f32 {
    constants::terrain::DEFAULT_HEIGHT_SCALE
}
