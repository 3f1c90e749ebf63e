pub mod manifest;
pub mod terrain_assets;
