/// Heightmap-displaced terrain grid and glTF export core.
///
/// Everything here is renderer-agnostic: a decoded height field, a planar
/// vertex grid the field displaces, and a serialiser turning that grid into
/// portable .gltf / .glb documents.
pub mod error;
pub mod export;
pub mod grid;
pub mod height_field;

pub use error::TerrainError;
pub use export::{ExportOptions, ExportedModel, TerrainExportScene, TextureData, export_terrain};
pub use grid::TerrainGrid;
pub use height_field::HeightField;
