/// Largest texture edge written into an export before downscaling kicks in
pub const DEFAULT_MAX_TEXTURE_DIMENSION: u32 = 4096;

/// Output file name for textual glTF exports
pub const GLTF_FILE_NAME: &str = "terrain.gltf";

/// Output file name for binary GLB exports
pub const GLB_FILE_NAME: &str = "terrain.glb";

/// Generator string written into exported documents
pub const EXPORT_GENERATOR: &str = "terrain-render-engine";
