/// Sampling grid resolution per side; the terrain carries resolution² vertices
pub const TERRAIN_RESOLUTION: usize = 512;

/// World-space extent of the terrain plane in metres
pub const PLANE_SIZE: f32 = 50.0;

/// Default multiplier applied to normalised heightmap samples
pub const DEFAULT_HEIGHT_SCALE: f32 = 5.0;

/// Maximum value of a single 8-bit heightmap sample
pub const MAX_SAMPLE_VALUE: f32 = 255.0;
